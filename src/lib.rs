#![allow(rustdoc::broken_intra_doc_links)]
//! # Calculadora Lógica — Linguagem Controlada → Cláusulas Horn
//!
//! Interpreta sentenças de um subconjunto controlado do inglês como fatos,
//! regras e perguntas sobre uma base de conhecimento, e responde perguntas
//! por encadeamento progressivo até o ponto fixo.
//!
//! ## Camadas
//!
//! ```text
//! texto ──► nlu (PatternParser) ──► ClauseTree
//!                                      │
//!             statement (classificador + normalizador)
//!                                      │
//!            core (KnowledgeBase: fatos, negativos, regras)
//!                                      │
//!         inference (ponto fixo) ◄── query (Sim/Não, Quem/O quê)
//!                                      │
//!         orchestrator (fachada) ──► web (API JSON) / persistence
//! ```
//!
//! ## Exemplo
//!
//! ```rust
//! use logic_calculator::nlu::{ClauseParser, PatternParser};
//! use logic_calculator::orchestrator::Orchestrator;
//! use logic_calculator::query::Answer;
//!
//! let parser = PatternParser::new().unwrap();
//! let mut calc = Orchestrator::default();
//! for line in ["John is a man.", "Every man is a person."] {
//!     calc.interpret(&parser.parse_sentence(line).unwrap()).unwrap();
//! }
//! let answer = calc.query(&parser.parse_sentence("Is John a person?").unwrap()).unwrap();
//! assert_eq!(answer, Answer::YesNo { answer: true });
//! ```

/// Módulo `config` — configuração via variáveis de ambiente.
pub mod config;

/// Módulo `core` — termos, regras, KnowledgeBase e taxonomia de erros.
pub mod core;

/// Módulo `inference` — motor de encadeamento progressivo e cancelamento.
pub mod inference;

/// Módulo `nlu` — parser da linguagem controlada.
pub mod nlu;

/// Módulo `orchestrator` — fachada interpret/query/reset/lote.
pub mod orchestrator;

/// Módulo `persistence` — conhecimento base do projeto em JSON.
pub mod persistence;

/// Módulo `query` — resolvedor de consultas.
pub mod query;

/// Módulo `statement` — classificação e normalização de ClauseTrees.
pub mod statement;

/// Módulo `web` — servidor axum com API JSON.
pub mod web;

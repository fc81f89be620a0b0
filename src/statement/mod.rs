//! # Módulo Statement — Da Árvore de Cláusula à Forma Interna
//!
//! Camada entre o parser externo e a [`KnowledgeBase`](crate::core::KnowledgeBase):
//!
//! ```text
//! ClauseTree ──▶ StatementClassifier ──▶ StatementKind
//!      │                                      │
//!      └──────────▶ TermNormalizer ◀──────────┘
//!                        │
//!                        ▼
//!             NormalizedStatement (Facts | NegativeFact | Rule | Query)
//! ```
//!
//! Nenhum componente aqui toca a KB: o normalizador recebe apenas uma
//! fonte de constantes Skolem, consumida depois da validação.

pub mod classifier;
pub mod clause;
pub mod normalizer;

pub use classifier::{StatementClassifier, StatementKind};
pub use clause::{ClauseTree, Mood, Quantifier, QuantifierKind};
pub use normalizer::{canonical_name, NormalizedStatement, Template, TermNormalizer};

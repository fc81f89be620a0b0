//! # Módulo Inference — Encadeamento Progressivo até o Ponto Fixo
//!
//! Deriva todos os fatos que as regras Horn da KB implicam:
//!
//! ```text
//! parent(tom, john), parent(john, mary)
//! grandparent(X, Z) :- parent(X, Y), parent(Y, Z).
//! ─────────────────────────────────────────────
//! ⊢ grandparent(tom, mary)
//! ```
//!
//! | Sub-módulo | Papel |
//! |------------|-------|
//! | [`engine`] | laço de iterações, confirmação e limites |
//! | [`matcher`] | casamento átomo × fato com ligações |
//! | [`cancel`] | sinal de cancelamento cooperativo |
//!
//! Veja [`InferenceEngine`] para as garantias de cancelamento e limite.

pub mod cancel;
pub mod engine;
pub mod matcher;

pub use cancel::{CancelFlag, CancellationCheck, RunGuard};
pub use engine::{InferenceEngine, InferenceReport, DEFAULT_MAX_ITERATIONS};
pub use matcher::{match_atom, matches};

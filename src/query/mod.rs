//! # Módulo Query — Respostas Sim/Não e Quem/O quê
//!
//! Veja [`QueryResolver`].

pub mod resolver;

pub use resolver::{Answer, QueryResolver};

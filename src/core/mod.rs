//! # Módulo Core — Tipos Fundamentais do Domínio
//!
//! Este módulo agrupa os **tipos fundamentais** sobre os quais toda a
//! calculadora lógica opera:
//!
//! - [`Term`], [`Constant`], [`Variable`] — termos fechados (enum exaustivo)
//! - [`Atom`], [`GroundAtom`], [`Signature`] — predicados aplicados a termos
//! - [`Rule`], [`Literal`] — regras Horn com negação limitada no corpo
//! - [`KnowledgeBase`] — fatos, fatos negativos e regras de um projeto/sessão
//! - [`CalcError`] — taxonomia de erros do núcleo
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use logic_calculator::core::{Atom, KnowledgeBase, Literal, Provenance, Rule, Term};
//!
//! let mut kb = KnowledgeBase::new();
//! let rule = Rule::new(
//!     Atom::new("person", vec![Term::variable("X")]),
//!     vec![Literal::positive(Atom::new("man", vec![Term::variable("X")]))],
//! );
//! assert!(kb.add_rule(rule, Provenance::default()).is_ok());
//! ```

/// Taxonomia de erros ([`CalcError`]).
pub mod error;

/// Sub-módulo com a implementação de [`KnowledgeBase`] — contêiner central.
pub mod knowledge_base;

/// Regras Horn e restrição de alcance.
pub mod rule;

/// Termos, átomos e assinaturas.
pub mod term;

// Re-exports para conveniência — permite usar `crate::core::Atom` diretamente.
pub use error::{CalcError, Result};
pub use knowledge_base::{
    Fact, KnowledgeBase, Origin, Provenance, ResetScope, SessionId, SessionTag, StatementId,
};
pub use rule::{Literal, Rule, RuleId};
pub use term::{Atom, Bindings, Constant, GroundAtom, Signature, Term, Variable};

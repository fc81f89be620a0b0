//! # Classificador de Sentenças
//!
//! O [`StatementClassifier`] decide **qual caminho** uma cláusula segue —
//! Fato, Regra ou Consulta — sem interpretar sua semântica:
//!
//! ```text
//! ClauseTree
//!   ├── mood == interrogative            → Query
//!   ├── conectivo if/every + condições   → Rule
//!   └── caso contrário                   → Fact
//! ```
//!
//! Formas não reconhecidas falham com
//! [`CalcError::Classification`] carregando o fragmento ofensor. A falha é
//! local à sentença.

use serde::{Deserialize, Serialize};

use super::clause::{ClauseTree, Mood};
use crate::core::{CalcError, Result};

/// Conectivos aceitos na árvore de cláusula.
const KNOWN_CONNECTIVES: [&str; 3] = ["if", "every", "some"];

/// Categoria de uma sentença.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Fact,
    Rule,
    Query,
}

/// Classificador estrutural — struct sem estado.
#[derive(Clone, Copy, Debug, Default)]
pub struct StatementClassifier;

impl StatementClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classifica uma árvore de cláusula.
    ///
    /// # Erros
    ///
    /// [`CalcError::Classification`] quando:
    /// - o predicado está vazio
    /// - o conectivo é desconhecido
    /// - uma pergunta traz conectivo condicional/universal
    /// - `if`/`every` aparecem sem condições, ou condições sem conectivo
    pub fn classify(&self, tree: &ClauseTree) -> Result<StatementKind> {
        let fragment = tree.fragment();
        if tree.predicate.trim().is_empty() {
            return Err(CalcError::classification(fragment, "predicado vazio"));
        }

        let connective = tree.connective().map(|c| c.trim().to_lowercase());
        if let Some(c) = connective.as_deref() {
            if !KNOWN_CONNECTIVES.contains(&c) {
                return Err(CalcError::classification(
                    fragment,
                    format!("conectivo desconhecido '{}'", c),
                ));
            }
        }

        let conditional = matches!(connective.as_deref(), Some("if") | Some("every"));
        if connective.is_some() && tree.conditions.is_empty() {
            return Err(CalcError::classification(fragment, "conectivo sem condições"));
        }
        if connective.is_none() && !tree.conditions.is_empty() {
            return Err(CalcError::classification(fragment, "condições sem conectivo"));
        }

        let kind = match tree.mood {
            Mood::Interrogative if conditional => {
                return Err(CalcError::classification(
                    fragment,
                    "perguntas condicionais não são suportadas",
                ))
            }
            Mood::Interrogative => StatementKind::Query,
            Mood::Declarative if conditional => StatementKind::Rule,
            Mood::Declarative => StatementKind::Fact,
        };
        tracing::debug!(kind = ?kind, fragment = %fragment, "Sentença classificada");
        Ok(kind)
    }
}

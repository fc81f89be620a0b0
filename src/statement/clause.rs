//! # ClauseTree — Contrato com o Parser Externo
//!
//! Estrutura que o serviço de parsing entrega para cada sentença. É
//! deliberadamente frouxa (strings, conectivo opcional, condições
//! aninhadas): o [`StatementClassifier`](super::StatementClassifier) e o
//! [`TermNormalizer`](super::TermNormalizer) a mapeiam para o modelo fechado
//! de [`Atom`](crate::core::Atom)/[`Rule`](crate::core::Rule) e rejeitam
//! qualquer coisa fora dos templates reconhecidos.
//!
//! ## Formato JSON
//!
//! ```text
//! {
//!   "mood": "declarative",
//!   "quantifiers": [{ "variable": "X", "kind": "universal" }],
//!   "predicate": "person",
//!   "args": ["X"],
//!   "connective": "if",
//!   "conditions": [{ "mood": "declarative", "predicate": "man", "args": ["X"] }],
//!   "source": "If X is a man then X is a person."
//! }
//! ```
//!
//! | Conectivo | Forma | Condições |
//! |-----------|-------|-----------|
//! | `if` | "If P(X) then Q(X)" | antecedentes |
//! | `every` | "Every X that P(X) is Q(X)" | restrição do universal |
//! | `some` | "Some person likes chocolate" | restrição do existencial |
//! | ausente | fato, fato negativo ou pergunta | nenhuma |

use serde::{Deserialize, Serialize};

/// Modo da sentença informado pelo parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Declarative,
    Interrogative,
}

/// Tipo de quantificação de uma variável.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantifierKind {
    Universal,
    Existential,
    /// Variável livre — o slot consultado de uma pergunta "quem/o quê".
    None,
}

/// Par (variável, tipo) na ordem de escopo.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantifier {
    pub variable: String,
    pub kind: QuantifierKind,
}

/// Árvore de cláusula de uma sentença.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseTree {
    pub mood: Mood,
    #[serde(default)]
    pub quantifiers: Vec<Quantifier>,
    pub predicate: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub negated: bool,
    #[serde(default)]
    pub connective: Option<String>,
    #[serde(default)]
    pub conditions: Vec<ClauseTree>,
    /// Texto original, reportado junto a erros de classificação.
    #[serde(default)]
    pub source: String,
}

impl ClauseTree {
    fn with_mood(mood: Mood, predicate: &str, args: &[&str]) -> Self {
        Self {
            mood,
            quantifiers: Vec::new(),
            predicate: predicate.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            negated: false,
            connective: None,
            conditions: Vec::new(),
            source: String::new(),
        }
    }

    pub fn declarative(predicate: &str, args: &[&str]) -> Self {
        Self::with_mood(Mood::Declarative, predicate, args)
    }

    pub fn interrogative(predicate: &str, args: &[&str]) -> Self {
        Self::with_mood(Mood::Interrogative, predicate, args)
    }

    pub fn quantified(mut self, variable: &str, kind: QuantifierKind) -> Self {
        self.quantifiers.push(Quantifier {
            variable: variable.to_string(),
            kind,
        });
        self
    }

    pub fn negate(mut self) -> Self {
        self.negated = true;
        self
    }

    /// "If `conditions` then `self`".
    pub fn when(mut self, conditions: Vec<ClauseTree>) -> Self {
        self.connective = Some("if".to_string());
        self.conditions = conditions;
        self
    }

    /// "Every … that `restriction` …".
    pub fn every(mut self, restriction: Vec<ClauseTree>) -> Self {
        self.connective = Some("every".to_string());
        self.conditions = restriction;
        self
    }

    /// "Some `restriction` …".
    pub fn some(mut self, restriction: Vec<ClauseTree>) -> Self {
        self.connective = Some("some".to_string());
        self.conditions = restriction;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Tipo de quantificação declarado para `name`, se houver.
    pub fn quantifier_of(&self, name: &str) -> Option<QuantifierKind> {
        self.quantifiers
            .iter()
            .find(|q| q.variable == name)
            .map(|q| q.kind)
    }

    /// Fragmento a reportar em erros: a fonte, ou uma renderização da árvore.
    pub fn fragment(&self) -> String {
        if !self.source.trim().is_empty() {
            return self.source.clone();
        }
        let neg = if self.negated { "not " } else { "" };
        format!("{}{}({})", neg, self.predicate, self.args.join(", "))
    }

    pub fn connective(&self) -> Option<&str> {
        self.connective.as_deref()
    }
}

//! # Regras Horn com Negação Limitada
//!
//! Uma [`Rule`] é uma implicação com **um** átomo positivo na cabeça e um
//! corpo conjuntivo de [`Literal`]s, cada um possivelmente negado:
//!
//! ```text
//! grandparent(X, Z) :- parent(X, Y), parent(Y, Z).
//! happy(X)          :- person(X), not sad(X).
//! ```
//!
//! ## Restrição de Alcance
//!
//! Toda variável da cabeça precisa aparecer em algum literal **positivo** do
//! corpo; caso contrário a regra derivaria fatos com variáveis livres. A
//! única exceção são as variáveis existenciais da cabeça, que recebem uma
//! constante Skolem nova a cada disparo da regra.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{CalcError, Result};
use super::knowledge_base::Provenance;
use super::term::{Atom, Variable};

/// Identificador de uma regra registrada.
pub type RuleId = Uuid;

/// Literal do corpo de uma regra.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Literal {
    pub atom: Atom,
    pub negated: bool,
}

impl Literal {
    pub fn positive(atom: Atom) -> Self {
        Self {
            atom,
            negated: false,
        }
    }

    pub fn negative(atom: Atom) -> Self {
        Self {
            atom,
            negated: true,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "not {}", self.atom)
        } else {
            self.atom.fmt(f)
        }
    }
}

/// Regra `head :- body`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub head: Atom,
    pub body: Vec<Literal>,
    /// Variáveis da cabeça instanciadas com constantes Skolem novas a cada disparo.
    #[serde(default)]
    pub existentials: Vec<Variable>,
    pub provenance: Provenance,
}

impl Rule {
    pub fn new(head: Atom, body: Vec<Literal>) -> Self {
        Self {
            id: Uuid::new_v4(),
            head,
            body,
            existentials: Vec::new(),
            provenance: Provenance::default(),
        }
    }

    pub fn with_existentials(mut self, existentials: Vec<Variable>) -> Self {
        self.existentials = existentials;
        self
    }

    pub fn positive_body(&self) -> impl Iterator<Item = &Literal> {
        self.body.iter().filter(|l| !l.negated)
    }

    pub fn negative_body(&self) -> impl Iterator<Item = &Literal> {
        self.body.iter().filter(|l| l.negated)
    }

    pub fn has_negation(&self) -> bool {
        self.body.iter().any(|l| l.negated)
    }

    /// Verifica a restrição de alcance.
    ///
    /// # Erros
    ///
    /// [`CalcError::RangeRestriction`] com a primeira variável da cabeça que
    /// não é ligada por um literal positivo (nem declarada existencial).
    pub fn check_range_restriction(&self) -> Result<()> {
        if self.head.has_anonymous() {
            return Err(CalcError::RangeRestriction {
                rule: self.to_string(),
                variable: "_".to_string(),
            });
        }
        for var in self.head.variables() {
            if self.existentials.contains(var) {
                continue;
            }
            let bound = self
                .positive_body()
                .any(|lit| lit.atom.variables().contains(&var));
            if !bound {
                return Err(CalcError::RangeRestriction {
                    rule: self.to_string(),
                    variable: var.name().to_string(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.body.is_empty() {
            return write!(f, "{}.", self.head);
        }
        let body: Vec<String> = self.body.iter().map(|l| l.to_string()).collect();
        write!(f, "{} :- {}.", self.head, body.join(", "))
    }
}

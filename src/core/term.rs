//! # Termos e Átomos — O Vocabulário Lógico
//!
//! Modelo fechado de termos usado por todo o núcleo:
//!
//! | Tipo | Exemplo | Papel |
//! |------|---------|-------|
//! | [`Constant`] | `john`, `sk#3` | valor opaco nomeado |
//! | [`Variable`] | `X`, `_` | escopo de uma regra ou consulta |
//! | [`Term`] | `Constant \| Variable` | argumento de um átomo |
//! | [`Atom`] | `likes(X, chocolate)` | padrão (pode conter variáveis) |
//! | [`GroundAtom`] | `likes(john, chocolate)` | fato armazenável |
//! | [`Signature`] | `likes/2` | identidade do predicado |
//!
//! A aridade faz parte da identidade do predicado: `likes/2` e `likes/3`
//! são predicados distintos, nunca sobrecargas.
//!
//! ## Constantes Skolem
//!
//! Constantes Skolem usam o formato `sk#<n>`. O caractere `#` nunca sobrevive
//! à canonicalização de nomes do usuário, então uma constante Skolem jamais
//! colide com uma constante digitada.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefixo das constantes Skolem.
pub const SKOLEM_PREFIX: &str = "sk#";

/// Constante — valor opaco identificado pelo nome canônico.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Constant(String);

impl Constant {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Constante Skolem de índice `n`.
    pub fn skolem(n: u64) -> Self {
        Self(format!("{}{}", SKOLEM_PREFIX, n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_skolem(&self) -> bool {
        self.0.starts_with(SKOLEM_PREFIX)
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Variável com escopo de uma única regra ou consulta.
///
/// O nome `_` é a variável anônima: cada ocorrência é independente e ela
/// nunca conta como slot consultado.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variable(String);

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn anonymous() -> Self {
        Self("_".to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_anonymous(&self) -> bool {
        self.0 == "_"
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Argumento de um átomo.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "lowercase")]
pub enum Term {
    Constant(Constant),
    Variable(Variable),
}

impl Term {
    pub fn constant(name: impl Into<String>) -> Self {
        Term::Constant(Constant::new(name))
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Term::Variable(Variable::new(name))
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Term::Variable(v) => Some(v),
            Term::Constant(_) => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Constant(c) => c.fmt(f),
            Term::Variable(v) => v.fmt(f),
        }
    }
}

/// Identidade de um predicado: nome + aridade.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub arity: usize,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

/// Substituição variável → constante produzida por um casamento.
pub type Bindings = HashMap<Variable, Constant>;

/// Átomo — predicado aplicado a uma lista ordenada de termos.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Atom {
    pub predicate: String,
    pub terms: Vec<Term>,
}

impl Atom {
    pub fn new(predicate: impl Into<String>, terms: Vec<Term>) -> Self {
        Self {
            predicate: predicate.into(),
            terms,
        }
    }

    pub fn arity(&self) -> usize {
        self.terms.len()
    }

    pub fn signature(&self) -> Signature {
        Signature {
            name: self.predicate.clone(),
            arity: self.arity(),
        }
    }

    /// Variáveis nomeadas distintas, na ordem da primeira ocorrência.
    ///
    /// A variável anônima `_` não é incluída.
    pub fn variables(&self) -> Vec<&Variable> {
        let mut seen: Vec<&Variable> = Vec::new();
        for term in &self.terms {
            if let Term::Variable(v) = term {
                if !v.is_anonymous() && !seen.contains(&v) {
                    seen.push(v);
                }
            }
        }
        seen
    }

    pub fn has_anonymous(&self) -> bool {
        self.terms
            .iter()
            .any(|t| matches!(t, Term::Variable(v) if v.is_anonymous()))
    }

    pub fn is_ground(&self) -> bool {
        self.terms.iter().all(|t| matches!(t, Term::Constant(_)))
    }

    /// Converte para [`GroundAtom`] quando não há variáveis.
    pub fn to_ground(&self) -> Option<GroundAtom> {
        self.substitute(&Bindings::new())
    }

    /// Aplica a substituição; `None` se alguma variável continuar livre.
    pub fn substitute(&self, bindings: &Bindings) -> Option<GroundAtom> {
        let args = self
            .terms
            .iter()
            .map(|t| match t {
                Term::Constant(c) => Some(c.clone()),
                Term::Variable(v) => bindings.get(v).cloned(),
            })
            .collect::<Option<Vec<_>>>()?;
        Some(GroundAtom {
            predicate: self.predicate.clone(),
            args,
        })
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.terms.iter().map(|t| t.to_string()).collect();
        write!(f, "{}({})", self.predicate, args.join(", "))
    }
}

/// Átomo sem variáveis — a forma de todo fato armazenado na KB.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroundAtom {
    pub predicate: String,
    pub args: Vec<Constant>,
}

impl GroundAtom {
    pub fn new(predicate: impl Into<String>, args: Vec<Constant>) -> Self {
        Self {
            predicate: predicate.into(),
            args,
        }
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    pub fn signature(&self) -> Signature {
        Signature {
            name: self.predicate.clone(),
            arity: self.arity(),
        }
    }

    /// Visão como [`Atom`] (todos os termos constantes).
    pub fn to_atom(&self) -> Atom {
        Atom {
            predicate: self.predicate.clone(),
            terms: self.args.iter().cloned().map(Term::Constant).collect(),
        }
    }
}

impl fmt::Display for GroundAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<&str> = self.args.iter().map(|c| c.as_str()).collect();
        write!(f, "{}({})", self.predicate, args.join(", "))
    }
}

/// Atalho de testes: `ground("likes", &["john", "chocolate"])`.
#[cfg(test)]
pub fn ground(predicate: &str, args: &[&str]) -> GroundAtom {
    GroundAtom::new(predicate, args.iter().map(|a| Constant::new(*a)).collect())
}

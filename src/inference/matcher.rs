//! Casamento de padrões entre [`Atom`] e [`GroundAtom`].
//!
//! Usado pelo join do motor, pela verificação de literais negados e pelo
//! resolvedor de consultas.

use crate::core::{Atom, Bindings, GroundAtom, Term};

/// Estende `bindings` para que `pattern` case com `fact`.
///
/// Retorna `None` se predicado/aridade diferem ou se alguma constante ou
/// variável já ligada conflita. A variável anônima `_` casa com qualquer
/// valor e nunca é ligada.
pub fn match_atom(pattern: &Atom, fact: &GroundAtom, bindings: &Bindings) -> Option<Bindings> {
    if pattern.predicate != fact.predicate || pattern.arity() != fact.arity() {
        return None;
    }
    let mut extended: Option<Bindings> = None;
    for (term, value) in pattern.terms.iter().zip(&fact.args) {
        match term {
            Term::Constant(c) => {
                if c != value {
                    return None;
                }
            }
            Term::Variable(v) if v.is_anonymous() => {}
            Term::Variable(v) => {
                let bound = extended.as_ref().unwrap_or(bindings).get(v).cloned();
                match bound {
                    Some(bound) if &bound != value => return None,
                    Some(_) => {}
                    None => {
                        extended
                            .get_or_insert_with(|| bindings.clone())
                            .insert(v.clone(), value.clone());
                    }
                }
            }
        }
    }
    Some(extended.unwrap_or_else(|| bindings.clone()))
}

/// `true` se `pattern` casa com `fact` sob `bindings`.
pub fn matches(pattern: &Atom, fact: &GroundAtom, bindings: &Bindings) -> bool {
    match_atom(pattern, fact, bindings).is_some()
}

//! # Resolvedor de Consultas
//!
//! Responde perguntas contra o **fecho** da KB. Duas formas:
//!
//! | Forma | Variáveis nomeadas | Resposta |
//! |-------|-------------------:|----------|
//! | Sim/Não | 0 | [`Answer::YesNo`] |
//! | Quem/O quê | 1 | [`Answer::Wh`] (lista ordenada, pode ser vazia) |
//!
//! A variável anônima `_` nunca conta como slot consultado.
//!
//! ## Ordem das Etapas
//!
//! 1. validação (aridade conhecida, no máximo uma variável nomeada)
//! 2. inferência até o ponto fixo (pulada se a KB já está saturada)
//! 3. resposta
//!
//! Um fato negativo explícito tem precedência: `likes(john, chocolate)`
//! afirmado como falso responde **Não** e some das listas de respostas.

use serde::{Deserialize, Serialize};

use crate::core::{Atom, Bindings, CalcError, Constant, KnowledgeBase, Result};
use crate::inference::{match_atom, CancellationCheck, InferenceEngine};

/// Resposta de uma consulta.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Answer {
    YesNo { answer: bool },
    Wh { answers: Vec<Constant> },
}

impl Answer {
    /// Renderização curta para logs e CLI.
    pub fn render(&self) -> String {
        match self {
            Answer::YesNo { answer: true } => "Yes".to_string(),
            Answer::YesNo { answer: false } => "No".to_string(),
            Answer::Wh { answers } => {
                let names: Vec<&str> = answers.iter().map(|c| c.as_str()).collect();
                format!("[{}]", names.join(", "))
            }
        }
    }
}

/// Resolvedor — carrega o motor usado para saturar a KB antes de responder.
#[derive(Clone, Copy, Debug, Default)]
pub struct QueryResolver {
    engine: InferenceEngine,
}

impl QueryResolver {
    pub fn new(engine: InferenceEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    /// Valida a consulta sem tocar a KB.
    ///
    /// # Erros
    ///
    /// [`CalcError::QueryMalformed`] para mais de uma variável nomeada ou
    /// predicado conhecido somente com outras aridades.
    pub fn validate(&self, kb: &KnowledgeBase, query: &Atom) -> Result<()> {
        let vars = query.variables();
        if vars.len() > 1 {
            let names: Vec<&str> = vars.iter().map(|v| v.name()).collect();
            return Err(CalcError::query_malformed(format!(
                "mais de uma variável livre ({}) em {}",
                names.join(", "),
                query
            )));
        }
        let arities = kb.known_arities(&query.predicate);
        if !arities.is_empty() && !arities.contains(&query.arity()) {
            return Err(CalcError::query_malformed(format!(
                "aridade desconhecida para {}: conhecidas {:?}",
                query.signature(),
                arities
            )));
        }
        Ok(())
    }

    /// Resolve uma consulta: valida, satura a KB e responde.
    ///
    /// Falhas da inferência (cancelamento, limite) propagam sem alteração.
    pub fn resolve(
        &self,
        kb: &mut KnowledgeBase,
        query: &Atom,
        cancel: &impl CancellationCheck,
    ) -> Result<Answer> {
        self.validate(kb, query)?;
        self.engine.run(kb, cancel)?;

        let answer = match query.variables().first() {
            None => Answer::YesNo {
                answer: self.holds(kb, query),
            },
            Some(var) => {
                let var = (*var).clone();
                let mut answers: Vec<Constant> = Vec::new();
                for fact in kb.facts_with_signature(&query.signature()) {
                    if kb.contains_negative(&fact.atom) {
                        continue;
                    }
                    if let Some(b) = match_atom(query, &fact.atom, &Bindings::new()) {
                        if let Some(value) = b.get(&var) {
                            if !answers.contains(value) {
                                answers.push(value.clone());
                            }
                        }
                    }
                }
                Answer::Wh { answers }
            }
        };
        tracing::info!(query = %query, answer = %answer.render(), "Consulta respondida");
        Ok(answer)
    }

    /// Consulta sim/não (sem variáveis nomeadas) sobre o fecho já calculado.
    fn holds(&self, kb: &KnowledgeBase, query: &Atom) -> bool {
        if let Some(ground) = query.to_ground() {
            return !kb.contains_negative(&ground) && kb.contains_fact(&ground);
        }
        kb.facts_with_signature(&query.signature()).any(|fact| {
            !kb.contains_negative(&fact.atom)
                && match_atom(query, &fact.atom, &Bindings::new()).is_some()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::term::ground;
    use crate::core::{Literal, Provenance, Rule, SessionTag, Term};

    fn never() -> impl Fn() -> bool {
        || false
    }

    fn asserted() -> Provenance {
        Provenance::asserted(None, SessionTag::Base)
    }

    fn person_rule() -> Rule {
        Rule::new(
            Atom::new("person", vec![Term::variable("X")]),
            vec![Literal::positive(Atom::new("man", vec![Term::variable("X")]))],
        )
    }

    #[test]
    fn wh_answers_follow_insertion_order() {
        let mut kb = KnowledgeBase::new();
        kb.add_fact(ground("man", &["john"]), asserted());
        kb.add_rule(person_rule(), asserted()).unwrap();
        kb.add_fact(ground("person", &["mary"]), asserted());
        let query = Atom::new("person", vec![Term::variable("X")]);
        let answer = QueryResolver::default().resolve(&mut kb, &query, &never()).unwrap();
        // mary foi afirmada antes de john ser derivado.
        assert_eq!(
            answer,
            Answer::Wh {
                answers: vec![Constant::new("mary"), Constant::new("john")]
            }
        );
    }

    #[test]
    fn negative_fact_takes_precedence() {
        let mut kb = KnowledgeBase::new();
        kb.add_fact(ground("likes", &["john", "chocolate"]), asserted());
        kb.add_negative_fact(ground("likes", &["john", "chocolate"]), asserted());
        let yes_no = ground("likes", &["john", "chocolate"]).to_atom();
        let who = Atom::new("likes", vec![Term::variable("X"), Term::constant("chocolate")]);
        let resolver = QueryResolver::default();
        assert_eq!(
            resolver.resolve(&mut kb, &yes_no, &never()).unwrap(),
            Answer::YesNo { answer: false }
        );
        assert_eq!(
            resolver.resolve(&mut kb, &who, &never()).unwrap(),
            Answer::Wh { answers: vec![] }
        );
    }

    #[test]
    fn unknown_predicate_is_open_world() {
        let mut kb = KnowledgeBase::new();
        kb.add_fact(ground("man", &["john"]), asserted());
        let resolver = QueryResolver::default();
        let q = Atom::new("wizard", vec![Term::constant("john")]);
        assert_eq!(resolver.resolve(&mut kb, &q, &never()).unwrap(), Answer::YesNo { answer: false });
        let q = Atom::new("wizard", vec![Term::variable("X")]);
        assert_eq!(resolver.resolve(&mut kb, &q, &never()).unwrap(), Answer::Wh { answers: vec![] });
    }

    #[test]
    fn unknown_arity_is_malformed() {
        let mut kb = KnowledgeBase::new();
        kb.add_fact(ground("likes", &["john", "chocolate"]), asserted());
        let q = Atom::new("likes", vec![Term::constant("john")]);
        assert!(matches!(
            QueryResolver::default().resolve(&mut kb, &q, &never()),
            Err(CalcError::QueryMalformed { .. })
        ));
    }

    #[test]
    fn two_free_variables_are_malformed() {
        let mut kb = KnowledgeBase::new();
        let q = Atom::new("likes", vec![Term::variable("X"), Term::variable("Y")]);
        assert!(matches!(
            QueryResolver::default().resolve(&mut kb, &q, &never()),
            Err(CalcError::QueryMalformed { .. })
        ));
    }

    /// Só variáveis anônimas: Sim se algum fato casa.
    #[test]
    fn anonymous_only_query_is_existence_check() {
        let mut kb = KnowledgeBase::new();
        kb.add_fact(ground("income", &["john", "2400"]), asserted());
        let resolver = QueryResolver::default();
        let q = Atom::new("income", vec![Term::constant("john"), Term::variable("_")]);
        assert_eq!(resolver.resolve(&mut kb, &q, &never()).unwrap(), Answer::YesNo { answer: true });
        let q = Atom::new("income", vec![Term::constant("mary"), Term::variable("_")]);
        assert_eq!(resolver.resolve(&mut kb, &q, &never()).unwrap(), Answer::YesNo { answer: false });
    }

    #[test]
    fn validation_runs_before_inference() {
        let mut kb = KnowledgeBase::new();
        kb.add_fact(ground("man", &["john"]), asserted());
        kb.add_rule(person_rule(), asserted()).unwrap();
        let q = Atom::new("person", vec![Term::variable("X"), Term::variable("Y")]);
        assert!(QueryResolver::default().resolve(&mut kb, &q, &never()).is_err());
        assert_eq!(kb.derived_count(), 0);
    }

    #[test]
    fn inference_errors_propagate_unchanged() {
        let mut kb = KnowledgeBase::new();
        kb.add_fact(ground("man", &["john"]), asserted());
        kb.add_rule(person_rule(), asserted()).unwrap();
        let q = Atom::new("person", vec![Term::constant("john")]);
        assert_eq!(
            QueryResolver::default().resolve(&mut kb, &q, &|| true),
            Err(CalcError::InferenceCancelled { completed: 0 })
        );
    }

    #[test]
    fn answer_serializes_with_kind_tag() {
        let json = serde_json::to_value(Answer::YesNo { answer: true }).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "yesno", "answer": true }));
        let json = serde_json::to_value(Answer::Wh { answers: vec![Constant::new("john")] }).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "wh", "answers": ["john"] }));
    }
}

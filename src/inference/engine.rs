//! # Motor de Encadeamento Progressivo
//!
//! Calcula o **fecho** da KB sob as regras registradas: aplica todas as
//! regras repetidamente até que uma iteração inteira não produza nenhum fato
//! novo (ponto fixo).
//!
//! ## Uma Iteração
//!
//! ```text
//! para cada regra, em ordem de registro:
//!   join esquerda→direita dos literais positivos
//!       contra (fatos confirmados ∪ pendentes desta iteração)
//!   para cada ligação consistente:
//!       literais negados: nenhum fato *confirmado* pode casar
//!       cabeça: existenciais recebem Skolem novo
//!       fato novo? → pendentes
//! fronteira: cancelado? descarta pendentes : confirma pendentes
//! ```
//!
//! Os literais negados leem a KB como estava **no início** da iteração; os
//! positivos enxergam também o que regras anteriores derivaram nesta mesma
//! iteração. Para regras sem negação o resultado é monotônico; para
//! conjuntos não estratificáveis o resultado depende da ordem das regras.
//!
//! ## Regras Existenciais
//!
//! Uma regra com variáveis existenciais na cabeça só dispara quando nenhum
//! fato já satisfaz a cabeça (com as existenciais como coringas). Sem isso
//! cada iteração cunharia um Skolem novo para a mesma ligação e o ponto fixo
//! nunca chegaria nem para regras não recursivas.
//!
//! ## Garantias
//!
//! | Situação | Resultado | Estado da KB |
//! |----------|-----------|--------------|
//! | iteração silenciosa | `Ok(report)` | fecho completo, saturada |
//! | cancelamento | `InferenceCancelled` | idêntica à última iteração completa |
//! | limite atingido | `InferenceLimitExceeded` | mantém o que foi confirmado |

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::cancel::CancellationCheck;
use super::matcher::{match_atom, matches};
use crate::core::{
    Atom, Bindings, CalcError, Constant, GroundAtom, KnowledgeBase, Provenance, Result, Rule,
    RuleId, Signature, Term, Variable,
};

/// Limite padrão de iterações do ponto fixo.
pub const DEFAULT_MAX_ITERATIONS: usize = 64;

/// Resumo de uma execução que chegou ao ponto fixo.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct InferenceReport {
    /// Iterações executadas, incluindo a silenciosa final.
    pub iterations: usize,
    /// Fatos derivados nesta execução.
    pub derived: usize,
}

/// Fatos derivados ainda não confirmados na KB.
#[derive(Default)]
struct Pending {
    facts: Vec<(GroundAtom, RuleId)>,
    seen: HashSet<GroundAtom>,
    by_signature: HashMap<Signature, Vec<usize>>,
}

impl Pending {
    fn push(&mut self, atom: GroundAtom, rule: RuleId) -> bool {
        if !self.seen.insert(atom.clone()) {
            return false;
        }
        self.by_signature
            .entry(atom.signature())
            .or_default()
            .push(self.facts.len());
        self.facts.push((atom, rule));
        true
    }

    fn with_signature<'a>(
        &'a self,
        signature: &Signature,
    ) -> impl Iterator<Item = &'a GroundAtom> + 'a {
        self.by_signature
            .get(signature)
            .map(|positions| positions.as_slice())
            .unwrap_or_default()
            .iter()
            .map(move |&pos| &self.facts[pos].0)
    }

    fn contains(&self, atom: &GroundAtom) -> bool {
        self.seen.contains(atom)
    }

    fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    fn len(&self) -> usize {
        self.facts.len()
    }
}

/// Motor de inferência — guarda apenas o limite de iterações.
///
/// Recebe a KB por referência mutável a cada execução; não existe estado
/// entre execuções além do que fica na própria KB.
#[derive(Clone, Copy, Debug)]
pub struct InferenceEngine {
    max_iterations: usize,
}

impl Default for InferenceEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITERATIONS)
    }
}

impl InferenceEngine {
    pub fn new(max_iterations: usize) -> Self {
        Self { max_iterations }
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Executa até o ponto fixo.
    ///
    /// # Erros
    ///
    /// - [`CalcError::InferenceCancelled`] quando `cancel` dispara; a KB fica
    ///   exatamente como após a última iteração completa.
    /// - [`CalcError::InferenceLimitExceeded`] após `max_iterations`
    ///   iterações que ainda produziram fatos.
    pub fn run(
        &self,
        kb: &mut KnowledgeBase,
        cancel: &impl CancellationCheck,
    ) -> Result<InferenceReport> {
        self.run_with_observer(kb, cancel, |_, _| {})
    }

    /// Como [`run`](Self::run), chamando `observer(iteração, kb)` após cada
    /// iteração confirmada.
    pub fn run_with_observer(
        &self,
        kb: &mut KnowledgeBase,
        cancel: &impl CancellationCheck,
        mut observer: impl FnMut(usize, &KnowledgeBase),
    ) -> Result<InferenceReport> {
        if kb.is_saturated() {
            tracing::debug!("Inferência: KB já saturada, nada a fazer");
            return Ok(InferenceReport::default());
        }
        if cancel.is_cancelled() {
            tracing::info!(completed = 0, "Inferência: cancelada antes da primeira iteração");
            return Err(CalcError::InferenceCancelled { completed: 0 });
        }

        let mut derived = 0;
        for iteration in 1..=self.max_iterations {
            let mut pending = Pending::default();
            let mut next_skolem = kb.skolem_counter();

            for rule in kb.rules() {
                self.fire(kb, rule, &mut pending, &mut next_skolem);
            }

            if cancel.is_cancelled() {
                tracing::info!(
                    completed = iteration - 1,
                    discarded = pending.len(),
                    "Inferência: cancelada, iteração descartada"
                );
                return Err(CalcError::InferenceCancelled {
                    completed: iteration - 1,
                });
            }

            if pending.is_empty() {
                kb.mark_saturated();
                tracing::info!(iterations = iteration, derived, "Inferência: ponto fixo alcançado");
                return Ok(InferenceReport {
                    iterations: iteration,
                    derived,
                });
            }

            let added = pending.len();
            for (atom, rule) in pending.facts {
                kb.add_fact(atom, Provenance::derived(rule, iteration));
            }
            kb.advance_skolem_counter(next_skolem);
            derived += added;
            tracing::debug!(iteration, added, "Inferência: iteração confirmada");
            observer(iteration, kb);
        }

        tracing::warn!(
            iterations = self.max_iterations,
            derived,
            "Inferência: limite de iterações atingido"
        );
        Err(CalcError::InferenceLimitExceeded {
            iterations: self.max_iterations,
            derived,
        })
    }

    /// Dispara uma regra contra a KB, acumulando fatos novos em `pending`.
    fn fire(&self, kb: &KnowledgeBase, rule: &Rule, pending: &mut Pending, next_skolem: &mut u64) {
        let solutions = self.join(kb, pending, rule);

        for bindings in solutions {
            let blocked = rule.negative_body().any(|lit| {
                kb.facts_with_signature(&lit.atom.signature())
                    .any(|f| matches(&lit.atom, &f.atom, &bindings))
            });
            if blocked {
                continue;
            }

            if !rule.existentials.is_empty() {
                if self.head_satisfied(kb, pending, rule, &bindings) {
                    continue;
                }
                let mut extended = bindings;
                for var in &rule.existentials {
                    *next_skolem += 1;
                    extended.insert(var.clone(), Constant::skolem(*next_skolem));
                }
                if let Some(fact) = rule.head.substitute(&extended) {
                    pending.push(fact, rule.id);
                }
                continue;
            }

            if let Some(fact) = rule.head.substitute(&bindings) {
                if !kb.contains_fact(&fact) && !pending.contains(&fact) {
                    pending.push(fact, rule.id);
                }
            }
        }
    }

    /// Join aninhado esquerda→direita dos literais positivos.
    fn join(&self, kb: &KnowledgeBase, pending: &Pending, rule: &Rule) -> Vec<Bindings> {
        let mut solutions = vec![Bindings::new()];
        for literal in rule.positive_body() {
            let signature = literal.atom.signature();
            let mut next = Vec::new();
            for bindings in &solutions {
                let committed = kb.facts_with_signature(&signature).map(|f| &f.atom);
                for fact in committed.chain(pending.with_signature(&signature)) {
                    if let Some(extended) = match_atom(&literal.atom, fact, bindings) {
                        next.push(extended);
                    }
                }
            }
            if next.is_empty() {
                return next;
            }
            solutions = next;
        }
        solutions
    }

    /// Algum fato (confirmado ou pendente) já satisfaz a cabeça, tratando as
    /// existenciais como coringas?
    fn head_satisfied(
        &self,
        kb: &KnowledgeBase,
        pending: &Pending,
        rule: &Rule,
        bindings: &Bindings,
    ) -> bool {
        let pattern = Atom::new(
            rule.head.predicate.clone(),
            rule.head
                .terms
                .iter()
                .map(|t| match t {
                    Term::Variable(v) if rule.existentials.contains(v) => {
                        Term::Variable(Variable::anonymous())
                    }
                    other => other.clone(),
                })
                .collect(),
        );
        let signature = pattern.signature();
        kb.facts_with_signature(&signature)
            .map(|f| &f.atom)
            .chain(pending.with_signature(&signature))
            .any(|fact| matches(&pattern, fact, bindings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::term::ground;
    use crate::core::{Literal, SessionTag};

    fn atom(p: &str, args: &[&str]) -> Atom {
        let terms = args
            .iter()
            .map(|a| {
                if a.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
                    Term::variable(*a)
                } else {
                    Term::constant(*a)
                }
            })
            .collect();
        Atom::new(p, terms)
    }

    fn asserted() -> Provenance {
        Provenance::asserted(None, SessionTag::Base)
    }

    fn never() -> impl Fn() -> bool {
        || false
    }

    fn family() -> KnowledgeBase {
        let mut kb = KnowledgeBase::new();
        kb.add_fact(ground("parent", &["tom", "john"]), asserted());
        kb.add_fact(ground("parent", &["john", "mary"]), asserted());
        kb.add_rule(
            Rule::new(
                atom("grandparent", &["X", "Z"]),
                vec![
                    Literal::positive(atom("parent", &["X", "Y"])),
                    Literal::positive(atom("parent", &["Y", "Z"])),
                ],
            ),
            asserted(),
        )
        .unwrap();
        kb
    }

    #[test]
    fn derives_transitive_facts_to_fixpoint() {
        let mut kb = family();
        let report = InferenceEngine::default().run(&mut kb, &never()).unwrap();
        assert_eq!(report.derived, 1);
        assert!(kb.contains_fact(&ground("grandparent", &["tom", "mary"])));
        assert!(kb.is_saturated());
    }

    /// Refazer o join sobre o fecho não deriva nada novo.
    #[test]
    fn rerun_over_closure_is_a_noop() {
        let mut kb = family();
        let engine = InferenceEngine::default();
        engine.run(&mut kb, &never()).unwrap();
        let before = serde_json::to_string(&kb).unwrap();

        kb.rebuild_index();
        assert!(!kb.is_saturated());
        let report = engine.run(&mut kb, &never()).unwrap();
        assert_eq!(report, InferenceReport { iterations: 1, derived: 0 });
        assert!(kb.is_saturated());
        assert_eq!(serde_json::to_string(&kb).unwrap(), before);
    }

    #[test]
    fn negated_literal_blocks_binding() {
        let mut kb = KnowledgeBase::new();
        kb.add_fact(ground("person", &["ann"]), asserted());
        kb.add_fact(ground("person", &["bob"]), asserted());
        kb.add_fact(ground("sad", &["bob"]), asserted());
        kb.add_rule(
            Rule::new(
                atom("happy", &["X"]),
                vec![
                    Literal::positive(atom("person", &["X"])),
                    Literal::negative(atom("sad", &["X"])),
                ],
            ),
            asserted(),
        )
        .unwrap();
        InferenceEngine::default().run(&mut kb, &never()).unwrap();
        assert!(kb.contains_fact(&ground("happy", &["ann"])));
        assert!(!kb.contains_fact(&ground("happy", &["bob"])));
    }

    /// Negação lê os fatos confirmados no início da iteração: `sad(bob)`
    /// derivado na mesma iteração não bloqueia `happy(bob)`.
    #[test]
    fn negated_literal_ignores_facts_pending_in_same_iteration() {
        let mut kb = KnowledgeBase::new();
        kb.add_fact(ground("person", &["bob"]), asserted());
        kb.add_fact(ground("gloomy", &["bob"]), asserted());
        kb.add_rule(
            Rule::new(
                atom("sad", &["X"]),
                vec![
                    Literal::positive(atom("person", &["X"])),
                    Literal::positive(atom("gloomy", &["X"])),
                ],
            ),
            asserted(),
        )
        .unwrap();
        kb.add_rule(
            Rule::new(
                atom("happy", &["X"]),
                vec![
                    Literal::positive(atom("person", &["X"])),
                    Literal::negative(atom("sad", &["X"])),
                ],
            ),
            asserted(),
        )
        .unwrap();
        let report = InferenceEngine::default().run(&mut kb, &never()).unwrap();
        assert_eq!(report.derived, 2);
        assert!(kb.contains_fact(&ground("sad", &["bob"])));
        assert!(kb.contains_fact(&ground("happy", &["bob"])));
    }

    /// Literal negado com variável não ligada: "não existe fato que case".
    #[test]
    fn negated_literal_with_unbound_variable_reads_as_no_match() {
        let mut kb = KnowledgeBase::new();
        kb.add_fact(ground("person", &["ann"]), asserted());
        kb.add_fact(ground("owns", &["bob", "car"]), asserted());
        kb.add_rule(
            Rule::new(
                atom("walker", &["X"]),
                vec![
                    Literal::positive(atom("person", &["X"])),
                    Literal::negative(atom("owns", &["X", "Y"])),
                ],
            ),
            asserted(),
        )
        .unwrap();
        InferenceEngine::default().run(&mut kb, &never()).unwrap();
        assert!(kb.contains_fact(&ground("walker", &["ann"])));
    }

    #[test]
    fn observer_sees_monotonic_growth() {
        let mut kb = KnowledgeBase::new();
        for (a, b) in [("a", "b"), ("b", "c"), ("c", "d"), ("d", "e")] {
            kb.add_fact(ground("edge", &[a, b]), asserted());
        }
        kb.add_rule(
            Rule::new(
                atom("path", &["X", "Y"]),
                vec![Literal::positive(atom("edge", &["X", "Y"]))],
            ),
            asserted(),
        )
        .unwrap();
        kb.add_rule(
            Rule::new(
                atom("path", &["X", "Z"]),
                vec![
                    Literal::positive(atom("edge", &["X", "Y"])),
                    Literal::positive(atom("path", &["Y", "Z"])),
                ],
            ),
            asserted(),
        )
        .unwrap();

        let mut snapshots: Vec<Vec<GroundAtom>> = Vec::new();
        InferenceEngine::default()
            .run_with_observer(&mut kb, &never(), |_, kb| {
                snapshots.push(kb.facts().iter().map(|f| f.atom.clone()).collect());
            })
            .unwrap();

        assert!(!snapshots.is_empty());
        for pair in snapshots.windows(2) {
            assert!(pair[0].iter().all(|f| pair[1].contains(f)));
            assert!(pair[1].len() > pair[0].len());
        }
        assert!(kb.contains_fact(&ground("path", &["a", "e"])));
    }

    #[test]
    fn cancellation_before_start_leaves_kb_untouched() {
        let mut kb = family();
        let before = serde_json::to_string(&kb).unwrap();
        let err = InferenceEngine::default().run(&mut kb, &|| true).unwrap_err();
        assert_eq!(err, CalcError::InferenceCancelled { completed: 0 });
        assert_eq!(serde_json::to_string(&kb).unwrap(), before);
    }

    /// Cancelar na fronteira da primeira iteração descarta o trabalho dela.
    #[test]
    fn cancellation_at_first_boundary_discards_iteration() {
        let mut kb = family();
        let before = serde_json::to_string(&kb).unwrap();
        let calls = std::cell::Cell::new(0);
        let check = || {
            calls.set(calls.get() + 1);
            calls.get() > 1
        };
        let err = InferenceEngine::default().run(&mut kb, &check).unwrap_err();
        assert_eq!(err, CalcError::InferenceCancelled { completed: 0 });
        assert_eq!(serde_json::to_string(&kb).unwrap(), before);
        assert!(!kb.is_saturated());
    }

    /// Cancelar na segunda fronteira mantém a primeira iteração confirmada.
    #[test]
    fn cancellation_at_second_boundary_keeps_first_iteration() {
        let mut kb = KnowledgeBase::new();
        for (a, b) in [("a", "b"), ("b", "c"), ("c", "d")] {
            kb.add_fact(ground("edge", &[a, b]), asserted());
        }
        kb.add_rule(
            Rule::new(
                atom("path", &["X", "Y"]),
                vec![Literal::positive(atom("edge", &["X", "Y"]))],
            ),
            asserted(),
        )
        .unwrap();
        kb.add_rule(
            Rule::new(
                atom("path", &["X", "Z"]),
                vec![
                    Literal::positive(atom("edge", &["X", "Y"])),
                    Literal::positive(atom("path", &["Y", "Z"])),
                ],
            ),
            asserted(),
        )
        .unwrap();

        // 1ª consulta antes de começar, 2ª na fronteira da iteração 1.
        let calls = std::cell::Cell::new(0);
        let check = || {
            calls.set(calls.get() + 1);
            calls.get() > 2
        };
        let mut after_first = None;
        let err = InferenceEngine::default()
            .run_with_observer(&mut kb, &check, |iteration, kb| {
                assert_eq!(iteration, 1);
                after_first = Some(serde_json::to_string(kb).unwrap());
            })
            .unwrap_err();

        assert_eq!(err, CalcError::InferenceCancelled { completed: 1 });
        assert_eq!(Some(serde_json::to_string(&kb).unwrap()), after_first);
        assert!(kb.contains_fact(&ground("path", &["a", "c"])));
        assert!(!kb.contains_fact(&ground("path", &["a", "d"])));
        assert!(!kb.is_saturated());
    }

    #[test]
    fn existential_rule_fires_once_per_binding() {
        let mut kb = KnowledgeBase::new();
        kb.add_fact(ground("person", &["john"]), asserted());
        kb.add_rule(
            Rule::new(atom("parent", &["Y", "X"]), vec![Literal::positive(atom("person", &["X"]))])
                .with_existentials(vec![Variable::new("Y")]),
            asserted(),
        )
        .unwrap();
        let report = InferenceEngine::default().run(&mut kb, &never()).unwrap();
        assert_eq!(report.derived, 1);
        assert!(kb.contains_fact(&ground("parent", &["sk#1", "john"])));
        assert_eq!(kb.skolem_counter(), 1);
    }

    /// Toda pessoa tem um pai que é pessoa: cadeia Skolem infinita.
    #[test]
    fn recursive_skolem_rule_hits_iteration_limit() {
        let mut kb = KnowledgeBase::new();
        kb.add_fact(ground("person", &["john"]), asserted());
        kb.add_rule(
            Rule::new(atom("parent", &["Y", "X"]), vec![Literal::positive(atom("person", &["X"]))])
                .with_existentials(vec![Variable::new("Y")]),
            asserted(),
        )
        .unwrap();
        kb.add_rule(
            Rule::new(atom("person", &["Y"]), vec![Literal::positive(atom("parent", &["Y", "X"]))]),
            asserted(),
        )
        .unwrap();
        let err = InferenceEngine::new(10).run(&mut kb, &never()).unwrap_err();
        match err {
            CalcError::InferenceLimitExceeded { iterations, derived } => {
                assert_eq!(iterations, 10);
                assert!(derived > 0);
            }
            other => panic!("esperava InferenceLimitExceeded, obteve {:?}", other),
        }
        assert!(!kb.is_saturated());
        assert!(kb.derived_count() > 0);
    }
}

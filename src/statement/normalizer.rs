//! # Normalizador de Termos — ClauseTree → Átomos Canônicos
//!
//! Transforma uma [`ClauseTree`] já classificada na forma interna que a KB
//! armazena. O reconhecimento é uma lista **finita e ordenada por
//! prioridade** de templates estruturais; o primeiro que casa vence:
//!
//! | Prioridade | Template | Exemplo | Saída |
//! |-----------:|----------|---------|-------|
//! | 1 | `Conditional` | "If X is a man then X is a person." | `Rule` |
//! | 2 | `RestrictedUniversal` | "Every man is a person." | `Rule` |
//! | 3 | `NegatedAssertion` | "John does not like chocolate." | `NegativeFact` |
//! | 4 | `ExistentialAssertion` | "Some person likes chocolate." | `Facts` |
//! | 5 | `Assertion` | "John is a man." | `Facts` |
//! | 6 | `Question` | "Who is a person?" | `Query` |
//!
//! ## Canonicalização
//!
//! Nomes de predicados e constantes passam pela mesma função: trim,
//! minúsculas, sequências de espaços ou `-` viram `_`, qualquer outro
//! caractere fora de `[a-z0-9_.]` é descartado. Predicados precisam começar
//! com letra. A função é idempotente: normalizar de novo a mesma entrada
//! produz exatamente os mesmos átomos.
//!
//! ## Skolemização
//!
//! Variáveis existenciais de um fato declarativo recebem uma constante
//! Skolem nova cada. As constantes só são geradas **depois** que a sentença
//! inteira passou na validação; uma sentença rejeitada não consome o contador.

use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

use super::classifier::StatementKind;
use super::clause::{ClauseTree, Mood, QuantifierKind};
use crate::core::{Atom, CalcError, Constant, GroundAtom, Literal, Result, Rule, Term, Variable};

/// Resultado da normalização de uma sentença.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum NormalizedStatement {
    /// Átomo principal primeiro, seguido dos átomos de restrição de um
    /// sujeito existencial.
    Facts(Vec<GroundAtom>),
    NegativeFact(GroundAtom),
    Rule(Rule),
    Query(Atom),
}

/// Templates estruturais reconhecidos, em ordem de prioridade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Template {
    Conditional,
    RestrictedUniversal,
    NegatedAssertion,
    ExistentialAssertion,
    Assertion,
    Question,
}

impl Template {
    pub const PRIORITY: [Template; 6] = [
        Template::Conditional,
        Template::RestrictedUniversal,
        Template::NegatedAssertion,
        Template::ExistentialAssertion,
        Template::Assertion,
        Template::Question,
    ];

    /// Teste estrutural do template (sem validar os termos).
    fn matches(self, tree: &ClauseTree, kind: StatementKind) -> bool {
        let connective = tree.connective().map(|c| c.trim().to_lowercase());
        let has_existential = tree
            .quantifiers
            .iter()
            .any(|q| q.kind == QuantifierKind::Existential);
        match self {
            Template::Conditional => {
                kind == StatementKind::Rule && connective.as_deref() == Some("if")
            }
            Template::RestrictedUniversal => {
                kind == StatementKind::Rule && connective.as_deref() == Some("every")
            }
            Template::NegatedAssertion => {
                kind == StatementKind::Fact && tree.negated && connective.is_none()
            }
            Template::ExistentialAssertion => {
                kind == StatementKind::Fact
                    && !tree.negated
                    && (connective.as_deref() == Some("some")
                        || (connective.is_none() && has_existential))
            }
            Template::Assertion => {
                kind == StatementKind::Fact && !tree.negated && connective.is_none()
            }
            Template::Question => {
                kind == StatementKind::Query && !tree.negated && connective.is_none()
            }
        }
    }

    /// Primeiro template (em prioridade) que casa com a árvore.
    pub fn recognize(tree: &ClauseTree, kind: StatementKind) -> Option<Template> {
        Self::PRIORITY.into_iter().find(|t| t.matches(tree, kind))
    }
}

/// Canonicaliza um nome de predicado ou constante.
///
/// NFC, minúsculas, separadores viram `_`; letras e dígitos de qualquer
/// escrita são mantidos, pontuação é descartada.
///
/// ```rust
/// use logic_calculator::statement::canonical_name;
///
/// assert_eq!(canonical_name("  New-York City "), "new_york_city");
/// assert_eq!(canonical_name("O'Brien"), "obrien");
/// assert_eq!(canonical_name("2400.50"), "2400.50");
/// assert_eq!(canonical_name("Zoë"), "zoë");
/// assert_eq!(canonical_name("Дмитрий"), "дмитрий");
/// ```
pub fn canonical_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for ch in raw.trim().nfc().flat_map(char::to_lowercase) {
        if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_sep = true;
            continue;
        }
        if !(ch.is_alphanumeric() || ch == '.') {
            continue;
        }
        if pending_sep && !out.is_empty() {
            out.push('_');
        }
        pending_sep = false;
        out.push(ch);
    }
    out
}

/// Normalizador — struct sem estado, como o classificador.
#[derive(Clone, Copy, Debug, Default)]
pub struct TermNormalizer;

impl TermNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normaliza uma árvore classificada como `kind`.
    ///
    /// `mint` fornece constantes Skolem novas; só é chamado depois que a
    /// sentença inteira foi validada.
    ///
    /// # Erros
    ///
    /// [`CalcError::Classification`] com o fragmento de origem quando nenhum
    /// template casa ou quando os termos violam o template (variável livre em
    /// fato, variável anônima fora de consulta, condição aninhada, cabeça
    /// negada, pergunta negada, nome vazio).
    pub fn normalize(
        &self,
        tree: &ClauseTree,
        kind: StatementKind,
        mint: impl FnMut() -> Constant,
    ) -> Result<NormalizedStatement> {
        let template = Template::recognize(tree, kind).ok_or_else(|| {
            CalcError::classification(tree.fragment(), "nenhum template reconhece a sentença")
        })?;
        tracing::debug!(template = ?template, fragment = %tree.fragment(), "Template reconhecido");

        match template {
            Template::Conditional | Template::RestrictedUniversal => {
                self.rule(tree, template).map(NormalizedStatement::Rule)
            }
            Template::NegatedAssertion => {
                let atom = self.atom(tree, tree, false)?;
                let ground = self.ground_fact(tree, &atom)?;
                Ok(NormalizedStatement::NegativeFact(ground))
            }
            Template::ExistentialAssertion => self.existential(tree, mint),
            Template::Assertion => {
                let atom = self.atom(tree, tree, false)?;
                let ground = self.ground_fact(tree, &atom)?;
                Ok(NormalizedStatement::Facts(vec![ground]))
            }
            Template::Question => self.atom(tree, tree, true).map(NormalizedStatement::Query),
        }
    }

    /// Nome de predicado canônico; precisa começar com letra.
    pub fn predicate(&self, tree: &ClauseTree) -> Result<String> {
        let name = canonical_name(&tree.predicate);
        match name.chars().next() {
            Some(c) if c.is_alphabetic() => Ok(name),
            _ => Err(CalcError::classification(
                tree.fragment(),
                format!("predicado inválido '{}'", tree.predicate),
            )),
        }
    }

    /// Converte um argumento em termo, consultando os quantificadores de
    /// `scope` (a sentença inteira) e da própria cláusula.
    fn term(
        &self,
        scope: &ClauseTree,
        clause: &ClauseTree,
        raw: &str,
        allow_anonymous: bool,
    ) -> Result<Term> {
        let raw = raw.trim();
        if raw == "_" {
            if !allow_anonymous {
                return Err(CalcError::classification(
                    scope.fragment(),
                    "variável anônima só é permitida em consultas",
                ));
            }
            return Ok(Term::Variable(Variable::anonymous()));
        }
        if clause.quantifier_of(raw).is_some() || scope.quantifier_of(raw).is_some() {
            return Ok(Term::variable(raw));
        }
        let name = canonical_name(raw);
        if name.is_empty() {
            return Err(CalcError::classification(
                scope.fragment(),
                format!("argumento vazio após canonicalização: '{}'", raw),
            ));
        }
        Ok(Term::Constant(Constant::new(name)))
    }

    /// Átomo de uma cláusula atômica (sem condições aninhadas).
    fn atom(&self, scope: &ClauseTree, clause: &ClauseTree, allow_anonymous: bool) -> Result<Atom> {
        let nested = clause.connective.is_some() || !clause.conditions.is_empty();
        if nested && !std::ptr::eq(scope, clause) {
            return Err(CalcError::classification(
                scope.fragment(),
                "condições aninhadas não são suportadas",
            ));
        }
        let predicate = self.predicate(clause).map_err(|e| match e {
            CalcError::Classification { reason, .. } => {
                CalcError::classification(scope.fragment(), reason)
            }
            other => other,
        })?;
        let terms = clause
            .args
            .iter()
            .map(|a| self.term(scope, clause, a, allow_anonymous))
            .collect::<Result<Vec<_>>>()?;
        Ok(Atom::new(predicate, terms))
    }

    /// Fato declarativo: nenhuma variável pode sobrar.
    fn ground_fact(&self, tree: &ClauseTree, atom: &Atom) -> Result<GroundAtom> {
        atom.to_ground().ok_or_else(|| {
            let free = atom
                .variables()
                .first()
                .map(|v| v.name().to_string())
                .unwrap_or_default();
            CalcError::classification(
                tree.fragment(),
                format!("fato com variável livre {}", free),
            )
        })
    }

    fn condition_literals(&self, tree: &ClauseTree) -> Result<Vec<Literal>> {
        tree.conditions
            .iter()
            .map(|cond| {
                if cond.mood != Mood::Declarative {
                    return Err(CalcError::classification(
                        tree.fragment(),
                        "condição interrogativa",
                    ));
                }
                let atom = self.atom(tree, cond, false)?;
                Ok(if cond.negated {
                    Literal::negative(atom)
                } else {
                    Literal::positive(atom)
                })
            })
            .collect()
    }

    fn rule(&self, tree: &ClauseTree, template: Template) -> Result<Rule> {
        if tree.negated {
            return Err(CalcError::classification(
                tree.fragment(),
                "cabeça de regra negada não é uma cláusula Horn",
            ));
        }
        if template == Template::RestrictedUniversal
            && !tree
                .quantifiers
                .iter()
                .any(|q| q.kind == QuantifierKind::Universal)
        {
            return Err(CalcError::classification(
                tree.fragment(),
                "'every' sem variável universal",
            ));
        }

        let head = self.atom(tree, tree, false)?;
        let body = self.condition_literals(tree)?;

        // Existenciais da cabeça não ligadas pelo corpo positivo viram Skolem
        // por disparo; no corpo são variáveis comuns.
        let existentials: Vec<Variable> = head
            .variables()
            .into_iter()
            .filter(|v| {
                tree.quantifier_of(v.name()) == Some(QuantifierKind::Existential)
                    && !body
                        .iter()
                        .filter(|l| !l.negated)
                        .any(|l| l.atom.variables().contains(v))
            })
            .cloned()
            .collect();

        Ok(Rule::new(head, body).with_existentials(existentials))
    }

    fn existential(
        &self,
        tree: &ClauseTree,
        mut mint: impl FnMut() -> Constant,
    ) -> Result<NormalizedStatement> {
        let main = self.atom(tree, tree, false)?;
        let mut atoms = vec![main];
        for cond in &tree.conditions {
            if cond.negated || cond.mood != Mood::Declarative {
                return Err(CalcError::classification(
                    tree.fragment(),
                    "restrição existencial precisa ser afirmativa",
                ));
            }
            atoms.push(self.atom(tree, cond, false)?);
        }

        // Toda variável usada precisa ser existencial.
        let mut existentials: Vec<Variable> = Vec::new();
        for atom in &atoms {
            for var in atom.variables() {
                let declared = tree
                    .quantifier_of(var.name())
                    .or_else(|| {
                        tree.conditions
                            .iter()
                            .find_map(|c| c.quantifier_of(var.name()))
                    });
                if declared != Some(QuantifierKind::Existential) {
                    return Err(CalcError::classification(
                        tree.fragment(),
                        format!("fato com variável livre {}", var.name()),
                    ));
                }
                if !existentials.contains(var) {
                    existentials.push(var.clone());
                }
            }
        }

        // Validação concluída: só agora o contador Skolem é consumido.
        let bindings = existentials
            .into_iter()
            .map(|v| (v, mint()))
            .collect::<crate::core::Bindings>();
        let facts = atoms
            .iter()
            .map(|a| {
                a.substitute(&bindings).ok_or_else(|| {
                    CalcError::classification(tree.fragment(), "variável existencial sem Skolem")
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(NormalizedStatement::Facts(facts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::term::ground;

    fn counter() -> impl FnMut() -> Constant {
        let mut n = 0;
        move || {
            n += 1;
            Constant::skolem(n)
        }
    }

    fn normalize(tree: &ClauseTree, kind: StatementKind) -> Result<NormalizedStatement> {
        TermNormalizer::new().normalize(tree, kind, counter())
    }

    #[test]
    fn canonical_name_is_idempotent() {
        for raw in ["John", "  New   York ", "well-known", "A.B_c", "Ünïcode", "x__y"] {
            let once = canonical_name(raw);
            assert_eq!(canonical_name(&once), once);
        }
        assert_eq!(canonical_name("x__y"), "x_y");
    }

    #[test]
    fn canonical_name_keeps_non_ascii_letters() {
        assert_ne!(canonical_name("Zoë"), canonical_name("Zo"));
        // "e" + trema combinante compõe o mesmo nome que "ë".
        assert_eq!(canonical_name("Zoe\u{308}"), canonical_name("Zo\u{eb}"));
        assert_eq!(canonical_name("Дмитрий"), "дмитрий");
        assert!(!canonical_name("sk#1").contains('#'));
    }

    #[test]
    fn assertion_becomes_ground_fact() {
        let tree = ClauseTree::declarative("Man", &["John"]);
        match normalize(&tree, StatementKind::Fact).unwrap() {
            NormalizedStatement::Facts(facts) => assert_eq!(facts, vec![ground("man", &["john"])]),
            other => panic!("esperava Facts, obteve {:?}", other),
        }
    }

    /// A ordem dos argumentos é a ordem de superfície do parser.
    #[test]
    fn argument_order_is_preserved() {
        let tree = ClauseTree::declarative("likes", &["John", "Chocolate"]);
        match normalize(&tree, StatementKind::Fact).unwrap() {
            NormalizedStatement::Facts(facts) => {
                assert_eq!(facts[0], ground("likes", &["john", "chocolate"]))
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn negated_assertion_becomes_negative_fact() {
        let tree = ClauseTree::declarative("likes", &["John", "chocolate"]).negate();
        match normalize(&tree, StatementKind::Fact).unwrap() {
            NormalizedStatement::NegativeFact(g) => assert_eq!(g, ground("likes", &["john", "chocolate"])),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn conditional_and_every_yield_the_same_rule() {
        let cond = ClauseTree::declarative("person", &["X"])
            .quantified("X", QuantifierKind::Universal)
            .when(vec![ClauseTree::declarative("man", &["X"])]);
        let every = ClauseTree::declarative("person", &["X"])
            .quantified("X", QuantifierKind::Universal)
            .every(vec![ClauseTree::declarative("man", &["X"])]);
        let render = |t: &ClauseTree| match normalize(t, StatementKind::Rule).unwrap() {
            NormalizedStatement::Rule(r) => r.to_string(),
            other => panic!("{:?}", other),
        };
        assert_eq!(render(&cond), "person(X) :- man(X).");
        assert_eq!(render(&every), render(&cond));
    }

    #[test]
    fn negated_condition_becomes_negated_literal() {
        let tree = ClauseTree::declarative("happy", &["X"])
            .quantified("X", QuantifierKind::Universal)
            .when(vec![
                ClauseTree::declarative("person", &["X"]),
                ClauseTree::declarative("sad", &["X"]).negate(),
            ]);
        match normalize(&tree, StatementKind::Rule).unwrap() {
            NormalizedStatement::Rule(r) => {
                assert!(r.has_negation());
                assert_eq!(r.to_string(), "happy(X) :- person(X), not sad(X).");
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn existential_head_variable_becomes_rule_existential() {
        // "Every person has a parent": parent(Y, X) :- person(X), Y existencial.
        let tree = ClauseTree::declarative("parent", &["Y", "X"])
            .quantified("X", QuantifierKind::Universal)
            .quantified("Y", QuantifierKind::Existential)
            .every(vec![ClauseTree::declarative("person", &["X"])]);
        match normalize(&tree, StatementKind::Rule).unwrap() {
            NormalizedStatement::Rule(r) => {
                assert_eq!(r.existentials, vec![Variable::new("Y")]);
                assert!(r.check_range_restriction().is_ok());
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn existential_fact_is_skolemized_with_restriction() {
        let tree = ClauseTree::declarative("likes", &["X", "chocolate"])
            .quantified("X", QuantifierKind::Existential)
            .some(vec![ClauseTree::declarative("person", &["X"])]);
        match normalize(&tree, StatementKind::Fact).unwrap() {
            NormalizedStatement::Facts(facts) => {
                assert_eq!(facts.len(), 2);
                assert_eq!(facts[0], ground("likes", &["sk#1", "chocolate"]));
                assert_eq!(facts[1], ground("person", &["sk#1"]));
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn rejected_statement_does_not_consume_skolems() {
        let mut minted = 0;
        let tree = ClauseTree::declarative("likes", &["X", "Y"])
            .quantified("X", QuantifierKind::Existential)
            .quantified("Y", QuantifierKind::Universal)
            .some(vec![ClauseTree::declarative("person", &["X"])]);
        let result = TermNormalizer::new().normalize(&tree, StatementKind::Fact, || {
            minted += 1;
            Constant::skolem(minted)
        });
        assert!(matches!(result, Err(CalcError::Classification { .. })));
        assert_eq!(minted, 0);
    }

    /// Universal sem restrição é classificado como fato: variável livre.
    #[test]
    fn unrestricted_universal_fact_is_rejected() {
        let tree = ClauseTree::declarative("mortal", &["X"]).quantified("X", QuantifierKind::Universal);
        assert!(matches!(
            normalize(&tree, StatementKind::Fact),
            Err(CalcError::Classification { .. })
        ));
    }

    #[test]
    fn question_keeps_variables_and_anonymous() {
        let tree = ClauseTree::interrogative("income", &["John", "_"]);
        match normalize(&tree, StatementKind::Query).unwrap() {
            NormalizedStatement::Query(atom) => {
                assert!(atom.has_anonymous());
                assert!(atom.variables().is_empty());
            }
            other => panic!("{:?}", other),
        }
        let who = ClauseTree::interrogative("person", &["X"]).quantified("X", QuantifierKind::None);
        match normalize(&who, StatementKind::Query).unwrap() {
            NormalizedStatement::Query(atom) => assert_eq!(atom.to_string(), "person(X)"),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn anonymous_outside_query_and_negated_question_are_rejected() {
        let fact = ClauseTree::declarative("likes", &["john", "_"]);
        let question = ClauseTree::interrogative("likes", &["john", "chocolate"]).negate();
        assert!(normalize(&fact, StatementKind::Fact).is_err());
        assert!(normalize(&question, StatementKind::Query).is_err());
    }

    #[test]
    fn nested_conditions_are_rejected() {
        let inner = ClauseTree::declarative("man", &["X"]).when(vec![ClauseTree::declarative("male", &["X"])]);
        let tree = ClauseTree::declarative("person", &["X"])
            .quantified("X", QuantifierKind::Universal)
            .when(vec![inner]);
        assert!(normalize(&tree, StatementKind::Rule).is_err());
    }

    #[test]
    fn predicate_must_start_with_letter() {
        let tree = ClauseTree::declarative("3d", &["john"]);
        assert!(normalize(&tree, StatementKind::Fact).is_err());
    }

    #[test]
    fn renormalizing_is_deterministic() {
        let tree = ClauseTree::declarative("Lives In", &["John Smith", "Berlin"]);
        let a = format!("{:?}", normalize(&tree, StatementKind::Fact).unwrap());
        let b = format!("{:?}", normalize(&tree, StatementKind::Fact).unwrap());
        assert_eq!(a, b);
        assert!(a.contains("lives_in"));
        assert!(a.contains("john_smith"));
    }
}

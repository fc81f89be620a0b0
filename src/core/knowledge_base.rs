//! # KnowledgeBase — Contêiner Central de Conhecimento
//!
//! A [`KnowledgeBase`] é o **coração** da calculadora: armazena fatos,
//! fatos negativos e regras em memória, com índices para busca rápida.
//!
//! ## Armazenamento
//!
//! - **Fatos**: `Vec<Fact>` — a ordem de inserção é significativa (ordena as
//!   respostas de consultas "quem/o quê")
//! - **Fatos negativos**: `Vec<Fact>` separado — negações afirmadas
//!   explicitamente ("John does not like chocolate")
//! - **Regras**: `Vec<Rule>` em ordem de registro (iteração reprodutível)
//! - **Índices**: `HashMap<GroundAtom, usize>` para deduplicação e
//!   `HashMap<Signature, Vec<usize>>` para varredura por predicado
//!
//! Os índices são `#[serde(skip)]` e devem ser reconstruídos via
//! [`rebuild_index()`](KnowledgeBase::rebuild_index) após desserialização.
//!
//! ## Escopos
//!
//! | Tag | Origem | Removido por |
//! |-----|--------|--------------|
//! | `Base` | projeto persistido | `reset(All)` |
//! | `Session(id)` | interação atual da calculadora | `reset(Session)`, `reset(All)` |
//! | derivado | motor de inferência | `reset(Session)`, `reset(All)` |
//!
//! Fatos derivados são sempre descartados no reset de sessão — o motor os
//! recalcula sob demanda antes da próxima consulta.
//!
//! ## Disciplina de Escrita
//!
//! A KB não faz lock algum. Quem a embute garante que mutações
//! (`add_fact`/`add_rule`/`reset`) nunca se intercalam com uma inferência em
//! andamento.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use logic_calculator::core::{Constant, GroundAtom, KnowledgeBase, Provenance, SessionTag};
//!
//! let mut kb = KnowledgeBase::new();
//! let fact = GroundAtom::new("man", vec![Constant::new("john")]);
//!
//! assert!(kb.add_fact(fact.clone(), Provenance::asserted(None, SessionTag::Base)));
//! // Idempotente: a segunda inserção não altera nada
//! assert!(!kb.add_fact(fact, Provenance::asserted(None, SessionTag::Base)));
//! assert_eq!(kb.fact_count(), 1);
//! ```

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::Result;
use super::rule::{Rule, RuleId};
use super::term::{Constant, GroundAtom, Signature};

/// Identificador da sentença que originou um fato ou regra.
pub type StatementId = Uuid;

/// Identificador de uma sessão da calculadora.
pub type SessionId = Uuid;

/// Escopo de uma asserção.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "lowercase")]
pub enum SessionTag {
    /// Conhecimento base do projeto (sobrevive ao reset de sessão).
    Base,
    /// Conhecimento da interação atual.
    Session(SessionId),
}

/// De onde veio um fato ou regra.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "lowercase")]
pub enum Origin {
    Asserted {
        statement: Option<StatementId>,
        session: SessionTag,
    },
    Derived {
        rule: RuleId,
        iteration: usize,
    },
}

/// Proveniência: origem + instante do registro.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub origin: Origin,
    pub recorded_at: DateTime<Utc>,
}

impl Provenance {
    pub fn asserted(statement: Option<StatementId>, session: SessionTag) -> Self {
        Self {
            origin: Origin::Asserted { statement, session },
            recorded_at: Utc::now(),
        }
    }

    pub fn derived(rule: RuleId, iteration: usize) -> Self {
        Self {
            origin: Origin::Derived { rule, iteration },
            recorded_at: Utc::now(),
        }
    }

    /// Tag de sessão de uma asserção; `None` para fatos derivados.
    pub fn session(&self) -> Option<SessionTag> {
        match self.origin {
            Origin::Asserted { session, .. } => Some(session),
            Origin::Derived { .. } => None,
        }
    }

    pub fn is_derived(&self) -> bool {
        matches!(self.origin, Origin::Derived { .. })
    }
}

impl Default for Provenance {
    fn default() -> Self {
        Self::asserted(None, SessionTag::Base)
    }
}

/// Fato ground com proveniência. Igualdade estrutural considera só o átomo.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Fact {
    pub atom: GroundAtom,
    pub provenance: Provenance,
}

/// Escopo de um reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetScope {
    Session,
    All,
}

/// Base de conhecimento in-memory — fatos, fatos negativos e regras.
///
/// Uma instância por sessão/projeto, passada por referência ao motor de
/// inferência e ao resolvedor de consultas. Não existe KB global.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KnowledgeBase {
    /// Fatos positivos em ordem de inserção.
    facts: Vec<Fact>,

    /// Fatos negativos afirmados explicitamente.
    negative_facts: Vec<Fact>,

    /// Regras em ordem de registro.
    rules: Vec<Rule>,

    /// Sessão corrente da calculadora.
    current_session: SessionId,

    /// Próximo índice Skolem. Nunca volta atrás, nem em `reset(All)`.
    skolem_counter: u64,

    /// Índice átomo → posição em `facts`. **Não serializado.**
    #[serde(skip, default)]
    fact_index: HashMap<GroundAtom, usize>,

    /// Índice assinatura → posições em `facts`, em ordem de inserção.
    #[serde(skip, default)]
    by_signature: HashMap<Signature, Vec<usize>>,

    /// Conjunto dos fatos negativos para consulta O(1).
    #[serde(skip, default)]
    negative_index: HashSet<GroundAtom>,

    /// `true` quando o último run do motor alcançou o ponto fixo e nada mudou desde então.
    #[serde(skip, default)]
    saturated: bool,
}

impl KnowledgeBase {
    /// Cria uma KB vazia com uma sessão nova.
    pub fn new() -> Self {
        Self {
            facts: Vec::new(),
            negative_facts: Vec::new(),
            rules: Vec::new(),
            current_session: Uuid::new_v4(),
            skolem_counter: 0,
            fact_index: HashMap::new(),
            by_signature: HashMap::new(),
            negative_index: HashSet::new(),
            saturated: false,
        }
    }

    /// Reconstrói os índices a partir dos vetores.
    ///
    /// **Deve ser chamado após desserialização**, porque os índices são
    /// `#[serde(skip)]` e estarão vazios após `load_kb()`.
    pub fn rebuild_index(&mut self) {
        self.fact_index.clear();
        self.by_signature.clear();
        for (pos, fact) in self.facts.iter().enumerate() {
            self.fact_index.insert(fact.atom.clone(), pos);
            self.by_signature
                .entry(fact.atom.signature())
                .or_default()
                .push(pos);
        }
        self.negative_index = self
            .negative_facts
            .iter()
            .map(|f| f.atom.clone())
            .collect();
        self.saturated = false;
    }

    /// Tag da sessão corrente.
    pub fn current_session(&self) -> SessionTag {
        SessionTag::Session(self.current_session)
    }

    /// Inicia uma sessão nova. Asserções da sessão anterior passam a ser
    /// intocáveis por `reset(Session)`.
    pub fn start_session(&mut self) -> SessionId {
        self.current_session = Uuid::new_v4();
        tracing::debug!(session = %self.current_session, "KB: nova sessão");
        self.current_session
    }

    /// Adiciona um fato positivo. Retorna `true` somente se ele era novo.
    ///
    /// Idempotente: o motor de inferência usa o retorno para detectar o
    /// ponto fixo.
    pub fn add_fact(&mut self, atom: GroundAtom, provenance: Provenance) -> bool {
        if self.fact_index.contains_key(&atom) {
            return false;
        }
        let pos = self.facts.len();
        tracing::debug!(fact = %atom, derived = provenance.is_derived(), "KB: fato armazenado");
        self.fact_index.insert(atom.clone(), pos);
        self.by_signature
            .entry(atom.signature())
            .or_default()
            .push(pos);
        if !provenance.is_derived() {
            self.saturated = false;
        }
        self.facts.push(Fact { atom, provenance });
        true
    }

    /// Adiciona um fato negativo. Mesmo contrato de idempotência de [`add_fact`](Self::add_fact).
    pub fn add_negative_fact(&mut self, atom: GroundAtom, provenance: Provenance) -> bool {
        if !self.negative_index.insert(atom.clone()) {
            return false;
        }
        tracing::debug!(fact = %atom, "KB: fato negativo armazenado");
        self.negative_facts.push(Fact { atom, provenance });
        true
    }

    /// Registra uma regra após validar a restrição de alcance.
    ///
    /// # Erros
    ///
    /// [`CalcError::RangeRestriction`](super::error::CalcError::RangeRestriction)
    /// — a KB não é alterada e as demais regras seguem intactas.
    pub fn add_rule(&mut self, mut rule: Rule, provenance: Provenance) -> Result<RuleId> {
        rule.check_range_restriction()?;
        rule.provenance = provenance;
        let id = rule.id;
        tracing::debug!(id = %id, rule = %rule, "KB: regra registrada");
        self.rules.push(rule);
        self.saturated = false;
        Ok(id)
    }

    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    pub fn negative_facts(&self) -> &[Fact] {
        &self.negative_facts
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn contains_fact(&self, atom: &GroundAtom) -> bool {
        self.fact_index.contains_key(atom)
    }

    pub fn contains_negative(&self, atom: &GroundAtom) -> bool {
        self.negative_index.contains(atom)
    }

    /// Fatos com a assinatura dada, em ordem de inserção.
    pub fn facts_with_signature<'a>(
        &'a self,
        signature: &Signature,
    ) -> impl Iterator<Item = &'a Fact> + 'a {
        self.by_signature
            .get(signature)
            .map(|positions| positions.as_slice())
            .unwrap_or_default()
            .iter()
            .map(move |&pos| &self.facts[pos])
    }

    /// Aridades conhecidas para um nome de predicado, em ordem crescente.
    ///
    /// Considera fatos, fatos negativos e todos os átomos das regras
    /// (cabeça e corpo).
    pub fn known_arities(&self, predicate: &str) -> Vec<usize> {
        let mut arities: Vec<usize> = self
            .by_signature
            .keys()
            .filter(|s| s.name == predicate)
            .map(|s| s.arity)
            .chain(
                self.negative_facts
                    .iter()
                    .filter(|f| f.atom.predicate == predicate)
                    .map(|f| f.atom.arity()),
            )
            .chain(self.rules.iter().flat_map(|r| {
                std::iter::once(&r.head)
                    .chain(r.body.iter().map(|l| &l.atom))
                    .filter(|a| a.predicate == predicate)
                    .map(|a| a.arity())
            }))
            .collect();
        arities.sort_unstable();
        arities.dedup();
        arities
    }

    /// Gera uma constante Skolem nunca usada antes.
    pub fn fresh_skolem(&mut self) -> Constant {
        self.skolem_counter += 1;
        Constant::skolem(self.skolem_counter)
    }

    pub fn skolem_counter(&self) -> u64 {
        self.skolem_counter
    }

    /// Avança o contador após o motor cunhar Skolems numa iteração confirmada.
    pub(crate) fn advance_skolem_counter(&mut self, to: u64) {
        self.skolem_counter = self.skolem_counter.max(to);
    }

    pub fn is_saturated(&self) -> bool {
        self.saturated
    }

    pub(crate) fn mark_saturated(&mut self) {
        self.saturated = true;
    }

    /// Remove o conteúdo de um escopo.
    ///
    /// - `Session`: asserções da sessão corrente + todos os fatos derivados
    /// - `All`: tudo (o contador Skolem é preservado)
    pub fn reset(&mut self, scope: ResetScope) {
        match scope {
            ResetScope::All => self.clear(),
            ResetScope::Session => {
                let session = self.current_session();
                let keep = |p: &Provenance| p.session().is_some_and(|s| s != session);
                let before = (self.facts.len(), self.negative_facts.len(), self.rules.len());
                self.facts.retain(|f| keep(&f.provenance));
                self.negative_facts.retain(|f| keep(&f.provenance));
                self.rules.retain(|r| keep(&r.provenance));
                self.rebuild_index();
                tracing::info!(
                    facts = before.0 - self.facts.len(),
                    negative = before.1 - self.negative_facts.len(),
                    rules = before.2 - self.rules.len(),
                    "KB: sessão revertida"
                );
            }
        }
    }

    /// Limpa toda a KB — fatos, fatos negativos, regras e índices.
    pub fn clear(&mut self) {
        self.facts.clear();
        self.negative_facts.clear();
        self.rules.clear();
        self.fact_index.clear();
        self.by_signature.clear();
        self.negative_index.clear();
        self.saturated = false;
        tracing::info!("KB: limpa");
    }

    /// Cópia apenas com o conhecimento base do projeto.
    ///
    /// Usada pela persistência: asserções de sessão e fatos derivados não
    /// vão para disco. O contador Skolem acompanha a cópia.
    pub fn project_snapshot(&self) -> KnowledgeBase {
        let is_base = |p: &Provenance| p.session() == Some(SessionTag::Base);
        let mut snapshot = KnowledgeBase {
            facts: self
                .facts
                .iter()
                .filter(|f| is_base(&f.provenance))
                .cloned()
                .collect(),
            negative_facts: self
                .negative_facts
                .iter()
                .filter(|f| is_base(&f.provenance))
                .cloned()
                .collect(),
            rules: self
                .rules
                .iter()
                .filter(|r| is_base(&r.provenance))
                .cloned()
                .collect(),
            current_session: self.current_session,
            skolem_counter: self.skolem_counter,
            ..KnowledgeBase::new()
        };
        snapshot.rebuild_index();
        snapshot
    }

    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    pub fn negative_fact_count(&self) -> usize {
        self.negative_facts.len()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn derived_count(&self) -> usize {
        self.facts
            .iter()
            .filter(|f| f.provenance.is_derived())
            .count()
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rule::Literal;
    use crate::core::term::{ground, Atom, Term};

    fn base() -> Provenance {
        Provenance::asserted(None, SessionTag::Base)
    }

    #[test]
    fn add_fact_is_idempotent() {
        let mut kb = KnowledgeBase::new();
        assert!(kb.add_fact(ground("man", &["john"]), base()));
        assert!(!kb.add_fact(ground("man", &["john"]), base()));
        assert_eq!(kb.fact_count(), 1);
        assert!(kb.contains_fact(&ground("man", &["john"])));
    }

    #[test]
    fn negative_facts_live_in_a_separate_store() {
        let mut kb = KnowledgeBase::new();
        let atom = ground("likes", &["john", "chocolate"]);
        assert!(kb.add_negative_fact(atom.clone(), base()));
        assert!(!kb.add_negative_fact(atom.clone(), base()));
        assert!(kb.contains_negative(&atom));
        assert!(!kb.contains_fact(&atom));
        assert_eq!(kb.negative_fact_count(), 1);
    }

    #[test]
    fn rejected_rule_leaves_kb_untouched() {
        let mut kb = KnowledgeBase::new();
        let bad = Rule::new(
            Atom::new("happy", vec![Term::variable("X")]),
            vec![Literal::positive(Atom::new("sunny", vec![Term::constant("today")]))],
        );
        assert!(kb.add_rule(bad, base()).is_err());
        assert_eq!(kb.rule_count(), 0);
    }

    #[test]
    fn facts_with_signature_keep_insertion_order() {
        let mut kb = KnowledgeBase::new();
        kb.add_fact(ground("person", &["mary"]), base());
        kb.add_fact(ground("man", &["john"]), base());
        kb.add_fact(ground("person", &["john"]), base());
        let names: Vec<&str> = kb
            .facts_with_signature(&ground("person", &["x"]).signature())
            .map(|f| f.atom.args[0].as_str())
            .collect();
        assert_eq!(names, vec!["mary", "john"]);
    }

    /// Reset de sessão preserva o conhecimento base e descarta derivados.
    #[test]
    fn reset_session_keeps_base_knowledge() {
        let mut kb = KnowledgeBase::new();
        let session = kb.current_session();
        kb.add_fact(ground("man", &["john"]), base());
        kb.add_fact(ground("man", &["bob"]), Provenance::asserted(None, session));
        kb.add_negative_fact(ground("tall", &["bob"]), Provenance::asserted(None, session));
        kb.add_fact(ground("person", &["john"]), Provenance::derived(Uuid::new_v4(), 1));

        kb.reset(ResetScope::Session);

        assert_eq!(kb.fact_count(), 1);
        assert!(kb.contains_fact(&ground("man", &["john"])));
        assert!(!kb.contains_fact(&ground("man", &["bob"])));
        assert!(!kb.contains_negative(&ground("tall", &["bob"])));
        // Índices reconstruídos continuam consistentes
        assert!(kb.add_fact(ground("man", &["bob"]), base()));
    }

    #[test]
    fn reset_all_clears_everything_but_skolem_counter() {
        let mut kb = KnowledgeBase::new();
        kb.add_fact(ground("man", &["john"]), base());
        let first = kb.fresh_skolem();
        kb.reset(ResetScope::All);
        assert_eq!(kb.fact_count(), 0);
        let second = kb.fresh_skolem();
        assert_ne!(first, second);
    }

    #[test]
    fn known_arities_cover_rules_and_negatives() {
        let mut kb = KnowledgeBase::new();
        kb.add_fact(ground("likes", &["john", "chocolate"]), base());
        kb.add_negative_fact(ground("likes", &["a", "b", "c"]), base());
        let rule = Rule::new(
            Atom::new("happy", vec![Term::variable("X")]),
            vec![Literal::positive(Atom::new(
                "likes",
                vec![Term::variable("X"), Term::constant("music")],
            ))],
        );
        kb.add_rule(rule, base()).unwrap();
        assert_eq!(kb.known_arities("likes"), vec![2, 3]);
        assert_eq!(kb.known_arities("happy"), vec![1]);
        assert!(kb.known_arities("sad").is_empty());
    }

    #[test]
    fn snapshot_keeps_only_base_and_survives_serde() {
        let mut kb = KnowledgeBase::new();
        let session = kb.current_session();
        kb.add_fact(ground("man", &["john"]), base());
        kb.add_fact(ground("man", &["bob"]), Provenance::asserted(None, session));
        kb.fresh_skolem();

        let json = serde_json::to_string(&kb.project_snapshot()).unwrap();
        let mut loaded: KnowledgeBase = serde_json::from_str(&json).unwrap();
        loaded.rebuild_index();

        assert_eq!(loaded.fact_count(), 1);
        assert!(loaded.contains_fact(&ground("man", &["john"])));
        assert_eq!(loaded.skolem_counter(), 1);
    }
}

//! # Orquestrador — A Calculadora Lógica
//!
//! O [`Orchestrator`] é a fachada que a camada de apresentação (HTTP, CLI)
//! usa. Ele possui **uma** [`KnowledgeBase`] e coordena classificação,
//! normalização, inferência e resposta de consultas.
//!
//! ## Ciclo de uma Sentença
//!
//! ```text
//! ClauseTree (do parser)
//!   │
//!   ├── 1. StatementClassifier → Fact | Rule | Query
//!   ├── 2. TermNormalizer      → fatos ground | fato negativo | regra | consulta
//!   │       (Skolems cunhados só depois da validação)
//!   ├── 3. Registro na KB      → fato(s), fato negativo ou regra
//!   │       (tudo ou nada: nenhuma inserção parcial)
//!   └── 4. Consultas           → QueryResolver (satura a KB e responde)
//! ```
//!
//! ## Modo Lote
//!
//! [`Orchestrator::process_batch`] reproduz o "modo programação": registra
//! todos os fatos e regras do texto, roda a inferência **uma vez** e só então
//! responde as perguntas, na ordem em que aparecem. Erros locais ficam
//! anotados na entrada da sentença e o lote segue.
//!
//! ## Cancelamento
//!
//! A [`CancelFlag`] é compartilhável entre threads. Cada `query` e `saturate`
//! abre um [`RunGuard`](crate::inference::RunGuard): um cancelamento vale para
//! a execução em andamento e morre com ela, observado ou não pelo motor.
//! [`CancelFlag::cancel`] feito antes de uma chamada vale para essa chamada.

use serde::Serialize;
use uuid::Uuid;

use crate::core::{
    CalcError, KnowledgeBase, Provenance, ResetScope, Result, RuleId, SessionTag, StatementId,
};
use crate::inference::{CancelFlag, InferenceEngine, InferenceReport};
use crate::nlu::ParsedSentence;
use crate::query::{Answer, QueryResolver};
use crate::statement::{
    ClauseTree, NormalizedStatement, StatementClassifier, StatementKind, TermNormalizer,
};

/// O que aconteceu com uma sentença registrada.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Interpretation {
    /// Fato(s) positivo(s); `added` lista apenas os que eram novos.
    Facts {
        statement: StatementId,
        added: Vec<String>,
        duplicates: usize,
    },
    NegativeFact {
        statement: StatementId,
        fact: String,
        added: bool,
    },
    Rule { id: RuleId, rule: String },
    /// Pergunta reconhecida; `interpret` não a responde.
    Query { query: String },
}

/// Resultado de uma sentença dentro de um lote.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Registered { interpretation: Interpretation },
    Answered { answer: Answer },
    Failed { error: CalcError },
}

/// Entrada do relatório de lote, na ordem do texto.
#[derive(Clone, Debug, Serialize)]
pub struct BatchEntry {
    pub line: usize,
    pub fragment: String,
    pub outcome: Outcome,
}

/// Relatório de [`Orchestrator::process_batch`].
#[derive(Clone, Debug, Default, Serialize)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
    /// Resumo da inferência quando ela chegou ao ponto fixo.
    pub inference: Option<InferenceReport>,
    /// Falha da inferência única do lote (cancelamento, limite).
    pub inference_error: Option<CalcError>,
}

impl BatchReport {
    /// Quantidade de entradas que falharam.
    pub fn failures(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, Outcome::Failed { .. }))
            .count()
    }

    /// Respostas das perguntas, na ordem do texto.
    pub fn answers(&self) -> Vec<&Answer> {
        self.entries
            .iter()
            .filter_map(|e| match &e.outcome {
                Outcome::Answered { answer } => Some(answer),
                _ => None,
            })
            .collect()
    }
}

/// Conteúdo da KB renderizado como texto.
#[derive(Clone, Debug, Default, Serialize)]
pub struct KnowledgeView {
    pub facts: Vec<String>,
    pub derived: Vec<String>,
    pub negative_facts: Vec<String>,
    pub rules: Vec<String>,
}

/// Contadores para `/status` e logs.
#[derive(Clone, Debug, Serialize)]
pub struct StatusView {
    pub session: SessionTag,
    pub facts: usize,
    pub derived: usize,
    pub negative_facts: usize,
    pub rules: usize,
    pub skolem_counter: u64,
    pub saturated: bool,
    pub max_iterations: usize,
}

/// Fachada da calculadora lógica.
pub struct Orchestrator {
    kb: KnowledgeBase,
    classifier: StatementClassifier,
    normalizer: TermNormalizer,
    resolver: QueryResolver,
    cancel: CancelFlag,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(KnowledgeBase::new(), InferenceEngine::default())
    }
}

impl Orchestrator {
    /// Cria um orquestrador sobre uma KB existente (vazia ou carregada do disco).
    pub fn new(kb: KnowledgeBase, engine: InferenceEngine) -> Self {
        Self {
            kb,
            classifier: StatementClassifier::new(),
            normalizer: TermNormalizer::new(),
            resolver: QueryResolver::new(engine),
            cancel: CancelFlag::new(),
        }
    }

    pub fn kb(&self) -> &KnowledgeBase {
        &self.kb
    }

    /// Flag compartilhável para cancelar a inferência de outra thread.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Registra uma sentença na sessão corrente.
    pub fn interpret(&mut self, tree: &ClauseTree) -> Result<Interpretation> {
        let tag = self.kb.current_session();
        self.interpret_as(tree, tag)
    }

    /// Registra uma sentença com uma tag explícita (`Base` para o projeto).
    ///
    /// # Erros
    ///
    /// [`CalcError::Classification`] ou [`CalcError::RangeRestriction`];
    /// em ambos os casos a KB não é alterada.
    pub fn interpret_as(&mut self, tree: &ClauseTree, tag: SessionTag) -> Result<Interpretation> {
        let kind = self.classifier.classify(tree)?;
        let kb = &mut self.kb;
        let normalized = self
            .normalizer
            .normalize(tree, kind, || kb.fresh_skolem())?;

        let statement = Uuid::new_v4();
        let provenance = Provenance::asserted(Some(statement), tag);
        let interpretation = match normalized {
            NormalizedStatement::Facts(atoms) => {
                let mut added = Vec::new();
                let mut duplicates = 0;
                for atom in atoms {
                    let rendered = atom.to_string();
                    if self.kb.add_fact(atom, provenance.clone()) {
                        added.push(rendered);
                    } else {
                        duplicates += 1;
                    }
                }
                Interpretation::Facts {
                    statement,
                    added,
                    duplicates,
                }
            }
            NormalizedStatement::NegativeFact(atom) => {
                let fact = atom.to_string();
                let added = self.kb.add_negative_fact(atom, provenance);
                Interpretation::NegativeFact {
                    statement,
                    fact,
                    added,
                }
            }
            NormalizedStatement::Rule(rule) => {
                let rendered = rule.to_string();
                let id = self.kb.add_rule(rule, provenance)?;
                Interpretation::Rule { id, rule: rendered }
            }
            NormalizedStatement::Query(atom) => Interpretation::Query {
                query: atom.to_string(),
            },
        };
        tracing::info!(kind = ?kind, fragment = %tree.fragment(), "Sentença interpretada");
        Ok(interpretation)
    }

    /// Responde uma pergunta contra o fecho da KB.
    ///
    /// # Erros
    ///
    /// [`CalcError::Classification`] se a árvore não for uma pergunta,
    /// [`CalcError::QueryMalformed`], [`CalcError::InferenceCancelled`] ou
    /// [`CalcError::InferenceLimitExceeded`].
    pub fn query(&mut self, tree: &ClauseTree) -> Result<Answer> {
        let kind = self.classifier.classify(tree)?;
        if kind != StatementKind::Query {
            return Err(CalcError::classification(tree.fragment(), "a sentença não é uma pergunta"));
        }
        let kb = &mut self.kb;
        let NormalizedStatement::Query(atom) =
            self.normalizer.normalize(tree, kind, || kb.fresh_skolem())?
        else {
            return Err(CalcError::classification(tree.fragment(), "a sentença não é uma pergunta"));
        };
        let _run = self.cancel.begin_run();
        let result = self.resolver.resolve(&mut self.kb, &atom, &self.cancel);
        log_cancelled(&result);
        result
    }

    /// Roda a inferência até o ponto fixo sem responder nada.
    pub fn saturate(&mut self) -> Result<InferenceReport> {
        let _run = self.cancel.begin_run();
        let result = self.resolver.engine().run(&mut self.kb, &self.cancel);
        log_cancelled(&result);
        result
    }

    /// Desfaz a sessão corrente ou limpa tudo.
    pub fn reset(&mut self, scope: ResetScope) {
        self.kb.reset(scope);
        tracing::info!(scope = ?scope, "Reset executado");
    }

    /// Modo programação: registra tudo, infere uma vez, responde em ordem.
    pub fn process_batch(
        &mut self,
        sentences: Vec<ParsedSentence>,
        tag: SessionTag,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        let mut slots: Vec<(usize, String, Option<Outcome>)> = Vec::new();
        let mut queries: Vec<(usize, ClauseTree)> = Vec::new();

        for sentence in sentences {
            let outcome = match sentence.clause {
                Err(error) => Some(Outcome::Failed { error }),
                Ok(tree) => match self.classifier.classify(&tree) {
                    Err(error) => Some(Outcome::Failed { error }),
                    Ok(StatementKind::Query) => {
                        queries.push((slots.len(), tree));
                        None
                    }
                    Ok(_) => Some(match self.interpret_as(&tree, tag) {
                        Ok(interpretation) => Outcome::Registered { interpretation },
                        Err(error) => Outcome::Failed { error },
                    }),
                },
            };
            slots.push((sentence.line, sentence.source, outcome));
        }

        match self.saturate() {
            Ok(inference) => report.inference = Some(inference),
            Err(error) => report.inference_error = Some(error),
        }

        for (index, tree) in queries {
            let outcome = match &report.inference_error {
                Some(error @ CalcError::InferenceCancelled { .. }) => Outcome::Failed {
                    error: error.clone(),
                },
                _ => match self.query(&tree) {
                    Ok(answer) => Outcome::Answered { answer },
                    Err(error) => Outcome::Failed { error },
                },
            };
            slots[index].2 = Some(outcome);
        }

        report.entries = slots
            .into_iter()
            .filter_map(|(line, fragment, outcome)| {
                outcome.map(|outcome| BatchEntry {
                    line,
                    fragment,
                    outcome,
                })
            })
            .collect();

        tracing::info!(
            entries = report.entries.len(),
            failures = report.failures(),
            facts = self.kb.fact_count(),
            rules = self.kb.rule_count(),
            "Lote processado"
        );
        report
    }

    /// Fatos, fatos negativos e regras como texto.
    pub fn knowledge(&self) -> KnowledgeView {
        let mut view = KnowledgeView::default();
        for fact in self.kb.facts() {
            if fact.provenance.is_derived() {
                view.derived.push(fact.atom.to_string());
            } else {
                view.facts.push(fact.atom.to_string());
            }
        }
        view.negative_facts = self
            .kb
            .negative_facts()
            .iter()
            .map(|f| format!("not {}", f.atom))
            .collect();
        view.rules = self.kb.rules().iter().map(|r| r.to_string()).collect();
        view
    }

    pub fn status(&self) -> StatusView {
        StatusView {
            session: self.kb.current_session(),
            facts: self.kb.fact_count(),
            derived: self.kb.derived_count(),
            negative_facts: self.kb.negative_fact_count(),
            rules: self.kb.rule_count(),
            skolem_counter: self.kb.skolem_counter(),
            saturated: self.kb.is_saturated(),
            max_iterations: self.resolver.engine().max_iterations(),
        }
    }
}

fn log_cancelled<T>(result: &Result<T>) {
    if let Err(CalcError::InferenceCancelled { completed }) = result {
        tracing::warn!(completed, "Inferência cancelada");
    }
}

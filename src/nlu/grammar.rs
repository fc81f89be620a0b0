//! # Gramática da Linguagem Controlada — Regex → ClauseTree
//!
//! O [`PatternParser`] reconhece um subconjunto controlado de inglês e
//! produz a [`ClauseTree`] que o núcleo espera do parser externo. Os padrões
//! são verificados em **ordem de prioridade**; o primeiro que casa vence.
//!
//! ## Cláusulas Atômicas
//!
//! | Padrão | Exemplo | Átomo |
//! |--------|---------|-------|
//! | S is not (a) P | "John is not happy" | ¬`happy(john)` |
//! | S is a/the P of O | "Tom is a parent of John" | `parent(tom, john)` |
//! | S is eligible for B | "Hans is eligible for Kindergeld" | `eligible(hans, kindergeld)` |
//! | S qualifies for B | "Hans qualifies for Wohngeld" | `eligible(hans, wohngeld)` |
//! | S is employed/retired/… | "Hans is employed" | `employment_status(hans, employed)` |
//! | S is married/single/… | "Hans is married" | `marital_status(hans, married)` |
//! | S is a/an P | "John is a man" | `man(john)` |
//! | S is P | "John is happy" | `happy(john)` |
//! | S earns N euros per T | "Hans earns 2500 euros per month" | `income(hans, 2500, month)` |
//! | S was born on D | "Hans was born on 1985-06-15" | `birth_date(hans, 1985_06_15)` |
//! | S lives in L | "Hans lives in Germany" | `residence(hans, germany)` |
//! | S has N children | "Hans has 2 children" | `children_count(hans, 2)` |
//! | S has C citizenship | "Hans has German citizenship" | `citizenship(hans, german)` |
//! | S has a/an P | "John has a parent" | `parent(G, john)`, G existencial |
//! | S has P V | "John has blue eyes" | `has_property(john, blue, eyes)` |
//! | S does not V O | "John does not like tea" | ¬`likes(john, tea)` |
//! | S Vs O | "John likes chocolate" | `likes(john, chocolate)` |
//!
//! ## Sentenças Compostas
//!
//! ```text
//! If C1 and C2 then H            → regra (conectivo "if")
//! H if C1 and C2 / H when C      → regra (conectivo "if")
//! Every N is …                   → regra (conectivo "every")
//! Every N that/who REL is …      → regra (conectivo "every")
//! Some N VP / A N VP             → fato existencial (conectivo "some")
//! ```
//!
//! Letras maiúsculas isoladas (`X`, `Y1`) são variáveis universais.
//! Comparações aritméticas ("more than 2 children") e disjunções ("or")
//! não são cláusulas Horn e falham com [`CalcError::Classification`].

use regex::{Captures, Regex};
use unicode_normalization::UnicodeNormalization;

use super::mood::detect_mood;
use super::ClauseParser;
use crate::core::{CalcError, Result};
use crate::statement::{ClauseTree, Mood, Quantifier, QuantifierKind};

/// Nome da variável consultada nas perguntas "quem/o quê".
const QUERY_VARIABLE: &str = "X";

/// Variável universal introduzida por "Every N …".
const UNIVERSAL_VARIABLE: &str = "X";

/// Artigos removidos do início de objetos.
const ARTICLES: &[&str] = &["a", "an", "the"];

/// Verbos que podem abrir o predicado de uma relativa "Every N that …".
const LINKING_VERBS: &[&str] = &["is", "has", "does", "was", "lives", "earns", "qualifies"];

/// Forma das cláusulas atômicas, na ordem de prioridade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shape {
    NotA,
    Not,
    RelationOf,
    EligibleFor,
    QualifiesFor,
    Employment,
    Marital,
    IsA,
    Is,
    Earns,
    BornOn,
    LivesIn,
    Comparison,
    Children,
    Citizenship,
    HasA,
    HasProperty,
    DoesNot,
    Verb,
}

const ATOMIC_PATTERNS: &[(Shape, &str)] = &[
    (Shape::NotA, r"(?i)^(.+?) is not (?:a|an) ([a-z][\w-]*)$"),
    (Shape::Not, r"(?i)^(.+?) is not ([a-z][\w-]*)$"),
    (Shape::RelationOf, r"(?i)^(.+?) is (?:a|an|the) ([a-z][\w-]*) of (.+)$"),
    (Shape::EligibleFor, r"(?i)^(.+?) is eligible for (.+)$"),
    (Shape::QualifiesFor, r"(?i)^(.+?) qualifies for (.+)$"),
    (Shape::Employment, r"(?i)^(.+?) is (employed|unemployed|self-employed|retired)$"),
    (Shape::Marital, r"(?i)^(.+?) is (married|single|divorced|widowed)$"),
    (Shape::IsA, r"(?i)^(.+?) is (?:a|an) ([a-z][\w\s-]*)$"),
    (Shape::Is, r"(?i)^(.+?) is ([a-z][\w-]*)$"),
    (Shape::Earns, r"(?i)^(.+?) earns (\d+(?:\.\d+)?) euros per (month|year)$"),
    (Shape::BornOn, r"(?i)^(.+?) was born on (\d{4}-\d{2}-\d{2})$"),
    (Shape::LivesIn, r"(?i)^(.+?) lives in (.+)$"),
    (
        Shape::Comparison,
        r"(?i)^(.+?) has (?:more than|fewer than|less than|at least|at most|exactly) \d+ \w+$",
    ),
    (Shape::Children, r"(?i)^(.+?) has (\d+) (?:child|children)$"),
    (Shape::Citizenship, r"(?i)^(.+?) has (german|eu|non-eu) citizenship$"),
    (Shape::HasA, r"(?i)^(.+?) has (?:a|an) ([a-z][\w-]*)$"),
    (Shape::HasProperty, r"(?i)^(.+?) has ([a-z][\w-]*) (\S+)$"),
    (Shape::DoesNot, r"(?i)^(.+?) does not ([a-z][\w-]*) (.+)$"),
    (Shape::Verb, r"(?i)^(.+?) ([a-z][\w-]*s) (.+)$"),
];

/// Forma das perguntas, na ordem de prioridade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Question {
    IsEligible,
    IsRelationOf,
    IsEmployment,
    IsMarital,
    IsNot,
    IsA,
    Is,
    DoesHaveChildren,
    DoesLiveIn,
    DoesNot,
    Does,
    WhoRelationOf,
    WhoEligible,
    WhoIsA,
    WhoIs,
    WhoLivesIn,
    WhoVerb,
    WhatBenefits,
    WhatDoes,
    WhichEligible,
    HowMuchIncome,
    HowMuch,
    WhereLives,
}

const QUESTION_PATTERNS: &[(Question, &str)] = &[
    (Question::IsEligible, r"(?i)^is (.+?) eligible for (.+)$"),
    (Question::IsRelationOf, r"(?i)^is (.+?) (?:a|an|the) ([a-z][\w-]*) of (.+)$"),
    (Question::IsEmployment, r"(?i)^is (.+?) (employed|unemployed|self-employed|retired)$"),
    (Question::IsMarital, r"(?i)^is (.+?) (married|single|divorced|widowed)$"),
    (Question::IsNot, r"(?i)^is (.+?) not (?:a |an )?([a-z][\w-]*)$"),
    (Question::IsA, r"(?i)^is (.+?) (?:a|an) ([a-z][\w\s-]*)$"),
    (Question::Is, r"(?i)^is (.+) ([a-z][\w-]*)$"),
    (Question::DoesHaveChildren, r"(?i)^does (.+?) have (\d+) (?:child|children)$"),
    (Question::DoesLiveIn, r"(?i)^does (.+?) live in (.+)$"),
    (Question::DoesNot, r"(?i)^does (.+?) not ([a-z][\w-]*) (.+)$"),
    (Question::Does, r"(?i)^does (\S+) ([a-z][\w-]*) (.+)$"),
    (Question::WhoRelationOf, r"(?i)^who is (?:a|an|the) ([a-z][\w-]*) of (.+)$"),
    (Question::WhoEligible, r"(?i)^who is eligible for (.+)$"),
    (Question::WhoIsA, r"(?i)^who is (?:a|an) ([a-z][\w\s-]*)$"),
    (Question::WhoIs, r"(?i)^who is ([a-z][\w-]*)$"),
    (Question::WhoLivesIn, r"(?i)^who lives in (.+)$"),
    (Question::WhoVerb, r"(?i)^who ([a-z][\w-]*s) (.+)$"),
    (Question::WhatBenefits, r"(?i)^what benefits does (.+?) qualify for$"),
    (Question::WhatDoes, r"(?i)^what does (.+?) ([a-z][\w-]*)$"),
    (Question::WhichEligible, r"(?i)^which (\w+) (?:are|is) eligible for (.+)$"),
    (Question::HowMuchIncome, r"(?i)^how much income does (.+?) earn$"),
    (Question::HowMuch, r"(?i)^how much (.+?) does (.+?) receive$"),
    (Question::WhereLives, r"(?i)^where does (.+?) live$"),
];

/// Conjugação na terceira pessoa do singular.
///
/// Garante que "likes" e "does not like" compartilhem o predicado `likes/2`.
///
/// ```rust
/// use logic_calculator::nlu::grammar::third_person;
///
/// assert_eq!(third_person("like"), "likes");
/// assert_eq!(third_person("watch"), "watches");
/// assert_eq!(third_person("carry"), "carries");
/// assert_eq!(third_person("have"), "has");
/// ```
pub fn third_person(verb: &str) -> String {
    let verb = verb.to_lowercase();
    match verb.as_str() {
        "be" => return "is".to_string(),
        "have" => return "has".to_string(),
        _ => {}
    }
    let ends_sibilant = ["s", "sh", "ch", "x", "z", "o"]
        .iter()
        .any(|suffix| verb.ends_with(suffix));
    if ends_sibilant {
        return format!("{}es", verb);
    }
    let mut chars = verb.chars().rev();
    if let (Some('y'), Some(before)) = (chars.next(), chars.next()) {
        if !"aeiou".contains(before) {
            return format!("{}ies", &verb[..verb.len() - 1]);
        }
    }
    format!("{}s", verb)
}

/// `X`, `Y`, `Z1` — letra maiúscula isolada, opcionalmente numerada.
fn is_variable_token(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase()) && chars.all(|c| c.is_ascii_digit())
}

fn strip_article(text: &str) -> &str {
    let text = text.trim();
    for article in ARTICLES {
        if let Some(rest) = text
            .strip_prefix(article)
            .and_then(|r| r.strip_prefix(' '))
        {
            return rest.trim();
        }
        let upper = format!("{}{}", article[..1].to_uppercase(), &article[1..]);
        if let Some(rest) = text.strip_prefix(&upper).and_then(|r| r.strip_prefix(' ')) {
            return rest.trim();
        }
    }
    text
}

/// Variáveis declaradas durante o parsing de uma sentença.
struct Scope {
    quantifiers: Vec<Quantifier>,
    generated: usize,
    /// Tipo dado a variáveis escritas pelo usuário (`X`, `Y`).
    user_kind: QuantifierKind,
}

impl Scope {
    fn new(user_kind: QuantifierKind) -> Self {
        Self {
            quantifiers: Vec::new(),
            generated: 0,
            user_kind,
        }
    }

    fn declare(&mut self, name: &str, kind: QuantifierKind) {
        if !self.quantifiers.iter().any(|q| q.variable == name) {
            self.quantifiers.push(Quantifier {
                variable: name.to_string(),
                kind,
            });
        }
    }

    fn is_declared(&self, name: &str) -> bool {
        self.quantifiers.iter().any(|q| q.variable == name)
    }

    /// Variável existencial gerada (`_G1`, `_G2`, …).
    fn fresh_existential(&mut self) -> String {
        self.generated += 1;
        let name = format!("_G{}", self.generated);
        self.declare(&name, QuantifierKind::Existential);
        name
    }

    /// Texto de um argumento: sem artigo, variáveis registradas.
    fn arg(&mut self, raw: &str) -> String {
        let text = strip_article(raw);
        if !self.is_declared(text) && is_variable_token(text) {
            let kind = self.user_kind;
            self.declare(text, kind);
        }
        text.to_string()
    }
}

/// Cláusula atômica reconhecida.
struct Atomic {
    predicate: String,
    args: Vec<String>,
    negated: bool,
}

impl Atomic {
    fn new(predicate: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            predicate: predicate.into(),
            args,
            negated: false,
        }
    }

    fn negated(mut self) -> Self {
        self.negated = true;
        self
    }

    fn into_tree(self, mood: Mood) -> ClauseTree {
        ClauseTree {
            mood,
            quantifiers: Vec::new(),
            predicate: self.predicate,
            args: self.args,
            negated: self.negated,
            connective: None,
            conditions: Vec::new(),
            source: String::new(),
        }
    }
}

fn group<'t>(caps: &Captures<'t>, i: usize) -> &'t str {
    caps.get(i).map(|m| m.as_str().trim()).unwrap_or_default()
}

/// Parser por padrões regex — implementação padrão de [`ClauseParser`].
pub struct PatternParser {
    atomic: Vec<(Shape, Regex)>,
    questions: Vec<(Question, Regex)>,
    if_then: Regex,
    every_relative: Regex,
    every: Regex,
    some: Regex,
    postfix_if: Regex,
    and_split: Regex,
    disjunction: Regex,
}

impl PatternParser {
    /// Compila todos os padrões da gramática.
    ///
    /// # Erros
    ///
    /// [`CalcError::ParserUnavailable`] se algum padrão não compilar.
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| CalcError::parser_unavailable(format!("gramática inválida: {}", e)))
        };
        let atomic = ATOMIC_PATTERNS
            .iter()
            .map(|(shape, p)| compile(*p).map(|re| (*shape, re)))
            .collect::<Result<Vec<_>>>()?;
        let questions = QUESTION_PATTERNS
            .iter()
            .map(|(q, p)| compile(*p).map(|re| (*q, re)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            atomic,
            questions,
            if_then: compile(r"(?i)^if (.+) then (.+)$")?,
            every_relative: compile(r"(?i)^(?:every|each) ([a-z][\w-]*) (?:that|who|which) (.+)$")?,
            every: compile(r"(?i)^(?:every|each) ([a-z][\w-]*) (.+)$")?,
            some: compile(r"(?i)^(?:some|a|an) ([a-z][\w-]*) (.+)$")?,
            postfix_if: compile(r"(?i)^(.+?) (?:if|when) (.+)$")?,
            and_split: compile(r"(?i)\s+and\s+")?,
            disjunction: compile(r"(?i)\s+or\s+")?,
        })
    }

    /// Reconhece uma cláusula atômica declarativa.
    fn atomic(&self, text: &str, scope: &mut Scope, fragment: &str) -> Result<Atomic> {
        let text = text.trim();
        for (shape, re) in &self.atomic {
            let Some(caps) = re.captures(text) else {
                continue;
            };
            let subject = scope.arg(group(&caps, 1));
            let atomic = match shape {
                Shape::NotA | Shape::Not => {
                    Atomic::new(group(&caps, 2), vec![subject]).negated()
                }
                Shape::RelationOf => {
                    let object = scope.arg(group(&caps, 3));
                    Atomic::new(group(&caps, 2), vec![subject, object])
                }
                Shape::EligibleFor | Shape::QualifiesFor => {
                    let benefit = scope.arg(group(&caps, 2));
                    Atomic::new("eligible", vec![subject, benefit])
                }
                Shape::Employment => {
                    Atomic::new("employment_status", vec![subject, group(&caps, 2).to_string()])
                }
                Shape::Marital => {
                    Atomic::new("marital_status", vec![subject, group(&caps, 2).to_string()])
                }
                Shape::IsA | Shape::Is => Atomic::new(group(&caps, 2), vec![subject]),
                Shape::Earns => Atomic::new(
                    "income",
                    vec![subject, group(&caps, 2).to_string(), group(&caps, 3).to_string()],
                ),
                Shape::BornOn => {
                    Atomic::new("birth_date", vec![subject, group(&caps, 2).to_string()])
                }
                Shape::LivesIn => {
                    let place = scope.arg(group(&caps, 2));
                    Atomic::new("residence", vec![subject, place])
                }
                Shape::Comparison => {
                    return Err(CalcError::classification(
                        fragment,
                        "comparações aritméticas não são suportadas",
                    ))
                }
                Shape::Children => {
                    Atomic::new("children_count", vec![subject, group(&caps, 2).to_string()])
                }
                Shape::Citizenship => {
                    Atomic::new("citizenship", vec![subject, group(&caps, 2).to_string()])
                }
                Shape::HasA => {
                    let other = scope.fresh_existential();
                    Atomic::new(group(&caps, 2), vec![other, subject])
                }
                Shape::HasProperty => Atomic::new(
                    "has_property",
                    vec![subject, group(&caps, 2).to_string(), scope.arg(group(&caps, 3))],
                ),
                Shape::DoesNot => {
                    let object = scope.arg(group(&caps, 3));
                    Atomic::new(third_person(group(&caps, 2)), vec![subject, object]).negated()
                }
                Shape::Verb => {
                    let object = scope.arg(group(&caps, 3));
                    Atomic::new(group(&caps, 2).to_lowercase(), vec![subject, object])
                }
            };
            tracing::trace!(shape = ?shape, text = %text, "Cláusula atômica reconhecida");
            return Ok(atomic);
        }
        Err(CalcError::classification(
            fragment,
            format!("cláusula não reconhecida: \"{}\"", text),
        ))
    }

    /// Conjunção de condições ("C1 and C2"); disjunções são rejeitadas.
    fn conditions(&self, text: &str, scope: &mut Scope, fragment: &str) -> Result<Vec<ClauseTree>> {
        if self.disjunction.is_match(text) {
            return Err(CalcError::classification(
                fragment,
                "condições disjuntivas (or) não são cláusulas Horn",
            ));
        }
        self.and_split
            .split(text)
            .map(|part| {
                self.atomic(part, scope, fragment)
                    .map(|a| a.into_tree(Mood::Declarative))
            })
            .collect()
    }

    fn rule(
        &self,
        head: &str,
        conditions: &str,
        connective: &str,
        fragment: &str,
    ) -> Result<ClauseTree> {
        let mut scope = Scope::new(QuantifierKind::Universal);
        let conditions = self.conditions(conditions, &mut scope, fragment)?;
        let head = self.atomic(head, &mut scope, fragment)?.into_tree(Mood::Declarative);
        let tree = match connective {
            "every" => head.every(conditions),
            _ => head.when(conditions),
        };
        Ok(ClauseTree {
            quantifiers: scope.quantifiers,
            ..tree
        })
    }

    /// "Every N that REL VP": tenta cada ponto de corte entre REL e VP.
    fn every_relative(&self, noun: &str, rest: &str, fragment: &str) -> Result<ClauseTree> {
        let tokens: Vec<&str> = rest.split_whitespace().collect();
        for cut in 1..tokens.len() {
            let vp_head = tokens[cut].to_lowercase();
            let verbish = LINKING_VERBS.contains(&vp_head.as_str()) || vp_head.ends_with('s');
            let rel_tail = tokens[cut - 1].to_lowercase();
            if !verbish || ARTICLES.contains(&rel_tail.as_str()) {
                continue;
            }
            let relative = format!("{} {}", UNIVERSAL_VARIABLE, tokens[..cut].join(" "));
            let predicate = format!("{} {}", UNIVERSAL_VARIABLE, tokens[cut..].join(" "));

            let mut scope = Scope::new(QuantifierKind::Universal);
            scope.declare(UNIVERSAL_VARIABLE, QuantifierKind::Universal);
            let (Ok(rel), Ok(head)) = (
                self.atomic(&relative, &mut scope, fragment),
                self.atomic(&predicate, &mut scope, fragment),
            ) else {
                continue;
            };
            let restriction = Atomic::new(noun, vec![UNIVERSAL_VARIABLE.to_string()]);
            let tree = head.into_tree(Mood::Declarative).every(vec![
                restriction.into_tree(Mood::Declarative),
                rel.into_tree(Mood::Declarative),
            ]);
            return Ok(ClauseTree {
                quantifiers: scope.quantifiers,
                ..tree
            });
        }
        Err(CalcError::classification(
            fragment,
            "oração relativa não reconhecida",
        ))
    }

    fn every(&self, noun: &str, rest: &str, fragment: &str) -> Result<ClauseTree> {
        let mut scope = Scope::new(QuantifierKind::Universal);
        scope.declare(UNIVERSAL_VARIABLE, QuantifierKind::Universal);
        let head = self.atomic(&format!("{} {}", UNIVERSAL_VARIABLE, rest), &mut scope, fragment)?;
        let restriction = Atomic::new(noun, vec![UNIVERSAL_VARIABLE.to_string()]);
        let tree = head
            .into_tree(Mood::Declarative)
            .every(vec![restriction.into_tree(Mood::Declarative)]);
        Ok(ClauseTree {
            quantifiers: scope.quantifiers,
            ..tree
        })
    }

    fn existential(&self, noun: &str, rest: &str, fragment: &str) -> Result<ClauseTree> {
        let mut scope = Scope::new(QuantifierKind::Universal);
        let subject = scope.fresh_existential();
        let main = self.atomic(&format!("{} {}", subject, rest), &mut scope, fragment)?;
        let restriction = Atomic::new(noun, vec![subject]);
        let tree = main
            .into_tree(Mood::Declarative)
            .some(vec![restriction.into_tree(Mood::Declarative)]);
        Ok(ClauseTree {
            quantifiers: scope.quantifiers,
            ..tree
        })
    }

    fn fact(&self, text: &str, fragment: &str) -> Result<ClauseTree> {
        let mut scope = Scope::new(QuantifierKind::Universal);
        let atomic = self.atomic(text, &mut scope, fragment)?;
        Ok(ClauseTree {
            quantifiers: scope.quantifiers,
            ..atomic.into_tree(Mood::Declarative)
        })
    }

    fn question(&self, text: &str, fragment: &str) -> Result<ClauseTree> {
        let mut scope = Scope::new(QuantifierKind::None);
        let x = QUERY_VARIABLE.to_string();
        for (shape, re) in &self.questions {
            let Some(caps) = re.captures(text) else {
                continue;
            };
            let atomic = match shape {
                Question::IsEligible => {
                    let s = scope.arg(group(&caps, 1));
                    Atomic::new("eligible", vec![s, scope.arg(group(&caps, 2))])
                }
                Question::IsRelationOf => {
                    let s = scope.arg(group(&caps, 1));
                    Atomic::new(group(&caps, 2), vec![s, scope.arg(group(&caps, 3))])
                }
                Question::IsEmployment => Atomic::new(
                    "employment_status",
                    vec![scope.arg(group(&caps, 1)), group(&caps, 2).to_string()],
                ),
                Question::IsMarital => Atomic::new(
                    "marital_status",
                    vec![scope.arg(group(&caps, 1)), group(&caps, 2).to_string()],
                ),
                Question::IsNot => {
                    Atomic::new(group(&caps, 2), vec![scope.arg(group(&caps, 1))]).negated()
                }
                Question::IsA | Question::Is => {
                    Atomic::new(group(&caps, 2), vec![scope.arg(group(&caps, 1))])
                }
                Question::DoesHaveChildren => Atomic::new(
                    "children_count",
                    vec![scope.arg(group(&caps, 1)), group(&caps, 2).to_string()],
                ),
                Question::DoesLiveIn => {
                    let s = scope.arg(group(&caps, 1));
                    Atomic::new("residence", vec![s, scope.arg(group(&caps, 2))])
                }
                Question::DoesNot => {
                    let s = scope.arg(group(&caps, 1));
                    Atomic::new(third_person(group(&caps, 2)), vec![s, scope.arg(group(&caps, 3))])
                        .negated()
                }
                Question::Does => {
                    let s = scope.arg(group(&caps, 1));
                    Atomic::new(third_person(group(&caps, 2)), vec![s, scope.arg(group(&caps, 3))])
                }
                // O complemento "of O" vem primeiro: P(O, ?).
                Question::WhoRelationOf => {
                    let o = scope.arg(group(&caps, 2));
                    Atomic::new(group(&caps, 1), vec![o, x.clone()])
                }
                Question::WhoEligible => {
                    Atomic::new("eligible", vec![x.clone(), scope.arg(group(&caps, 1))])
                }
                Question::WhoIsA | Question::WhoIs => Atomic::new(group(&caps, 1), vec![x.clone()]),
                Question::WhoLivesIn => {
                    Atomic::new("residence", vec![x.clone(), scope.arg(group(&caps, 1))])
                }
                Question::WhoVerb => Atomic::new(
                    group(&caps, 1).to_lowercase(),
                    vec![x.clone(), scope.arg(group(&caps, 2))],
                ),
                Question::WhatBenefits => {
                    Atomic::new("eligible", vec![scope.arg(group(&caps, 1)), x.clone()])
                }
                Question::WhatDoes => Atomic::new(
                    third_person(group(&caps, 2)),
                    vec![scope.arg(group(&caps, 1)), x.clone()],
                ),
                Question::WhichEligible => {
                    Atomic::new("eligible", vec![x.clone(), scope.arg(group(&caps, 2))])
                }
                Question::HowMuchIncome => Atomic::new(
                    "income",
                    vec![scope.arg(group(&caps, 1)), x.clone(), "_".to_string()],
                ),
                Question::HowMuch => {
                    let s = scope.arg(group(&caps, 2));
                    Atomic::new("benefit_amount", vec![s, scope.arg(group(&caps, 1)), x.clone()])
                }
                Question::WhereLives => {
                    Atomic::new("residence", vec![scope.arg(group(&caps, 1)), x.clone()])
                }
            };
            if atomic.args.contains(&x) {
                scope.declare(QUERY_VARIABLE, QuantifierKind::None);
            }
            tracing::trace!(shape = ?shape, text = %text, "Pergunta reconhecida");
            return Ok(ClauseTree {
                quantifiers: scope.quantifiers,
                ..atomic.into_tree(Mood::Interrogative)
            });
        }
        Err(CalcError::classification(fragment, "pergunta não reconhecida"))
    }
}

impl ClauseParser for PatternParser {
    fn parse_sentence(&self, sentence: &str) -> Result<ClauseTree> {
        let source: String = sentence.nfc().collect::<String>().trim().to_string();
        if source.is_empty() {
            return Err(CalcError::classification(sentence, "sentença vazia"));
        }
        let mood = detect_mood(&source);
        let body = source
            .trim_end_matches(|c: char| matches!(c, '.' | '?' | '!'))
            .trim();

        let tree = if mood == Mood::Interrogative {
            self.question(body, &source)?
        } else if let Some(caps) = self.if_then.captures(body) {
            self.rule(group(&caps, 2), group(&caps, 1), "if", &source)?
        } else if let Some(caps) = self.every_relative.captures(body) {
            self.every_relative(group(&caps, 1), group(&caps, 2), &source)?
        } else if let Some(caps) = self.every.captures(body) {
            self.every(group(&caps, 1), group(&caps, 2), &source)?
        } else if let Some(caps) = self.some.captures(body) {
            self.existential(group(&caps, 1), group(&caps, 2), &source)?
        } else if let Some(caps) = self.postfix_if.captures(body) {
            self.rule(group(&caps, 1), group(&caps, 2), "if", &source)?
        } else {
            self.fact(body, &source)?
        };
        tracing::debug!(mood = ?tree.mood, predicate = %tree.predicate, "Sentença analisada");
        Ok(tree.with_source(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> PatternParser {
        PatternParser::new().unwrap()
    }

    fn parse(text: &str) -> ClauseTree {
        parser().parse_sentence(text).unwrap()
    }

    #[test]
    fn simple_facts() {
        let t = parse("John is a man.");
        assert_eq!((t.predicate.as_str(), t.args.clone()), ("man", vec!["John".to_string()]));
        assert_eq!(t.mood, Mood::Declarative);

        let t = parse("John likes chocolate.");
        assert_eq!(t.predicate, "likes");
        assert_eq!(t.args, vec!["John", "chocolate"]);

        let t = parse("Tom is a parent of John.");
        assert_eq!(t.predicate, "parent");
        assert_eq!(t.args, vec!["Tom", "John"]);
    }

    #[test]
    fn administrative_facts() {
        let t = parse("Hans earns 2500.50 euros per month.");
        assert_eq!(t.predicate, "income");
        assert_eq!(t.args, vec!["Hans", "2500.50", "month"]);

        let t = parse("Hans is self-employed.");
        assert_eq!(t.predicate, "employment_status");

        let t = parse("Hans has German citizenship.");
        assert_eq!(t.predicate, "citizenship");
        assert_eq!(t.args[1], "German");

        let t = parse("Hans has 2 children.");
        assert_eq!(t.predicate, "children_count");
        assert_eq!(t.args, vec!["Hans", "2"]);

        let t = parse("Hans lives in Germany.");
        assert_eq!(t.predicate, "residence");
    }

    #[test]
    fn negations_share_the_positive_predicate() {
        let t = parse("John does not like chocolate.");
        assert!(t.negated);
        assert_eq!(t.predicate, "likes");

        let t = parse("John is not happy.");
        assert!(t.negated);
        assert_eq!(t.predicate, "happy");
    }

    #[test]
    fn conditional_rule_declares_universals() {
        let t = parse("If X is a parent of Y and Y is a parent of Z then X is a grandparent of Z.");
        assert_eq!(t.connective(), Some("if"));
        assert_eq!(t.predicate, "grandparent");
        assert_eq!(t.conditions.len(), 2);
        for v in ["X", "Y", "Z"] {
            assert_eq!(t.quantifier_of(v), Some(QuantifierKind::Universal));
        }
    }

    #[test]
    fn postfix_rule() {
        let t = parse("X is eligible for Kindergeld if X has German citizenship and X lives in Germany.");
        assert_eq!(t.predicate, "eligible");
        assert_eq!(t.args, vec!["X", "Kindergeld"]);
        assert_eq!(t.conditions.len(), 2);
    }

    #[test]
    fn every_sentences() {
        let t = parse("Every man is a person.");
        assert_eq!(t.connective(), Some("every"));
        assert_eq!(t.predicate, "person");
        assert_eq!(t.conditions[0].predicate, "man");

        let t = parse("Every man that likes chocolate is happy.");
        assert_eq!(t.predicate, "happy");
        assert_eq!(t.conditions.len(), 2);
        assert_eq!(t.conditions[1].predicate, "likes");
    }

    #[test]
    fn every_with_has_a_gets_existential_head() {
        let t = parse("Every person has a parent.");
        assert_eq!(t.predicate, "parent");
        assert_eq!(t.quantifier_of(&t.args[0]), Some(QuantifierKind::Existential));
        assert_eq!(t.args[1], "X");
    }

    #[test]
    fn some_sentence_is_existential() {
        let t = parse("Some person likes chocolate.");
        assert_eq!(t.connective(), Some("some"));
        assert_eq!(t.quantifier_of(&t.args[0]), Some(QuantifierKind::Existential));
        assert_eq!(t.conditions[0].predicate, "person");
    }

    #[test]
    fn questions() {
        let t = parse("Who is a person?");
        assert_eq!(t.mood, Mood::Interrogative);
        assert_eq!(t.args, vec!["X"]);
        assert_eq!(t.quantifier_of("X"), Some(QuantifierKind::None));

        let t = parse("Is Tom a grandparent of Mary?");
        assert_eq!(t.predicate, "grandparent");
        assert_eq!(t.args, vec!["Tom", "Mary"]);

        let t = parse("Does John like chocolate?");
        assert_eq!(t.predicate, "likes");
        assert_eq!(t.args, vec!["John", "chocolate"]);

        let t = parse("What does John like?");
        assert_eq!(t.args, vec!["John", "X"]);

        let t = parse("How much income does Hans earn?");
        assert_eq!(t.args, vec!["Hans", "X", "_"]);
    }

    /// "Who is a P of O?" consulta P(O, ?).
    #[test]
    fn who_relation_of_puts_complement_first() {
        let t = parse("Who is a grandparent of Mary?");
        assert_eq!(t.predicate, "grandparent");
        assert_eq!(t.args, vec!["Mary", "X"]);
    }

    #[test]
    fn non_horn_sentences_are_rejected() {
        let p = parser();
        for text in [
            "X is eligible for Kindergeld if X has more than 2 children.",
            "X is happy if X is rich or X is loved.",
            "Hello world",
        ] {
            assert!(matches!(
                p.parse_sentence(text),
                Err(CalcError::Classification { .. })
            ));
        }
    }

    #[test]
    fn third_person_inflection() {
        assert_eq!(third_person("go"), "goes");
        assert_eq!(third_person("play"), "plays");
        assert_eq!(third_person("Own"), "owns");
    }
}

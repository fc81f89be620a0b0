//! # Módulo NLU — Texto Controlado → ClauseTree
//!
//! A fronteira entre o texto do usuário e o núcleo lógico. O núcleo nunca vê
//! strings livres: recebe apenas [`ClauseTree`]s produzidas por um
//! [`ClauseParser`].
//!
//! ## Fluxo
//!
//! ```text
//! Texto (várias linhas)
//!   ├── 1. Quebra em linhas; ignora vazias e comentários (#)
//!   ├── 2. NFC normalize (Unicode)
//!   ├── 3. Detecta modo (declarativo / interrogativo)
//!   ├── 4. Casa padrões da gramática (PatternParser)
//!   └── 5. ClauseTree por linha, ou erro local à linha
//! ```
//!
//! As linhas são analisadas em paralelo (rayon) mas o resultado preserva a
//! ordem original, de modo que a KB recebe as sentenças na ordem do texto.
//!
//! ## Sub-módulos
//!
//! | Módulo | Responsabilidade |
//! |--------|-----------------|
//! | [`grammar`] | Padrões regex da linguagem controlada |
//! | [`mood`] | Heurística declarativo/interrogativo |
//!
//! ## Timeout
//!
//! [`parse_with_timeout`] roda o parser numa thread bloqueante e converte
//! estouro de tempo ou pânico em [`CalcError::ParserUnavailable`].

pub mod grammar;
pub mod mood;

use std::sync::Arc;
use std::time::Duration;

use rayon::prelude::*;
use serde::Serialize;

use crate::core::{CalcError, Result};
use crate::statement::ClauseTree;

pub use grammar::PatternParser;
pub use mood::detect_mood;

/// Resultado da análise de uma linha de texto.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedSentence {
    /// Número da linha (1-based) no texto original.
    pub line: usize,
    /// Texto da linha, sem espaços nas bordas.
    pub source: String,
    /// Árvore de cláusula, ou o erro local a esta sentença.
    #[serde(skip)]
    pub clause: Result<ClauseTree>,
}

/// Parser de linguagem controlada.
///
/// Implementações devem ser determinísticas: a mesma sentença produz sempre
/// a mesma árvore.
pub trait ClauseParser: Send + Sync {
    /// Analisa uma única sentença.
    fn parse_sentence(&self, sentence: &str) -> Result<ClauseTree>;

    /// Analisa um texto com uma sentença por linha.
    fn parse_text(&self, text: &str) -> Vec<ParsedSentence> {
        let lines: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'))
            .collect();

        lines
            .par_iter()
            .map(|(line, source)| ParsedSentence {
                line: *line,
                source: source.to_string(),
                clause: self.parse_sentence(source),
            })
            .collect()
    }
}

/// Analisa `text` numa thread bloqueante, com tempo máximo.
///
/// # Erros
///
/// [`CalcError::ParserUnavailable`] se o tempo estourar ou a thread falhar.
/// Erros por sentença ficam dentro de cada [`ParsedSentence`].
pub async fn parse_with_timeout(
    parser: Arc<dyn ClauseParser>,
    text: String,
    timeout: Duration,
) -> Result<Vec<ParsedSentence>> {
    let task = tokio::task::spawn_blocking(move || parser.parse_text(&text));
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(parsed)) => Ok(parsed),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Thread do parser falhou");
            Err(CalcError::parser_unavailable(format!("falha no parser: {}", e)))
        }
        Err(_) => {
            tracing::warn!(
                timeout_ms = timeout.as_millis() as u64,
                "Parser excedeu o tempo limite"
            );
            Err(CalcError::parser_unavailable(format!(
                "parser excedeu {} ms",
                timeout.as_millis()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Parser que nunca termina a tempo.
    struct SlowParser;

    impl ClauseParser for SlowParser {
        fn parse_sentence(&self, _sentence: &str) -> Result<ClauseTree> {
            std::thread::sleep(Duration::from_millis(200));
            Ok(ClauseTree::declarative("slow", &["a"]))
        }
    }

    #[test]
    fn parse_text_skips_blank_and_comment_lines_and_keeps_order() {
        let parser = PatternParser::new().unwrap();
        let text = "# família\nJohn is a man.\n\nMary is a woman.\nWho is a man?\n";
        let parsed = parser.parse_text(text);
        let lines: Vec<usize> = parsed.iter().map(|p| p.line).collect();
        assert_eq!(lines, vec![2, 4, 5]);
        assert!(parsed.iter().all(|p| p.clause.is_ok()));
        assert_eq!(parsed[1].source, "Mary is a woman.");
    }

    #[test]
    fn bad_line_does_not_poison_the_rest() {
        let parser = PatternParser::new().unwrap();
        let parsed = parser.parse_text("John is a man.\nHello world\nMary is a woman.");
        assert!(parsed[0].clause.is_ok());
        assert!(parsed[1].clause.is_err());
        assert!(parsed[2].clause.is_ok());
    }

    #[tokio::test]
    async fn timeout_maps_to_parser_unavailable() {
        let parser: Arc<dyn ClauseParser> = Arc::new(SlowParser);
        let result =
            parse_with_timeout(parser, "x".to_string(), Duration::from_millis(10)).await;
        assert!(matches!(result, Err(CalcError::ParserUnavailable { .. })));
    }

    #[tokio::test]
    async fn parse_with_timeout_returns_sentences() {
        let parser: Arc<dyn ClauseParser> = Arc::new(PatternParser::new().unwrap());
        let parsed = parse_with_timeout(parser, "John is a man.".to_string(), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(parsed.len(), 1);
    }
}

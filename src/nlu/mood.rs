//! # Detector de Modo — Declarativo ou Interrogativo
//!
//! Heurísticas rápidas, sem modelo:
//!
//! | Sinal | Exemplo | Modo |
//! |-------|---------|------|
//! | termina com `?` | "John likes Mary?" | interrogativo |
//! | começa com palavra interrogativa | "Who is a person" | interrogativo |
//! | caso contrário | "John is a man." | declarativo |

use crate::statement::Mood;

/// Palavras que abrem uma pergunta na linguagem controlada.
const INTERROGATIVE_WORDS: &[&str] = &[
    "is", "are", "does", "do", "who", "what", "which", "how", "where", "when", "why",
];

/// Classifica o modo de uma sentença já sem espaços nas bordas.
pub fn detect_mood(text: &str) -> Mood {
    let text = text.trim();
    if text.ends_with('?') {
        return Mood::Interrogative;
    }
    let first = text
        .split_whitespace()
        .next()
        .map(|w| w.to_lowercase())
        .unwrap_or_default();
    if INTERROGATIVE_WORDS.contains(&first.as_str()) {
        Mood::Interrogative
    } else {
        Mood::Declarative
    }
}

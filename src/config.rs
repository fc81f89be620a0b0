//! # Configuração
//!
//! Valores padrão sensatos, sobrescritos por variáveis de ambiente:
//!
//! | Variável | Campo | Padrão |
//! |----------|-------|--------|
//! | `LOGIC_MAX_ITERATIONS` | `max_iterations` | 64 |
//! | `LOGIC_PARSER_TIMEOUT_MS` | `parser_timeout_ms` | 5000 |
//! | `LOGIC_BIND_ADDR` | `bind_addr` | `0.0.0.0:3000` |
//! | `LOGIC_PROJECT_PATH` | `project_path` | `data/project.json` |
//!
//! Valores inválidos geram um `warn` e mantêm o padrão.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::inference::DEFAULT_MAX_ITERATIONS;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    /// Limite de iterações do ponto fixo.
    pub max_iterations: usize,
    /// Tempo máximo de parsing por requisição.
    pub parser_timeout_ms: u64,
    pub bind_addr: String,
    /// Arquivo JSON do conhecimento base do projeto.
    pub project_path: PathBuf,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            parser_timeout_ms: 5000,
            bind_addr: "0.0.0.0:3000".to_string(),
            project_path: PathBuf::from("data/project.json"),
        }
    }
}

impl CalculatorConfig {
    /// Lê a configuração das variáveis de ambiente.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Como [`from_env`](Self::from_env), com uma fonte de variáveis arbitrária.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(v) = parse_var(&lookup, "LOGIC_MAX_ITERATIONS") {
            if v == 0 {
                tracing::warn!(
                    "LOGIC_MAX_ITERATIONS=0 ignorado, mantendo {}",
                    config.max_iterations
                );
            } else {
                config.max_iterations = v;
            }
        }
        if let Some(v) = parse_var(&lookup, "LOGIC_PARSER_TIMEOUT_MS") {
            config.parser_timeout_ms = v;
        }
        if let Some(v) = lookup("LOGIC_BIND_ADDR").filter(|v| !v.trim().is_empty()) {
            config.bind_addr = v;
        }
        if let Some(v) = lookup("LOGIC_PROJECT_PATH").filter(|v| !v.trim().is_empty()) {
            config.project_path = PathBuf::from(v);
        }
        config
    }

    pub fn parser_timeout(&self) -> Duration {
        Duration::from_millis(self.parser_timeout_ms)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Valor de configuração inválido, usando padrão");
            None
        }
    }
}

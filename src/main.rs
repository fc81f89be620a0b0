//! # Calculadora Lógica — Servidor
//!
//! **Ponto de entrada** da aplicação: carrega a configuração e o conhecimento
//! base do projeto, abre uma sessão nova e serve a API JSON.
//!
//! ## Fluxo de Inicialização
//!
//! ```text
//! main()
//!   ├── Configura tracing/logging (RUST_LOG, padrão info)
//!   ├── CalculatorConfig::from_env()
//!   ├── Carrega o projeto do disco (ou KB vazia)
//!   ├── Inicia sessão nova
//!   ├── Compila a gramática (PatternParser)
//!   ├── Monta AppState e Router
//!   └── Serve em LOGIC_BIND_ADDR
//! ```
//!
//! ## Exemplo de Uso
//!
//! ```bash
//! RUST_LOG=debug LOGIC_MAX_ITERATIONS=32 cargo run
//!
//! curl -X POST localhost:3000/statements \
//!      -H 'content-type: application/json' \
//!      -d '{"text": "John is a man.\nEvery man is a person.\nWho is a person?"}'
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use logic_calculator::config::CalculatorConfig;
use logic_calculator::core::KnowledgeBase;
use logic_calculator::inference::InferenceEngine;
use logic_calculator::nlu::PatternParser;
use logic_calculator::orchestrator::Orchestrator;
use logic_calculator::persistence;
use logic_calculator::web::{self, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Calculadora Lógica — iniciando...");

    let config = CalculatorConfig::from_env();
    tracing::info!(
        max_iterations = config.max_iterations,
        parser_timeout_ms = config.parser_timeout_ms,
        project = %config.project_path.display(),
        "Configuração carregada"
    );

    // Projeto corrompido não impede o servidor de subir.
    let mut kb = match persistence::load_kb(&config.project_path) {
        Ok(kb) => {
            tracing::info!(
                facts = kb.fact_count(),
                rules = kb.rule_count(),
                "Projeto carregado do disco"
            );
            kb
        }
        Err(e) => {
            tracing::warn!(error = %e, "Falha ao carregar projeto, iniciando vazio");
            KnowledgeBase::new()
        }
    };
    kb.start_session();

    let parser = PatternParser::new().context("Falha ao compilar a gramática")?;
    let orchestrator = Orchestrator::new(kb, InferenceEngine::new(config.max_iterations));
    let addr = config.bind_addr.clone();
    let state = AppState::new(orchestrator, Arc::new(parser), config);

    let app = web::create_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Falha ao fazer bind em {}", addr))?;
    tracing::info!("Servidor em http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

//! # Handlers HTTP — Os Endpoints da Calculadora
//!
//! Cada função pública é um handler Axum mapeado em
//! [`super::create_router()`]. Todo corpo de entrada e saída é JSON.
//!
//! | Handler | Método | Retorno |
//! |---------|--------|---------|
//! | `status` | GET | [`StatusView`] |
//! | `statements` | POST | [`BatchReport`] |
//! | `clauses` | POST | [`BatchReport`] |
//! | `query` | POST | [`Answer`] |
//! | `cancel` | POST | 202 se havia inferência rodando, 200 caso contrário |
//! | `reset` | POST | [`StatusView`] |
//! | `knowledge` | GET | [`KnowledgeView`] |
//! | `save_project` | POST | caminho gravado |
//!
//! ## Erros → Status HTTP
//!
//! | Erro | Status |
//! |------|--------|
//! | `Classification`, `RangeRestriction`, `QueryMalformed` | 422 |
//! | `InferenceLimitExceeded` | 422 |
//! | `InferenceCancelled` | 409 |
//! | `ParserUnavailable` | 503 |
//! | falha interna (join, disco) | 500 |
//!
//! Inferência e parsing nunca rodam no executor async: o orquestrador é
//! usado dentro de `spawn_blocking`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::state::AppState;
use crate::core::{CalcError, ResetScope, SessionTag};
use crate::nlu::{parse_with_timeout, ParsedSentence};
use crate::orchestrator::{BatchReport, KnowledgeView, StatusView};
use crate::query::Answer;
use crate::statement::ClauseTree;

/// Onde registrar as sentenças de um lote.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Sessão corrente (desfeita por `reset(session)`).
    #[default]
    Session,
    /// Conhecimento base do projeto (persistido por `/project/save`).
    Base,
}

#[derive(Debug, Deserialize)]
pub struct StatementsRequest {
    pub text: String,
    #[serde(default)]
    pub scope: Scope,
}

#[derive(Debug, Deserialize)]
pub struct ClausesRequest {
    pub clauses: Vec<ClauseTree>,
    #[serde(default)]
    pub scope: Scope,
}

/// `{ "text": "Who is a person?" }` ou `{ "clause": { … } }`.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub text: Option<String>,
    pub clause: Option<ClauseTree>,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub scope: ResetScope,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    /// `false` quando nenhuma inferência estava em andamento.
    pub cancelled: bool,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub saved: String,
}

/// Erro de handler, convertido em resposta JSON com status adequado.
#[derive(Debug)]
pub enum ApiError {
    Calc(CalcError),
    Internal(String),
}

impl From<CalcError> for ApiError {
    fn from(e: CalcError) -> Self {
        ApiError::Calc(e)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("tarefa bloqueante falhou: {}", e))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(format!("{:#}", e))
    }
}

fn status_for(error: &CalcError) -> StatusCode {
    match error {
        CalcError::Classification { .. }
        | CalcError::RangeRestriction { .. }
        | CalcError::QueryMalformed { .. }
        | CalcError::InferenceLimitExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        CalcError::InferenceCancelled { .. } => StatusCode::CONFLICT,
        CalcError::ParserUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Calc(error) => {
                let status = status_for(&error);
                tracing::warn!(kind = error.kind(), error = %error, "Requisição falhou");
                let body = json!({
                    "error": error.kind(),
                    "message": error.to_string(),
                    "detail": error,
                });
                (status, Json(body)).into_response()
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Erro interno");
                let body = json!({ "error": "internal", "message": message });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

/// Processa um lote no orquestrador, fora do executor async.
async fn run_batch(
    state: &AppState,
    sentences: Vec<ParsedSentence>,
    scope: Scope,
) -> Result<BatchReport, ApiError> {
    let orchestrator = state.orchestrator.clone();
    let report = tokio::task::spawn_blocking(move || {
        let mut orchestrator = orchestrator.lock();
        let tag = match scope {
            Scope::Base => SessionTag::Base,
            Scope::Session => orchestrator.kb().current_session(),
        };
        orchestrator.process_batch(sentences, tag)
    })
    .await?;
    Ok(report)
}

/// GET `/status` — contadores da KB e limite de iterações.
pub async fn status(State(state): State<AppState>) -> Json<StatusView> {
    let status = state.orchestrator.lock().status();
    Json(status)
}

/// POST `/statements` — texto em linguagem controlada, uma sentença por linha.
///
/// ```text
/// 1. parse_with_timeout (503 se o parser não responder)
/// 2. process_batch: registra fatos/regras, infere uma vez, responde perguntas
/// 3. BatchReport com o resultado de cada linha
/// ```
pub async fn statements(
    State(state): State<AppState>,
    Json(request): Json<StatementsRequest>,
) -> Result<Json<BatchReport>, ApiError> {
    let parsed = parse_with_timeout(
        state.parser.clone(),
        request.text,
        state.config.parser_timeout(),
    )
    .await?;
    tracing::info!(sentences = parsed.len(), "POST /statements");
    run_batch(&state, parsed, request.scope).await.map(Json)
}

/// POST `/clauses` — árvores já produzidas por um parser externo.
pub async fn clauses(
    State(state): State<AppState>,
    Json(request): Json<ClausesRequest>,
) -> Result<Json<BatchReport>, ApiError> {
    let sentences = request
        .clauses
        .into_iter()
        .enumerate()
        .map(|(i, tree)| ParsedSentence {
            line: i + 1,
            source: tree.fragment(),
            clause: Ok(tree),
        })
        .collect();
    run_batch(&state, sentences, request.scope).await.map(Json)
}

/// POST `/query` — responde uma pergunta contra o fecho da KB.
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<Answer>, ApiError> {
    let tree = match (request.clause, request.text) {
        (Some(tree), _) => tree,
        (None, Some(text)) => {
            let parsed =
                parse_with_timeout(state.parser.clone(), text, state.config.parser_timeout())
                    .await?;
            let sentence = parsed
                .into_iter()
                .next()
                .ok_or_else(|| CalcError::query_malformed("pergunta vazia"))?;
            sentence.clause?
        }
        (None, None) => {
            return Err(CalcError::query_malformed("informe 'text' ou 'clause'").into());
        }
    };

    let orchestrator = state.orchestrator.clone();
    let answer =
        tokio::task::spawn_blocking(move || orchestrator.lock().query(&tree)).await??;
    Ok(Json(answer))
}

/// POST `/cancel` — cancela a inferência em andamento; sem nada rodando, o
/// pedido é descartado.
pub async fn cancel(State(state): State<AppState>) -> (StatusCode, Json<CancelResponse>) {
    let cancelled = state.cancel.cancel_running();
    tracing::info!(cancelled, "Cancelamento solicitado");
    let status = if cancelled {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };
    (status, Json(CancelResponse { cancelled }))
}

/// POST `/reset` — `{ "scope": "session" | "all" }`.
pub async fn reset(
    State(state): State<AppState>,
    Json(request): Json<ResetRequest>,
) -> Json<StatusView> {
    let mut orchestrator = state.orchestrator.lock();
    orchestrator.reset(request.scope);
    Json(orchestrator.status())
}

/// GET `/knowledge` — conteúdo da KB como texto.
pub async fn knowledge(State(state): State<AppState>) -> Json<KnowledgeView> {
    let view = state.orchestrator.lock().knowledge();
    Json(view)
}

/// POST `/project/save` — grava o conhecimento base no arquivo do projeto.
pub async fn save_project(State(state): State<AppState>) -> Result<Json<SaveResponse>, ApiError> {
    let orchestrator = state.orchestrator.clone();
    let path = state.config.project_path.clone();
    let saved = path.display().to_string();
    tokio::task::spawn_blocking(move || {
        let orchestrator = orchestrator.lock();
        crate::persistence::save_kb(orchestrator.kb(), &path)
    })
    .await??;
    Ok(Json(SaveResponse { saved }))
}

//! # Módulo Web — API JSON da Calculadora
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Axum Router (este módulo)                                    │
//! │  ├── GET  /status        → contadores da KB                  │
//! │  ├── POST /statements    → texto → BatchReport               │
//! │  ├── POST /clauses       → ClauseTrees prontas → BatchReport │
//! │  ├── POST /query         → texto ou ClauseTree → Answer      │
//! │  ├── POST /cancel        → cancela a inferência em andamento │
//! │  ├── POST /reset         → reset(session | all)              │
//! │  ├── GET  /knowledge     → fatos, negativos, regras          │
//! │  └── POST /project/save  → grava o conhecimento base         │
//! ├──────────────────────────────────────────────────────────────┤
//! │ CorsLayer (tower-http)                                       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Submódulos
//!
//! | Módulo | Responsabilidade |
//! |--------|------------------|
//! | [`state`] | Estado compartilhado (`AppState`) |
//! | [`handlers`] | Handlers Axum e mapeamento de erros para HTTP |

pub mod handlers;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use state::AppState;

/// Cria o router Axum com todas as rotas da aplicação.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/status", get(handlers::status))
        .route("/statements", post(handlers::statements))
        .route("/clauses", post(handlers::clauses))
        .route("/query", post(handlers::query))
        .route("/cancel", post(handlers::cancel))
        .route("/reset", post(handlers::reset))
        .route("/knowledge", get(handlers::knowledge))
        .route("/project/save", post(handlers::save_project))
        .layer(cors)
        .with_state(state)
}

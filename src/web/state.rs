//! # Estado da Aplicação Web
//!
//! ```text
//! AppState (Clone, barato)
//!  ├── orchestrator: Arc<Mutex<Orchestrator>>   uma requisição por vez na KB
//!  ├── parser:       Arc<dyn ClauseParser>      sem estado, compartilhado
//!  ├── cancel:       CancelFlag                 /cancel não precisa do lock
//!  └── config:       Arc<CalculatorConfig>
//! ```
//!
//! A flag de cancelamento é um clone da flag do orquestrador: `/cancel`
//! funciona mesmo enquanto outra requisição segura o `Mutex` durante a
//! inferência.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::CalculatorConfig;
use crate::inference::CancelFlag;
use crate::nlu::ClauseParser;
use crate::orchestrator::Orchestrator;

/// Estado compartilhado da aplicação Axum.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Mutex<Orchestrator>>,
    pub parser: Arc<dyn ClauseParser>,
    pub cancel: CancelFlag,
    pub config: Arc<CalculatorConfig>,
}

impl AppState {
    pub fn new(
        orchestrator: Orchestrator,
        parser: Arc<dyn ClauseParser>,
        config: CalculatorConfig,
    ) -> Self {
        let cancel = orchestrator.cancel_flag();
        Self {
            orchestrator: Arc::new(Mutex::new(orchestrator)),
            parser,
            cancel,
            config: Arc::new(config),
        }
    }
}

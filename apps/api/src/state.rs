use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::Mutex;

use crate::analysis::orchestrator::Analyzer;
use crate::config::Config;
use crate::usage::UsageLedger;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// The total analysis pipeline; shared because it owns the model client.
    pub analyzer: Arc<Analyzer>,
    /// Usage ledger; mutation serialized behind the mutex. The analyzer
    /// holds a clone of this same handle.
    pub ledger: Arc<Mutex<UsageLedger>>,
}

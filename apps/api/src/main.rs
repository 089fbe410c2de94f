mod analysis;
mod config;
mod dashboard;
mod db;
mod documents;
mod errors;
mod extraction;
mod llm_client;
mod models;
mod routes;
mod state;
mod usage;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::orchestrator::Analyzer;
use crate::config::Config;
use crate::db::create_pool;
use crate::documents::storage::ensure_upload_dir;
use crate::routes::build_router;
use crate::state::AppState;
use crate::usage::store::UsageStore;
use crate::usage::{UsageLedger, UsageLimits};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (aborts on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting compliance API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL and bring the schema up to date
    let db = create_pool(&config.database_url).await?;
    sqlx::migrate!().run(&db).await?;
    info!("Database migrations applied");

    // Upload directory must exist before the first multipart request lands
    ensure_upload_dir(&config.upload_dir)?;

    // Load the usage ledger from its durable store
    let ledger = Arc::new(Mutex::new(UsageLedger::load(
        UsageStore::new(config.usage_file.clone()),
        UsageLimits {
            max_daily_requests: config.max_daily_requests,
            daily_token_limit: config.daily_token_limit,
            max_tokens_per_request: config.max_tokens_per_request,
        },
        config.usage_day_boundary,
    )));

    // Build the analyzer; fails fast if the API credential is missing
    let analyzer = Arc::new(Analyzer::from_config(&config, Arc::clone(&ledger))?);
    info!("Analyzer initialized (model: {})", llm_client::MODEL);

    // Build app state
    let state = AppState {
        db,
        config: config.clone(),
        analyzer,
        ledger,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

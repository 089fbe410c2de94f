pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::dashboard;
use crate::documents;
use crate::state::AppState;

/// Uploads are whole documents; allow up to 10 MiB per request body.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Documents API
        .route(
            "/api/v1/documents",
            post(documents::handlers::handle_upload).get(documents::handlers::handle_list_documents),
        )
        .route(
            "/api/v1/documents/:id",
            get(documents::handlers::handle_get_document),
        )
        .route(
            "/api/v1/documents/:id/requirements",
            get(documents::handlers::handle_get_requirements),
        )
        // Dashboard API
        .route("/api/v1/dashboard/stats", get(dashboard::handlers::handle_stats))
        .route("/api/v1/dashboard/usage", get(dashboard::handlers::handle_usage))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

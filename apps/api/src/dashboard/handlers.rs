use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::documents::handlers::UserIdQuery;
use crate::errors::AppError;
use crate::models::document::DocumentRow;
use crate::state::AppState;
use crate::usage::UsageSummary;

#[derive(Serialize)]
pub struct RecentDocument {
    pub id: Uuid,
    pub filename: String,
    pub status: String,
    pub compliance_score: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct DashboardStats {
    pub total_documents: i64,
    pub completed_documents: i64,
    pub total_requirements: i64,
    pub pending_requirements: i64,
    pub average_compliance_score: Option<i32>,
    pub recent_documents: Vec<RecentDocument>,
}

/// GET /api/v1/dashboard/stats
pub async fn handle_stats(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<DashboardStats>, AppError> {
    let total_documents: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE user_id = $1")
            .bind(params.user_id)
            .fetch_one(&state.db)
            .await?;

    let completed_documents: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM documents WHERE user_id = $1 AND status = 'completed'",
    )
    .bind(params.user_id)
    .fetch_one(&state.db)
    .await?;

    let total_requirements: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM compliance_requirements r
        JOIN documents d ON d.id = r.document_id
        WHERE d.user_id = $1
        "#,
    )
    .bind(params.user_id)
    .fetch_one(&state.db)
    .await?;

    let pending_requirements: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM compliance_requirements r
        JOIN documents d ON d.id = r.document_id
        WHERE d.user_id = $1 AND r.status = 'pending'
        "#,
    )
    .bind(params.user_id)
    .fetch_one(&state.db)
    .await?;

    let average_compliance_score: Option<f64> = sqlx::query_scalar(
        r#"
        SELECT AVG(compliance_score)::float8 FROM documents
        WHERE user_id = $1 AND compliance_score IS NOT NULL
        "#,
    )
    .bind(params.user_id)
    .fetch_one(&state.db)
    .await?;

    let recent: Vec<DocumentRow> = sqlx::query_as(
        "SELECT * FROM documents WHERE user_id = $1 ORDER BY created_at DESC LIMIT 5",
    )
    .bind(params.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(DashboardStats {
        total_documents,
        completed_documents,
        total_requirements,
        pending_requirements,
        average_compliance_score: average_compliance_score.map(|v| v.round() as i32),
        recent_documents: recent
            .into_iter()
            .map(|doc| RecentDocument {
                id: doc.id,
                filename: doc.filename,
                status: doc.status,
                compliance_score: doc.compliance_score,
                created_at: doc.created_at,
            })
            .collect(),
    }))
}

/// GET /api/v1/dashboard/usage
///
/// The ledger's derived view; `remaining_today` is signed and may be
/// negative when usage overran a limit.
pub async fn handle_usage(State(state): State<AppState>) -> Json<UsageSummary> {
    Json(state.ledger.lock().await.summary())
}

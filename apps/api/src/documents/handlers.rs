use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::analysis::AnalysisResult;
use crate::documents::storage::store_upload;
use crate::errors::AppError;
use crate::extraction::{self, format_for_filename};
use crate::models::document::{
    DocumentRow, DocumentStatus, DocumentType, RequirementRow, RequirementStatus,
};
use crate::state::AppState;

/// Confidence attached to stored requirements on insert; neither the model
/// nor the fallback reports one per requirement.
const DEFAULT_CONFIDENCE: f64 = 0.8;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// POST /api/v1/documents
///
/// Multipart fields: `file`, `document_type`, `user_id`. Validates the
/// upload, stores it on disk, then runs extract → analyze → persist inline
/// and returns the completed row. Extraction failure marks the document
/// failed; analysis cannot fail.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<DocumentRow>, AppError> {
    let mut filename: Option<String> = None;
    let mut contents: Option<Vec<u8>> = None;
    let mut document_type_raw: Option<String> = None;
    let mut user_id: Option<Uuid> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("file") => {
                filename = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;
                contents = Some(bytes.to_vec());
            }
            Some("document_type") => {
                document_type_raw = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("failed to read document_type: {e}"))
                })?);
            }
            Some("user_id") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("failed to read user_id: {e}")))?;
                user_id = Some(
                    raw.trim()
                        .parse()
                        .map_err(|_| AppError::Validation("user_id must be a UUID".to_string()))?,
                );
            }
            _ => {}
        }
    }

    let filename =
        filename.ok_or_else(|| AppError::Validation("missing file field".to_string()))?;
    let contents =
        contents.ok_or_else(|| AppError::Validation("missing file field".to_string()))?;
    let document_type_raw = document_type_raw
        .ok_or_else(|| AppError::Validation("missing document_type field".to_string()))?;
    let document_type = DocumentType::parse(&document_type_raw)
        .ok_or_else(|| AppError::Validation(format!("Invalid document type '{document_type_raw}'")))?;
    let user_id = user_id.ok_or_else(|| AppError::Validation("missing user_id field".to_string()))?;

    // Closed-set extension check up front: unsupported uploads are rejected
    // before anything touches disk or the database.
    let format = format_for_filename(&filename)?;

    let file_path =
        store_upload(&state.config.upload_dir, &filename, &contents).map_err(AppError::Internal)?;
    let file_path_str = file_path.to_string_lossy().to_string();

    let document_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO documents (id, user_id, filename, file_path, document_type, status, file_size)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(document_id)
    .bind(user_id)
    .bind(&filename)
    .bind(&file_path_str)
    .bind(document_type.as_str())
    .bind(DocumentStatus::Uploaded.as_str())
    .bind(contents.len() as i64)
    .execute(&state.db)
    .await?;

    // Extraction failure is fatal for this request: without text there is
    // nothing to analyze or fall back on.
    let text = match extraction::extract_text(&file_path, format) {
        Ok(text) => text,
        Err(err) => {
            set_status(&state.db, document_id, DocumentStatus::Failed).await?;
            return Err(err.into());
        }
    };

    sqlx::query("UPDATE documents SET status = $1, extracted_text = $2 WHERE id = $3")
        .bind(DocumentStatus::Processing.as_str())
        .bind(&text)
        .bind(document_id)
        .execute(&state.db)
        .await?;

    let analysis = state.analyzer.analyze(&text, document_type.as_str()).await;
    persist_analysis(&state.db, document_id, &analysis).await?;

    info!(
        %document_id,
        %user_id,
        compliance_score = analysis.compliance_score,
        requirements = analysis.requirements.len(),
        "document analyzed"
    );

    let row = fetch_document(&state.db, document_id, user_id).await?;
    Ok(Json(row))
}

/// GET /api/v1/documents
pub async fn handle_list_documents(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<DocumentRow>>, AppError> {
    let rows: Vec<DocumentRow> =
        sqlx::query_as("SELECT * FROM documents WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(params.user_id)
            .fetch_all(&state.db)
            .await?;
    Ok(Json(rows))
}

/// GET /api/v1/documents/:id
pub async fn handle_get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<DocumentRow>, AppError> {
    let row = fetch_document(&state.db, id, params.user_id).await?;
    Ok(Json(row))
}

/// GET /api/v1/documents/:id/requirements
pub async fn handle_get_requirements(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<RequirementRow>>, AppError> {
    // Ownership check first; requirements carry no user_id of their own.
    fetch_document(&state.db, id, params.user_id).await?;

    let rows: Vec<RequirementRow> = sqlx::query_as(
        "SELECT * FROM compliance_requirements WHERE document_id = $1 ORDER BY created_at",
    )
    .bind(id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

async fn fetch_document(
    db: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<DocumentRow, AppError> {
    let row: Option<DocumentRow> =
        sqlx::query_as("SELECT * FROM documents WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(db)
            .await?;
    row.ok_or_else(|| AppError::NotFound(format!("Document {id} not found")))
}

async fn set_status(db: &PgPool, id: Uuid, status: DocumentStatus) -> Result<(), AppError> {
    sqlx::query("UPDATE documents SET status = $1 WHERE id = $2")
        .bind(status.as_str())
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

async fn persist_analysis(
    db: &PgPool,
    document_id: Uuid,
    analysis: &AnalysisResult,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE documents
        SET status = $1, summary = $2, compliance_score = $3, processed_at = $4
        WHERE id = $5
        "#,
    )
    .bind(DocumentStatus::Completed.as_str())
    .bind(&analysis.summary)
    .bind(analysis.compliance_score)
    .bind(Utc::now())
    .bind(document_id)
    .execute(db)
    .await?;

    for requirement in &analysis.requirements {
        sqlx::query(
            r#"
            INSERT INTO compliance_requirements
                (id, document_id, requirement_text, plain_english, category, priority, status, confidence_score)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(document_id)
        .bind(&requirement.requirement_text)
        .bind(&requirement.plain_english)
        .bind(&requirement.category)
        .bind(requirement.priority.as_str())
        .bind(RequirementStatus::Pending.as_str())
        .bind(DEFAULT_CONFIDENCE)
        .execute(db)
        .await?;
    }

    Ok(())
}

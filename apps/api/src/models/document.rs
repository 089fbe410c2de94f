#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Kind of document being analyzed. Drives prompt wording only; the
/// analysis pipeline itself is type-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Regulation,
    Policy,
    Terms,
    Contract,
    Other,
}

impl DocumentType {
    /// Case-insensitive parse of the client-supplied type tag.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "regulation" => Some(Self::Regulation),
            "policy" => Some(Self::Policy),
            "terms" => Some(Self::Terms),
            "contract" => Some(Self::Contract),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regulation => "regulation",
            Self::Policy => "policy",
            Self::Terms => "terms",
            Self::Contract => "contract",
            Self::Other => "other",
        }
    }
}

/// Document lifecycle: UPLOADED → PROCESSING → {COMPLETED, FAILED}.
/// PROCESSING begins once text extraction succeeds. Analysis itself never
/// fails a document (the orchestrator always returns a result), so FAILED
/// is reachable only from extraction or persistence errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Uploaded,
    Processing,
    Completed,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Workflow status of a stored requirement; new rows start pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementStatus {
    Pending,
    InProgress,
    Completed,
}

impl RequirementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub file_path: String,
    pub document_type: String,
    pub status: String,
    pub file_size: Option<i64>,
    /// Kept server-side for reprocessing; not part of API responses.
    #[serde(skip_serializing, default)]
    pub extracted_text: Option<String>,
    pub summary: Option<String>,
    pub compliance_score: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RequirementRow {
    pub id: Uuid,
    pub document_id: Uuid,
    pub requirement_text: String,
    pub plain_english: String,
    pub category: Option<String>,
    pub priority: String,
    pub status: String,
    pub confidence_score: Option<f64>,
    pub source_section: Option<String>,
    pub created_at: DateTime<Utc>,
}

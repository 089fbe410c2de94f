//! Response Parser — turns raw model output into a validated
//! `AnalysisResult`, defensive against prose, code fences, and missing or
//! mistyped fields.

use serde_json::Value;
use thiserror::Error;

use crate::analysis::{AnalysisResult, Requirement, RequirementPriority};

/// Placeholder used when the model omits the summary field.
const DEFAULT_SUMMARY: &str = "Document analyzed successfully";
const DEFAULT_SCORE: i64 = 50;
const DEFAULT_CATEGORY: &str = "general";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON object found in model output")]
    NoJsonObject,

    #[error("model output is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Parses raw model output into an `AnalysisResult`.
///
/// The model is instructed to reply with a single JSON object but may wrap
/// it in prose or markdown fences anyway; the first-`{` to last-`}` span is
/// tried first, then the whole text. Missing fields take documented
/// defaults. `compliance_score` is deliberately not range-clamped: the
/// model is the source of truth for the number, so out-of-range values
/// pass through for callers to observe.
pub fn parse(raw_text: &str) -> Result<AnalysisResult, ParseError> {
    let value = locate_json(raw_text)?;
    let object = value.as_object().ok_or(ParseError::NoJsonObject)?;

    let summary = object
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_SUMMARY)
        .to_string();

    let compliance_score = object
        .get("compliance_score")
        .and_then(coerce_int)
        .unwrap_or(DEFAULT_SCORE) as i32;

    let requirements = object
        .get("requirements")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(parse_requirement).collect())
        .unwrap_or_default();

    Ok(AnalysisResult {
        summary,
        compliance_score,
        requirements,
    })
}

/// Extracts the widest `{...}` span (greedy, tolerating surrounding text)
/// and decodes it; falls back to decoding the whole text when no span
/// exists. `{` and `}` are single-byte ASCII, so the byte indices from
/// `find`/`rfind` are always valid slice boundaries.
fn locate_json(raw_text: &str) -> Result<Value, ParseError> {
    if let (Some(start), Some(end)) = (raw_text.find('{'), raw_text.rfind('}')) {
        if start < end {
            return serde_json::from_str(&raw_text[start..=end]).map_err(ParseError::InvalidJson);
        }
    }
    serde_json::from_str(raw_text.trim()).map_err(|_| ParseError::NoJsonObject)
}

fn parse_requirement(item: &Value) -> Requirement {
    Requirement {
        requirement_text: string_field(item, "requirement_text"),
        plain_english: string_field(item, "plain_english"),
        category: item
            .get("category")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_CATEGORY)
            .to_string(),
        priority: item
            .get("priority")
            .and_then(Value::as_str)
            .map(RequirementPriority::parse_lenient)
            .unwrap_or_default(),
    }
}

fn string_field(item: &Value, key: &str) -> String {
    item.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Integer coercion for fields the model sometimes emits as floats or
/// numeric strings.
fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

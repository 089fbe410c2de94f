//! Compliance analysis pipeline: orchestrator, response parser, fallback
//! synthesizer, and the shared output types they all produce.

pub mod fallback;
pub mod orchestrator;
pub mod parser;
pub mod prompts;

use serde::{Deserialize, Serialize};

/// Priority of a single compliance requirement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementPriority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl RequirementPriority {
    /// Case-normalized parse that never fails: any unrecognized label maps
    /// to `Medium`. The model emits free text, so a bad label must not be
    /// able to fail the pipeline.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// A single itemized requirement extracted from a document. Immutable once
/// constructed; produced by the parser or the fallback synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub requirement_text: String,
    pub plain_english: String,
    pub category: String,
    pub priority: RequirementPriority,
}

/// Normalized output of the analysis pipeline and the only type handed to
/// persistence. `compliance_score` is whatever the producing path said:
/// the model path does not range-check it, the fallback path stays within
/// [30, 70] by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub compliance_score: i32,
    pub requirements: Vec<Requirement>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_parse_lenient_known_values() {
        assert_eq!(
            RequirementPriority::parse_lenient("critical"),
            RequirementPriority::Critical
        );
        assert_eq!(
            RequirementPriority::parse_lenient("HIGH"),
            RequirementPriority::High
        );
        assert_eq!(
            RequirementPriority::parse_lenient("  Low "),
            RequirementPriority::Low
        );
    }

    #[test]
    fn test_priority_parse_lenient_unknown_defaults_to_medium() {
        assert_eq!(
            RequirementPriority::parse_lenient("urgent"),
            RequirementPriority::Medium
        );
        assert_eq!(
            RequirementPriority::parse_lenient(""),
            RequirementPriority::Medium
        );
    }

    #[test]
    fn test_priority_serde_is_lowercase() {
        let json = serde_json::to_string(&RequirementPriority::Critical).unwrap();
        assert_eq!(json, r#""critical""#);
        let back: RequirementPriority = serde_json::from_str(r#""medium""#).unwrap();
        assert_eq!(back, RequirementPriority::Medium);
    }

    #[test]
    fn test_analysis_result_round_trips_through_serde() {
        let result = AnalysisResult {
            summary: "A policy document".to_string(),
            compliance_score: 85,
            requirements: vec![Requirement {
                requirement_text: "Data must be encrypted at rest".to_string(),
                plain_english: "Store data in encrypted form".to_string(),
                category: "security".to_string(),
                priority: RequirementPriority::High,
            }],
        };
        let json = serde_json::to_string(&result).unwrap();
        let back: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}

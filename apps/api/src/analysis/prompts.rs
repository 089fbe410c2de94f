// Prompt constants for the compliance analysis pipeline.
// Cross-cutting fragments live in llm_client::prompts.

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;

/// Role half of the system prompt; combined with the shared JSON-only rule
/// in `analysis_system`.
pub const ANALYSIS_ROLE: &str = "You are a compliance expert. \
    Analyze documents for regulatory requirements and provide clear, actionable guidance.";

/// Hard cap on document characters embedded in the prompt, guarding the
/// per-call token budget against oversized inputs. Counted in characters,
/// not bytes, so multi-byte text can never split a code point.
pub const MAX_DOCUMENT_CHARS: usize = 4000;

/// Analysis prompt template. `{document_type}` and `{document_text}` are
/// substituted in `build_analysis_prompt`.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze this {document_type} document for compliance requirements.

Document text:
{document_text}

Provide your analysis as a single JSON object with this EXACT schema (no extra fields):
{
  "summary": "Brief 2-3 sentence summary of the document",
  "compliance_score": 75,
  "requirements": [
    {
      "requirement_text": "Original requirement from document",
      "plain_english": "Simple explanation of what this means",
      "category": "data_protection",
      "priority": "high"
    }
  ]
}

Focus on:
- Legal obligations and requirements
- Compliance deadlines
- Data protection requirements
- User rights and responsibilities
- Security requirements

Priority levels: critical, high, medium, low
Categories: data_protection, security, legal, operational, user_rights

Respond only with valid JSON."#;

/// Full system prompt for analysis calls.
pub fn analysis_system() -> String {
    format!("{ANALYSIS_ROLE} {JSON_ONLY_SYSTEM}")
}

/// Builds the analysis prompt, truncating the document to its first
/// `MAX_DOCUMENT_CHARS` characters. The type placeholder is substituted
/// before the text so document content can never be re-scanned for it.
pub fn build_analysis_prompt(document_type: &str, text: &str) -> String {
    let truncated: String = text.chars().take(MAX_DOCUMENT_CHARS).collect();
    ANALYSIS_PROMPT_TEMPLATE
        .replace("{document_type}", document_type)
        .replace("{document_text}", &truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_type_and_text() {
        let prompt = build_analysis_prompt("contract", "The tenant shall pay rent monthly.");
        assert!(prompt.contains("Analyze this contract document"));
        assert!(prompt.contains("The tenant shall pay rent monthly."));
    }

    #[test]
    fn test_prompt_truncates_to_char_budget() {
        let text = "x".repeat(MAX_DOCUMENT_CHARS + 1000);
        let prompt = build_analysis_prompt("policy", &text);
        assert!(prompt.contains(&"x".repeat(MAX_DOCUMENT_CHARS)));
        assert!(!prompt.contains(&"x".repeat(MAX_DOCUMENT_CHARS + 1)));
    }

    #[test]
    fn test_prompt_truncation_counts_chars_not_bytes() {
        // 3-byte code points: 4000 of them exceed the budget in bytes but
        // not in characters, so all must survive.
        let text = "€".repeat(MAX_DOCUMENT_CHARS);
        let prompt = build_analysis_prompt("terms", &text);
        assert!(prompt.contains(&text));
    }

    #[test]
    fn test_short_text_is_untouched() {
        let prompt = build_analysis_prompt("regulation", "short");
        assert!(prompt.contains("short"));
    }

    #[test]
    fn test_system_prompt_enforces_json_only() {
        let system = analysis_system();
        assert!(system.contains("compliance expert"));
        assert!(system.contains("valid JSON only"));
    }
}

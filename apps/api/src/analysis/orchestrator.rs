//! Analysis Orchestrator — the total pipeline from raw text to an
//! `AnalysisResult`. Once text exists, analysis cannot fail: every obstacle
//! past that point degrades to the fallback synthesizer instead of
//! surfacing an error.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::analysis::fallback::synthesize;
use crate::analysis::parser;
use crate::analysis::prompts::{analysis_system, build_analysis_prompt};
use crate::analysis::AnalysisResult;
use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::{CompletionModel, LlmClient};
use crate::usage::UsageLedger;

pub struct Analyzer {
    model: Arc<dyn CompletionModel>,
    ledger: Arc<Mutex<UsageLedger>>,
    system: String,
}

impl Analyzer {
    /// Builds the production analyzer. Fails fast when the API credential
    /// is missing: a service that silently never calls the model is worse
    /// than one that refuses to start.
    pub fn from_config(
        config: &Config,
        ledger: Arc<Mutex<UsageLedger>>,
    ) -> Result<Self, AppError> {
        if config.anthropic_api_key.trim().is_empty() {
            return Err(AppError::Misconfigured(
                "ANTHROPIC_API_KEY is empty".to_string(),
            ));
        }
        let client = LlmClient::new(
            config.anthropic_api_key.clone(),
            config.max_tokens_per_request,
        );
        Ok(Self::new(Arc::new(client), ledger))
    }

    /// Assembles an analyzer around any completion backend.
    pub fn new(model: Arc<dyn CompletionModel>, ledger: Arc<Mutex<UsageLedger>>) -> Self {
        Self {
            model,
            ledger,
            system: analysis_system(),
        }
    }

    /// Analyzes `text` for compliance requirements. Always returns a
    /// result.
    ///
    /// The ledger is mutated at most once per call, and only after a
    /// successful external response; the gated and failed paths consume no
    /// quota. Every fallback invocation receives the pre-truncation
    /// original text, never the model's reply.
    pub async fn analyze(&self, text: &str, document_type: &str) -> AnalysisResult {
        let decision = self.ledger.lock().await.can_make_request();
        if !decision.allowed {
            warn!("API usage limit reached: {}", decision.reason);
            return synthesize(text, document_type);
        }

        let prompt = build_analysis_prompt(document_type, text);
        let completion = match self.model.complete(&prompt, &self.system).await {
            Ok(completion) => completion,
            Err(err) => {
                warn!("model call failed, using fallback analysis: {err}");
                return synthesize(text, document_type);
            }
        };

        if let Err(err) = self
            .ledger
            .lock()
            .await
            .record_usage(completion.total_tokens())
        {
            // The call already happened and the reply may be usable; losing
            // one flush must not discard it. Counters stay correct in memory.
            error!("failed to persist usage ledger: {err:#}");
        }

        match parser::parse(&completion.text) {
            Ok(result) => {
                info!(
                    compliance_score = result.compliance_score,
                    requirements = result.requirements.len(),
                    "model analysis parsed"
                );
                result
            }
            Err(err) => {
                warn!("model response unparsable, using fallback analysis: {err}");
                synthesize(text, document_type)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;

    use crate::analysis::prompts::MAX_DOCUMENT_CHARS;
    use crate::llm_client::{Completion, LlmError};
    use crate::usage::store::UsageStore;
    use crate::usage::{DayBoundary, UsageLimits};

    const VALID_REPLY: &str = r#"{"summary":"S","compliance_score":42,"requirements":[{"requirement_text":"R","plain_english":"P","category":"legal","priority":"high"}]}"#;

    enum Behavior {
        Reply(&'static str),
        Fail,
    }

    /// Scripted backend: counts calls and captures prompts so tests can
    /// assert what did (or did not) reach the model.
    struct ScriptedModel {
        behavior: Behavior,
        calls: AtomicUsize,
        prompts: StdMutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: AtomicUsize::new(0),
                prompts: StdMutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_prompt(&self) -> String {
            self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl CompletionModel for ScriptedModel {
        async fn complete(&self, prompt: &str, _system: &str) -> Result<Completion, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.behavior {
                Behavior::Reply(text) => Ok(Completion {
                    text: text.to_string(),
                    input_tokens: 120,
                    output_tokens: 80,
                }),
                Behavior::Fail => Err(LlmError::Api {
                    status: 529,
                    message: "overloaded".to_string(),
                }),
            }
        }
    }

    fn ledger_in(
        dir: &tempfile::TempDir,
        max_daily_requests: u64,
    ) -> Arc<Mutex<UsageLedger>> {
        Arc::new(Mutex::new(UsageLedger::load(
            UsageStore::new(dir.path().join("usage_tracking.json")),
            UsageLimits {
                max_daily_requests,
                daily_token_limit: 100_000,
                max_tokens_per_request: 2000,
            },
            DayBoundary::Utc,
        )))
    }

    #[tokio::test]
    async fn test_exhausted_budget_skips_model_entirely() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(&dir, 0);
        let model = ScriptedModel::new(Behavior::Reply(VALID_REPLY));
        let analyzer = Analyzer::new(model.clone(), Arc::clone(&ledger));

        let result = analyzer.analyze("some policy text", "policy").await;

        assert_eq!(model.call_count(), 0);
        assert_eq!(result.requirements.len(), 1);
        assert_eq!(result.requirements[0].category, "manual_review");
        // The gated path risks no tokens and records nothing.
        assert_eq!(ledger.lock().await.summary().today.requests, 0);
    }

    #[tokio::test]
    async fn test_successful_call_parses_reply_and_records_usage() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(&dir, 50);
        let model = ScriptedModel::new(Behavior::Reply(VALID_REPLY));
        let analyzer = Analyzer::new(model.clone(), Arc::clone(&ledger));

        let result = analyzer.analyze("some contract text", "contract").await;

        assert_eq!(model.call_count(), 1);
        assert_eq!(result.summary, "S");
        assert_eq!(result.compliance_score, 42);

        let summary = ledger.lock().await.summary();
        assert_eq!(summary.today.requests, 1);
        assert_eq!(summary.today.tokens, 200);
    }

    #[tokio::test]
    async fn test_model_failure_falls_back_without_recording() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(&dir, 50);
        let model = ScriptedModel::new(Behavior::Fail);
        let analyzer = Analyzer::new(model.clone(), Arc::clone(&ledger));

        let result = analyzer.analyze("one two three four", "terms").await;

        assert_eq!(model.call_count(), 1);
        assert_eq!(result.requirements[0].category, "manual_review");
        // A failed call returned no token count; nothing to record.
        assert_eq!(ledger.lock().await.summary().today.requests, 0);
    }

    #[tokio::test]
    async fn test_garbled_reply_falls_back_but_still_records_usage() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(&dir, 50);
        let model = ScriptedModel::new(Behavior::Reply("I cannot produce JSON, sorry."));
        let analyzer = Analyzer::new(model.clone(), Arc::clone(&ledger));

        let result = analyzer.analyze("alpha beta gamma delta epsilon zeta", "policy").await;

        // The call completed, so its tokens count against the budget even
        // though the reply was useless.
        let summary = ledger.lock().await.summary();
        assert_eq!(summary.today.requests, 1);
        assert_eq!(summary.today.tokens, 200);

        // Fallback synthesized from the original six-word input, not from
        // the model's reply.
        assert_eq!(
            result.summary,
            "Document uploaded and processed. Contains approximately 6 words."
        );
        assert_eq!(result.requirements[0].category, "manual_review");
    }

    #[tokio::test]
    async fn test_fallback_receives_pre_truncation_original_text() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(&dir, 50);
        let model = ScriptedModel::new(Behavior::Reply("not json"));
        let analyzer = Analyzer::new(model.clone(), Arc::clone(&ledger));

        // 1200 four-char words with separators = 5999 chars: past the cap.
        let text = vec!["word"; 1200].join(" ");
        let result = analyzer.analyze(&text, "contract").await;

        // Had the fallback seen the truncated text, the count would be 800.
        assert_eq!(
            result.summary,
            "Document uploaded and processed. Contains approximately 1200 words."
        );
    }

    #[tokio::test]
    async fn test_prompt_carries_only_the_first_4000_chars() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(&dir, 50);
        let model = ScriptedModel::new(Behavior::Reply(VALID_REPLY));
        let analyzer = Analyzer::new(model.clone(), Arc::clone(&ledger));

        let text = "x".repeat(MAX_DOCUMENT_CHARS + 500);
        analyzer.analyze(&text, "regulation").await;

        let prompt = model.last_prompt();
        assert!(prompt.contains(&"x".repeat(MAX_DOCUMENT_CHARS)));
        assert!(!prompt.contains(&"x".repeat(MAX_DOCUMENT_CHARS + 1)));
        assert!(prompt.contains("regulation"));
    }

    #[tokio::test]
    async fn test_from_config_rejects_blank_credential() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(&dir, 50);
        let config = Config {
            database_url: "postgres://localhost/compliance".to_string(),
            anthropic_api_key: "   ".to_string(),
            port: 8080,
            rust_log: "info".to_string(),
            upload_dir: "uploads".to_string(),
            usage_file: "usage_tracking.json".to_string(),
            max_daily_requests: 50,
            daily_token_limit: 100_000,
            max_tokens_per_request: 2000,
            usage_day_boundary: DayBoundary::Local,
        };

        let result = Analyzer::from_config(&config, ledger);
        assert!(matches!(result.err(), Some(AppError::Misconfigured(_))));
    }
}

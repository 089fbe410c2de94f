use anyhow::{Context, Result};

use crate::usage::DayBoundary;

/// Application configuration loaded from environment variables.
/// Startup aborts with a named error if a required variable is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Directory uploaded files are stored under; created at startup.
    pub upload_dir: String,
    /// Path of the durable usage counter store.
    pub usage_file: String,
    /// Ceiling on model requests per calendar day.
    pub max_daily_requests: u64,
    /// Ceiling on tokens consumed per calendar day.
    pub daily_token_limit: u64,
    /// max_tokens handed to the model on each call.
    pub max_tokens_per_request: u32,
    /// Which calendar ("local" or "utc") the daily counters reset on.
    pub usage_day_boundary: DayBoundary,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            usage_file: std::env::var("USAGE_FILE")
                .unwrap_or_else(|_| "usage_tracking.json".to_string()),
            max_daily_requests: parse_env("MAX_DAILY_REQUESTS", 50)?,
            daily_token_limit: parse_env("DAILY_TOKEN_LIMIT", 100_000)?,
            max_tokens_per_request: parse_env("MAX_TOKENS_PER_REQUEST", 2000)?,
            usage_day_boundary: day_boundary_env()?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn day_boundary_env() -> Result<DayBoundary> {
    match std::env::var("USAGE_DAY_BOUNDARY") {
        Ok(raw) => DayBoundary::parse(&raw)
            .with_context(|| format!("USAGE_DAY_BOUNDARY must be 'local' or 'utc', got '{raw}'")),
        Err(_) => Ok(DayBoundary::default()),
    }
}

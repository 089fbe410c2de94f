//! Durable JSON store backing the usage ledger.
//!
//! On-disk layout, kept stable for inspection and debugging:
//! `{"daily_usage": {"<ISO-date>": {"requests": N, "tokens": N}},
//!   "total_requests": N, "total_tokens": N}`

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Counters for a single calendar day. Monotonically non-decreasing within
/// the day; never reset retroactively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayUsage {
    pub requests: u64,
    pub tokens: u64,
}

/// The full persisted ledger document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageData {
    pub daily_usage: BTreeMap<String, DayUsage>,
    pub total_requests: u64,
    pub total_tokens: u64,
}

/// File-backed store. Every ledger mutation is flushed through `save`
/// before the mutating call returns; crash-safety is preferred over
/// throughput here.
#[derive(Debug, Clone)]
pub struct UsageStore {
    path: PathBuf,
}

impl UsageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads the persisted document. A missing file yields an empty ledger;
    /// an unreadable or corrupt file is logged and treated as empty rather
    /// than refusing to start.
    pub fn load(&self) -> UsageData {
        if !self.path.exists() {
            return UsageData::default();
        }
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(
                    "failed to read usage store {}, starting empty: {err}",
                    self.path.display()
                );
                return UsageData::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(data) => data,
            Err(err) => {
                warn!(
                    "usage store {} is corrupt, starting empty: {err}",
                    self.path.display()
                );
                UsageData::default()
            }
        }
    }

    /// Writes the full document synchronously.
    pub fn save(&self, data: &UsageData) -> Result<()> {
        let raw =
            serde_json::to_string_pretty(data).context("failed to serialize usage data")?;
        fs::write(&self.path, raw)
            .with_context(|| format!("failed to write usage store {}", self.path.display()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

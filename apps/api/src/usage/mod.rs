//! Usage Ledger — daily and lifetime request/token counters, gate-checked
//! before every paid model call and flushed to disk after every mutation.

pub mod store;

use anyhow::Result;
use chrono::{Local, Utc};
use serde::Serialize;
use tracing::info;

use crate::usage::store::{DayUsage, UsageData, UsageStore};

/// Which calendar the daily counters reset on. The limits come from a
/// per-day dollar budget, so the boundary is a config knob rather than
/// being pinned to one timezone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DayBoundary {
    #[default]
    Local,
    Utc,
}

impl DayBoundary {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "local" => Some(Self::Local),
            "utc" => Some(Self::Utc),
            _ => None,
        }
    }

    /// ISO calendar date used as the daily counter key.
    fn today_key(&self) -> String {
        match self {
            Self::Local => Local::now().date_naive().to_string(),
            Self::Utc => Utc::now().date_naive().to_string(),
        }
    }
}

/// Ceilings the gate check enforces.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct UsageLimits {
    pub max_daily_requests: u64,
    pub daily_token_limit: u64,
    /// Not enforced by the gate; passed to the model as its max_tokens.
    pub max_tokens_per_request: u32,
}

/// Outcome of a gate check. Computed fresh from the counters on every
/// check, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct BudgetDecision {
    pub allowed: bool,
    pub reason: String,
}

/// Signed headroom left today. Negative values mean usage ran past a limit
/// (concurrent calls near the ceiling, or a manual store edit) and are
/// reported as-is: clamping would hide the diagnostic.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RemainingToday {
    pub requests: i64,
    pub tokens: i64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LifetimeUsage {
    pub requests: u64,
    pub tokens: u64,
}

/// Read-only view over the ledger for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct UsageSummary {
    pub today: DayUsage,
    pub limits: UsageLimits,
    pub lifetime: LifetimeUsage,
    pub remaining_today: RemainingToday,
}

/// The ledger proper. Owned behind `Arc<Mutex<_>>` in `AppState`, which
/// serializes mutation. The gate check and the post-call increment are
/// separate critical sections: two requests in flight can both pass the
/// gate right at a ceiling. Counters only ever grow within a day.
#[derive(Debug)]
pub struct UsageLedger {
    data: UsageData,
    limits: UsageLimits,
    boundary: DayBoundary,
    store: UsageStore,
}

impl UsageLedger {
    /// Loads persisted counters from `store`, or starts empty.
    pub fn load(store: UsageStore, limits: UsageLimits, boundary: DayBoundary) -> Self {
        let data = store.load();
        info!(
            total_requests = data.total_requests,
            total_tokens = data.total_tokens,
            "usage ledger loaded from {}",
            store.path().display()
        );
        Self {
            data,
            limits,
            boundary,
            store,
        }
    }

    fn today(&self) -> DayUsage {
        self.data
            .daily_usage
            .get(&self.boundary.today_key())
            .copied()
            .unwrap_or_default()
    }

    /// Gate check: pure read, no side effect. Denies once either daily
    /// ceiling is reached; the reason names every tripped ceiling.
    pub fn can_make_request(&self) -> BudgetDecision {
        let today = self.today();
        let mut tripped = Vec::new();
        if today.requests >= self.limits.max_daily_requests {
            tripped.push(format!(
                "Daily request limit ({})",
                self.limits.max_daily_requests
            ));
        }
        if today.tokens >= self.limits.daily_token_limit {
            tripped.push(format!(
                "Daily token limit ({})",
                self.limits.daily_token_limit
            ));
        }
        if tripped.is_empty() {
            BudgetDecision {
                allowed: true,
                reason: "OK".to_string(),
            }
        } else {
            BudgetDecision {
                allowed: false,
                reason: format!("{} exceeded", tripped.join(" and ")),
            }
        }
    }

    /// Records one completed external call and flushes the store. Must be
    /// called exactly once per completed call, never for a gated call or
    /// one that failed before returning a token count.
    pub fn record_usage(&mut self, tokens_used: u64) -> Result<()> {
        let key = self.boundary.today_key();
        let day = self.data.daily_usage.entry(key).or_default();
        day.requests += 1;
        day.tokens += tokens_used;
        self.data.total_requests += 1;
        self.data.total_tokens += tokens_used;
        self.store.save(&self.data)
    }

    /// Derived view for the dashboard; `remaining_today` is signed and not
    /// clamped.
    pub fn summary(&self) -> UsageSummary {
        let today = self.today();
        UsageSummary {
            today,
            limits: self.limits,
            lifetime: LifetimeUsage {
                requests: self.data.total_requests,
                tokens: self.data.total_tokens,
            },
            remaining_today: RemainingToday {
                requests: self.limits.max_daily_requests as i64 - today.requests as i64,
                tokens: self.limits.daily_token_limit as i64 - today.tokens as i64,
            },
        }
    }
}

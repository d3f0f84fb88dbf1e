//! Activity log collaborator.
//!
//! The payment engine records who did what after each committed change.
//! Recording is best-effort: callers log a failure and move on, a write
//! error never rolls back a committed payment.

use std::sync::Mutex;

use anyhow::Result;
use chrono::{DateTime, Utc};
use desk_schemas::Actor;
use serde::{Deserialize, Serialize};
use serde_json::Value;

mod chain;
mod jsonl;

pub use chain::{compute_entry_hash, verify_hash_chain, verify_hash_chain_str, VerifyResult};
pub use jsonl::JsonlActivityLog;

#[async_trait::async_trait]
pub trait ActivityLog: Send + Sync {
    async fn record(&self, actor: &Actor, action: &str, details: Value) -> Result<()>;
}

/// One line of the JSONL activity log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub seq: u64,
    pub ts_utc: DateTime<Utc>,
    pub user_id: i64,
    pub role: String,
    pub action: String,
    pub details: Value,
    pub hash_prev: Option<String>,
    pub hash_self: Option<String>,
}

/// Keeps entries in memory. Used by tests and by tooling that wants to
/// inspect what an operation would have recorded.
#[derive(Debug, Default)]
pub struct MemoryActivityLog {
    entries: Mutex<Vec<(Actor, String, Value)>>,
}

impl MemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Actor, String, Value)> {
        match self.entries.lock() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn actions(&self) -> Vec<String> {
        self.entries().into_iter().map(|(_, a, _)| a).collect()
    }
}

#[async_trait::async_trait]
impl ActivityLog for MemoryActivityLog {
    async fn record(&self, actor: &Actor, action: &str, details: Value) -> Result<()> {
        let mut g = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("activity log mutex poisoned"))?;
        g.push((actor.clone(), action.to_string(), details));
        Ok(())
    }
}

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use desk_schemas::Actor;
use serde_json::Value;

use crate::chain::{canonical_json_line, compute_entry_hash};
use crate::{ActivityEntry, ActivityLog};

struct ChainState {
    last_hash: Option<String>,
    seq: u64,
}

/// Append-only JSON Lines activity log, one entry per line.
///
/// With `hash_chain` on, every entry carries `hash_prev` (the previous
/// entry's `hash_self`) and its own `hash_self`. Opening an existing file
/// resumes the chain from its last entry.
pub struct JsonlActivityLog {
    path: PathBuf,
    hash_chain: bool,
    state: Mutex<ChainState>,
}

impl JsonlActivityLog {
    /// Opens (or creates) the log and ensures parent dirs exist.
    pub fn open(path: impl AsRef<Path>, hash_chain: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create_dir_all {:?}", parent))?;
            }
        }

        let (last_hash, seq) = match last_entry(&path)? {
            Some(e) => (e.hash_self, e.seq + 1),
            None => (None, 0),
        };

        tracing::debug!(path = %path.display(), seq, "activity log opened");

        Ok(Self {
            path,
            hash_chain,
            state: Mutex::new(ChainState { last_hash, seq }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry synchronously. The lock is held across the write so
    /// concurrent callers cannot interleave chain links.
    pub fn append(&self, actor: &Actor, action: &str, details: Value) -> Result<ActivityEntry> {
        let mut st = self
            .state
            .lock()
            .map_err(|_| anyhow!("activity log mutex poisoned"))?;

        let mut entry = ActivityEntry {
            seq: st.seq,
            ts_utc: Utc::now(),
            user_id: actor.user_id,
            role: actor.role.clone(),
            action: action.to_string(),
            details,
            hash_prev: None,
            hash_self: None,
        };

        if self.hash_chain {
            entry.hash_prev = st.last_hash.clone();
            entry.hash_self = Some(compute_entry_hash(&entry)?);
        }

        let line = canonical_json_line(&entry)?;
        append_line(&self.path, &line)?;

        st.seq += 1;
        if self.hash_chain {
            st.last_hash = entry.hash_self.clone();
        }
        Ok(entry)
    }
}

#[async_trait::async_trait]
impl ActivityLog for JsonlActivityLog {
    async fn record(&self, actor: &Actor, action: &str, details: Value) -> Result<()> {
        self.append(actor, action, details).map(|_| ())
    }
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open activity log {:?}", path))?;
    // Record and newline go out in one write.
    let mut record = String::with_capacity(line.len() + 1);
    record.push_str(line);
    record.push('\n');
    f.write_all(record.as_bytes())
        .context("write activity line failed")?;
    Ok(())
}

fn last_entry(path: &Path) -> Result<Option<ActivityEntry>> {
    if !path.exists() {
        return Ok(None);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("read activity log {:?}", path))?;
    let Some(line) = content.lines().rev().find(|l| !l.trim().is_empty()) else {
        return Ok(None);
    };
    let entry: ActivityEntry = serde_json::from_str(line.trim())
        .with_context(|| format!("parse last entry of activity log {:?}", path))?;
    Ok(Some(entry))
}

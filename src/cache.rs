use crate::store::KvStore;
use crate::types::FileRecord;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, warn};

/// Reserved key for the address history. Never a valid CID.
pub const HISTORY_KEY: &str = "search_history";
pub const MAX_HISTORY: usize = 10;

/// Local mirror of fetched file records plus the recent-address history.
///
/// The mirror is best-effort: callers log failures and carry on.
#[derive(Clone)]
pub struct FileCache {
    store: Arc<dyn KvStore>,
}

impl FileCache {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn save_file(&self, record: &FileRecord) -> Result<()> {
        let v = serde_json::to_value(record).context("encode file record")?;
        self.store.put(&record.cid, &v)
    }

    pub fn get_file(&self, cid: &str) -> Result<Option<FileRecord>> {
        if cid == HISTORY_KEY {
            return Ok(None);
        }
        match self.store.get(cid)? {
            Some(v) => Ok(Some(serde_json::from_value(v).context("decode file record")?)),
            None => Ok(None),
        }
    }

    /// Every mirrored record. Entries that fail to decode are skipped.
    pub fn all_files(&self) -> Result<Vec<FileRecord>> {
        let mut out = Vec::new();
        for key in self.store.list_keys()? {
            if key == HISTORY_KEY {
                continue;
            }
            match self.get_file(&key) {
                Ok(Some(r)) => out.push(r),
                Ok(None) => {}
                Err(e) => debug!(key = %key, error = %e, "skipping unreadable cache entry"),
            }
        }
        Ok(out)
    }

    pub fn delete_file(&self, cid: &str) -> Result<()> {
        if cid == HISTORY_KEY {
            return Ok(());
        }
        self.store.delete(cid)
    }

    /// Most-recent-first list of submitted addresses. Empty on any failure.
    pub fn history(&self) -> Vec<String> {
        match self.store.get(HISTORY_KEY) {
            Ok(Some(v)) => serde_json::from_value(v).unwrap_or_else(|e| {
                warn!(error = %e, "history entry is malformed");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read search history");
                Vec::new()
            }
        }
    }

    /// Moves `address` to the front of the history and returns the new list.
    pub fn add_to_history(&self, address: &str) -> Vec<String> {
        let history = push_history(self.history(), address, MAX_HISTORY);
        if let Err(e) = self.store.put(HISTORY_KEY, &serde_json::json!(history)) {
            warn!(error = %e, "failed to persist search history");
        }
        history
    }

    pub fn clear_history(&self) {
        if let Err(e) = self.store.delete(HISTORY_KEY) {
            warn!(error = %e, "failed to clear search history");
        }
    }
}

/// Dedup, prepend, bound.
pub fn push_history(mut history: Vec<String>, address: &str, max: usize) -> Vec<String> {
    history.retain(|a| a != address);
    history.insert(0, address.to_string());
    history.truncate(max);
    history
}

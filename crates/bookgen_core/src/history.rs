//! Bounded, newest-first record of completed generations.

use std::sync::Mutex;

use bookgen_logging::{bookgen_info, bookgen_warn};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::JobHandle;

/// Maximum number of entries kept; older ones are evicted silently.
pub const HISTORY_CAPACITY: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: JobHandle,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub result_location: Url,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryLedger {
    entries: Vec<HistoryEntry>,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger from stored entries, keeping the first occurrence of
    /// each id and at most [`HISTORY_CAPACITY`] entries.
    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        let mut kept: Vec<HistoryEntry> = Vec::with_capacity(HISTORY_CAPACITY);
        for entry in entries {
            if kept.len() == HISTORY_CAPACITY {
                break;
            }
            if kept.iter().all(|existing| existing.id != entry.id) {
                kept.push(entry);
            }
        }
        Self { entries: kept }
    }

    /// Prepends `entry`, replacing any older entry with the same id, then
    /// truncates to capacity.
    pub fn add(&mut self, entry: HistoryEntry) {
        self.entries.retain(|existing| existing.id != entry.id);
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_CAPACITY);
    }

    /// Returns whether anything was removed. Unknown ids are a no-op.
    pub fn remove(&mut self, id: &JobHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| &entry.id != id);
        self.entries.len() != before
    }

    pub fn get(&self, id: &JobHandle) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    pub fn list(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored history is corrupt: {0}")]
    Corrupt(String),
    #[error("history storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable backing for the ledger. Read once at startup, rewritten in full on
/// every mutation.
pub trait HistoryStore: Send + Sync {
    fn load(&self) -> Result<Vec<HistoryEntry>, PersistenceError>;
    fn save(&self, entries: &[HistoryEntry]) -> Result<(), PersistenceError>;
}

/// Reads the ledger from `store`. Failures degrade to an empty ledger.
pub fn load_ledger(store: &dyn HistoryStore) -> HistoryLedger {
    match store.load() {
        Ok(entries) => {
            let ledger = HistoryLedger::from_entries(entries);
            bookgen_info!("Loaded {} history entries", ledger.len());
            ledger
        }
        Err(err) => {
            bookgen_warn!("Failed to load history, starting empty: {}", err);
            HistoryLedger::new()
        }
    }
}

/// In-process store, mainly for tests and for running without a data dir.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    entries: Mutex<Option<Vec<HistoryEntry>>>,
    corrupt: bool,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<HistoryEntry>) -> Self {
        Self {
            entries: Mutex::new(Some(entries)),
            corrupt: false,
        }
    }

    /// A store whose contents cannot be decoded.
    pub fn corrupt() -> Self {
        Self {
            entries: Mutex::new(None),
            corrupt: true,
        }
    }

    /// Whatever was last saved, or `None` if nothing was written yet.
    pub fn saved(&self) -> Option<Vec<HistoryEntry>> {
        self.entries.lock().ok().and_then(|guard| guard.clone())
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> Result<Vec<HistoryEntry>, PersistenceError> {
        if self.corrupt {
            return Err(PersistenceError::Corrupt("unreadable value".to_string()));
        }
        let guard = self
            .entries
            .lock()
            .map_err(|err| PersistenceError::Unavailable(err.to_string()))?;
        Ok(guard.clone().unwrap_or_default())
    }

    fn save(&self, entries: &[HistoryEntry]) -> Result<(), PersistenceError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|err| PersistenceError::Unavailable(err.to_string()))?;
        *guard = Some(entries.to_vec());
        Ok(())
    }
}

use bookgen_core::{load_ledger, HistoryEntry, HistoryStore};
use bookgen_logging::{bookgen_error, bookgen_info};

/// Startup read of the ledger. Never fails; problems are logged.
pub(crate) fn load_history(store: &dyn HistoryStore) -> Vec<HistoryEntry> {
    load_ledger(store).list().to_vec()
}

/// Write-through after every ledger mutation. Failures are logged and
/// otherwise ignored; history is best-effort.
pub(crate) fn save_history(store: &dyn HistoryStore, entries: &[HistoryEntry]) {
    match store.save(entries) {
        Ok(()) => bookgen_info!("Persisted {} history entries", entries.len()),
        Err(err) => bookgen_error!("Failed to persist history: {}", err),
    }
}

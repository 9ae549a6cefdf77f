use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bookgen_core::{HistoryEntry, HistoryStore, PersistenceError};
use bookgen_logging::bookgen_debug;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Fixed storage key for the history ledger.
pub const HISTORY_FILENAME: &str = "bookHistory.json";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("data directory missing or not writable: {0}")]
    DataDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl From<PersistError> for PersistenceError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::DataDir(reason) => PersistenceError::Unavailable(reason),
            PersistError::Io(err) => PersistenceError::Io(err),
        }
    }
}

/// Ensure the directory exists; create if missing.
pub fn ensure_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::DataDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::DataDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::DataDir(e.to_string()))?;
    }
    Ok(())
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        ensure_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

/// History ledger stored as a JSON array in `{dir}/bookHistory.json`.
pub struct JsonFileHistoryStore {
    dir: PathBuf,
}

impl JsonFileHistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(HISTORY_FILENAME)
    }
}

impl HistoryStore for JsonFileHistoryStore {
    fn load(&self) -> Result<Vec<HistoryEntry>, PersistenceError> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                bookgen_debug!("No history at {:?}", path);
                return Ok(Vec::new());
            }
            Err(err) => return Err(PersistenceError::Io(err)),
        };
        serde_json::from_str(&content).map_err(|err| PersistenceError::Corrupt(err.to_string()))
    }

    fn save(&self, entries: &[HistoryEntry]) -> Result<(), PersistenceError> {
        let content = serde_json::to_vec_pretty(entries)
            .map_err(|err| PersistenceError::Corrupt(err.to_string()))?;
        AtomicFileWriter::new(self.dir.clone()).write(HISTORY_FILENAME, &content)?;
        Ok(())
    }
}

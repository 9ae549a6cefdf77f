use std::fs;

use bookgen_core::{load_ledger, HistoryEntry, HistoryStore, JobHandle, PersistenceError};
use bookgen_engine::{ensure_dir, AtomicFileWriter, JsonFileHistoryStore, HISTORY_FILENAME};
use chrono::{TimeZone, Utc};
use tempfile::TempDir;
use url::Url;

fn entry(id: &str) -> HistoryEntry {
    HistoryEntry {
        id: JobHandle::new(id),
        title: format!("Book {id}"),
        created_at: Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap(),
        result_location: Url::parse(&format!("http://localhost:8000/download/{id}")).unwrap(),
    }
}

#[test]
fn creates_missing_data_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("data");
    assert!(!new_dir.exists());
    ensure_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("book.pdf", b"hello").unwrap();
    assert_eq!(first.file_name().unwrap(), "book.pdf");
    assert_eq!(fs::read(&first).unwrap(), b"hello");

    let second = writer.write("book.pdf", b"world").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), b"world");
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    assert!(writer.write("book.pdf", b"data").is_err());
    assert!(!file_path.with_file_name("book.pdf").exists());
}

#[test]
fn missing_history_file_loads_empty() {
    let temp = TempDir::new().unwrap();
    let store = JsonFileHistoryStore::new(temp.path());
    assert!(store.load().unwrap().is_empty());
}

#[test]
fn history_round_trips_through_json_file() {
    let temp = TempDir::new().unwrap();
    let store = JsonFileHistoryStore::new(temp.path().join("nested"));

    store.save(&[entry("b"), entry("a")]).unwrap();
    assert_eq!(store.path().file_name().unwrap(), HISTORY_FILENAME);
    assert_eq!(store.load().unwrap(), vec![entry("b"), entry("a")]);

    store.save(&[entry("a")]).unwrap();
    assert_eq!(store.load().unwrap(), vec![entry("a")]);
}

#[test]
fn corrupt_history_file_is_reported_and_ledger_starts_empty() {
    bookgen_logging::initialize_for_tests();
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(HISTORY_FILENAME), "{not json").unwrap();
    let store = JsonFileHistoryStore::new(temp.path());

    assert!(matches!(store.load(), Err(PersistenceError::Corrupt(_))));
    assert!(load_ledger(&store).is_empty());
}

#[test]
fn history_file_uses_camel_case_records() {
    let temp = TempDir::new().unwrap();
    let store = JsonFileHistoryStore::new(temp.path());
    store.save(&[entry("abc")]).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
    assert_eq!(raw[0]["id"], "abc");
    assert_eq!(raw[0]["title"], "Book abc");
    assert_eq!(raw[0]["resultLocation"], "http://localhost:8000/download/abc");
}

#[test]
fn save_fails_when_data_dir_is_a_file() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("data");
    fs::write(&blocker, "x").unwrap();
    let store = JsonFileHistoryStore::new(&blocker);

    assert!(store.save(&[entry("abc")]).is_err());
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "x");
}

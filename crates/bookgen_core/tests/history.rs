use bookgen_core::{
    load_ledger, update, AppState, HistoryEntry, HistoryLedger, HistoryStore, JobHandle,
    MemoryHistoryStore, Msg, HISTORY_CAPACITY,
};
use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use url::Url;

fn entry(id: &str, minutes: i64) -> HistoryEntry {
    HistoryEntry {
        id: JobHandle::new(id),
        title: format!("Book {id}"),
        created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes),
        result_location: Url::parse(&format!("http://localhost:8000/download/{id}")).unwrap(),
    }
}

fn ids(ledger: &HistoryLedger) -> Vec<&str> {
    ledger.list().iter().map(|e| e.id.as_str()).collect()
}

#[test]
fn add_prepends_newest_first() {
    let mut ledger = HistoryLedger::new();
    ledger.add(entry("a", 1));
    ledger.add(entry("b", 2));
    assert_eq!(ids(&ledger), vec!["b", "a"]);
}

#[test]
fn sixth_entry_evicts_the_oldest() {
    let mut ledger = HistoryLedger::new();
    for (i, id) in ["1", "2", "3", "4", "5", "6"].into_iter().enumerate() {
        ledger.add(entry(id, i as i64));
        assert!(ledger.len() <= HISTORY_CAPACITY);
    }
    assert_eq!(ids(&ledger), vec!["6", "5", "4", "3", "2"]);
    assert!(ledger.get(&JobHandle::new("1")).is_none());
}

#[test]
fn re_adding_an_id_keeps_it_unique() {
    let mut ledger = HistoryLedger::new();
    ledger.add(entry("a", 1));
    ledger.add(entry("b", 2));
    ledger.add(entry("a", 3));
    assert_eq!(ids(&ledger), vec!["a", "b"]);
}

#[test]
fn remove_is_idempotent() {
    let mut once = HistoryLedger::new();
    once.add(entry("a", 1));
    once.add(entry("b", 2));
    let mut twice = once.clone();

    assert!(once.remove(&JobHandle::new("a")));
    assert!(twice.remove(&JobHandle::new("a")));
    assert!(!twice.remove(&JobHandle::new("a")));
    assert_eq!(once, twice);
    assert!(!once.remove(&JobHandle::new("missing")));
}

#[test]
fn from_entries_truncates_and_dedupes() {
    let stored = vec![
        entry("a", 7),
        entry("b", 6),
        entry("a", 5),
        entry("c", 4),
        entry("d", 3),
        entry("e", 2),
        entry("f", 1),
    ];
    let ledger = HistoryLedger::from_entries(stored);
    assert_eq!(ids(&ledger), vec!["a", "b", "c", "d", "e"]);
}

#[test]
fn load_ledger_degrades_to_empty_on_corrupt_store() {
    bookgen_logging::initialize_for_tests();
    let ledger = load_ledger(&MemoryHistoryStore::corrupt());
    assert!(ledger.is_empty());
}

#[test]
fn load_ledger_reads_saved_entries() {
    let store = MemoryHistoryStore::new();
    assert!(load_ledger(&store).is_empty());

    store.save(&[entry("x", 2), entry("y", 1)]).unwrap();
    assert_eq!(ids(&load_ledger(&store)), vec!["x", "y"]);
}

#[test]
fn restored_history_is_visible_in_view() {
    let store = MemoryHistoryStore::with_entries(vec![entry("x", 2), entry("y", 1)]);
    let entries = store.load().unwrap();

    let (mut state, effects) = update(AppState::new(), Msg::HistoryRestored(entries));
    assert!(effects.is_empty());
    assert!(state.consume_dirty());
    let view = state.view();
    assert_eq!(view.history.len(), 2);
    assert_eq!(view.history[0].title, "Book x");
}

#[test]
fn entries_serialize_with_camel_case_keys() {
    let json = serde_json::to_value(entry("abc", 0)).unwrap();
    assert_eq!(json["id"], "abc");
    assert_eq!(json["resultLocation"], "http://localhost:8000/download/abc");
    assert!(json["createdAt"].as_str().unwrap().starts_with("2026-01-01T00:00:00"));
}

use std::collections::BTreeSet;

use super::*;

fn record(topics: &[&str], ts: u64) -> TopicRecord {
    TopicRecord {
        topics: topics.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
        window_started_at: ts,
    }
}

#[test]
fn missing_file_loads_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonFileStore::new(dir.path().join("used_topics.json"));
    assert!(store.load().unwrap().is_none());
}

#[test]
fn save_then_load_uses_the_documented_field_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("used_topics.json");
    let mut store = JsonFileStore::new(&path);

    store.save(&record(&["Pizza", "Cats"], 1_700_000_000_000)).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["timestamp"], 1_700_000_000_000u64);
    assert_eq!(raw["topics"], serde_json::json!(["Cats", "Pizza"]));
    assert!(!dir.path().join("nested").join("used_topics.json.tmp").exists());

    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded, record(&["Pizza", "Cats"], 1_700_000_000_000));
}

#[test]
fn corrupt_file_is_treated_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("used_topics.json");
    std::fs::write(&path, "{\"topics\": [").unwrap();

    let mut store = JsonFileStore::new(&path);
    assert!(store.load().unwrap().is_none());
}

#[test]
fn reads_records_written_by_other_tools() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("used_topics.json");
    std::fs::write(&path, r#"{"topics":["a","b","a"],"timestamp":42}"#).unwrap();

    let loaded = JsonFileStore::new(&path).load().unwrap().unwrap();
    assert_eq!(loaded, record(&["a", "b"], 42));
}

#[test]
fn memory_store_counts_saves() {
    let mut store = MemoryStore::new();
    assert!(store.load().unwrap().is_none());
    store.save(&record(&["x"], 1)).unwrap();
    store.save(&record(&["x", "y"], 1)).unwrap();
    assert_eq!(store.save_count(), 2);
    assert_eq!(store.record().unwrap().topics.len(), 2);
}

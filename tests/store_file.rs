//! File-backed store behavior.

use cdlt_news::{FileStore, KvStore};

#[test]
fn round_trip_overwrite_and_remove() {
    let tmp = tempfile::tempdir().unwrap();
    let store = FileStore::new(tmp.path());

    assert!(store.get("cdlt_news_history_v4").is_none());

    store.set("cdlt_news_history_v4", r#"{"data":[],"timestamp":1}"#);
    assert_eq!(
        store.get("cdlt_news_history_v4").as_deref(),
        Some(r#"{"data":[],"timestamp":1}"#)
    );

    store.set("cdlt_news_history_v4", r#"{"data":[],"timestamp":2}"#);
    assert_eq!(
        store.get("cdlt_news_history_v4").as_deref(),
        Some(r#"{"data":[],"timestamp":2}"#)
    );

    store.remove("cdlt_news_history_v4");
    assert!(store.get("cdlt_news_history_v4").is_none());
}

#[test]
fn keys_are_isolated_and_unsafe_chars_are_sanitized() {
    let tmp = tempfile::tempdir().unwrap();
    let store = FileStore::new(tmp.path());

    store.set("a", "1");
    store.set("b", "2");
    assert_eq!(store.get("a").as_deref(), Some("1"));
    assert_eq!(store.get("b").as_deref(), Some("2"));

    store.set("weird/key name", "v");
    assert_eq!(store.get("weird/key name").as_deref(), Some("v"));
    // No stray path components escaped the data dir.
    let entries: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
    assert_eq!(entries.len(), 3);
}

#[test]
fn removing_an_absent_key_is_a_no_op() {
    let tmp = tempfile::tempdir().unwrap();
    let store = FileStore::new(tmp.path());
    store.remove("never-set");
    assert!(store.get("never-set").is_none());
}

// tests/ledger_persist.rs
//
// Persistence behavior of the posted-keys ledger: tolerant loading of both
// on-disk forms, atomic rewrites, and the cap/no-duplicate invariants.

use tempfile::tempdir;

use feedtoot::ledger::{identity_key, Ledger};

#[test]
fn missing_file_starts_empty() {
    let dir = tempdir().unwrap();
    let ledger = Ledger::open(dir.path().join("posted.json"), 100);
    assert!(ledger.is_empty());
    assert_eq!(ledger.cap(), 100);
}

#[test]
fn legacy_bare_array_form_is_read() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("posted.json");
    std::fs::write(&path, r#"["g2::https://x/2", "g1::https://x/1"]"#).unwrap();

    let ledger = Ledger::open(path, 100);
    assert_eq!(ledger.keys(), ["g2::https://x/2", "g1::https://x/1"]);
}

#[test]
fn wrapped_object_form_is_read() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("posted.json");
    std::fs::write(
        &path,
        r#"{"keys": ["g2::https://x/2", "g1::https://x/1"], "version": 2}"#,
    )
    .unwrap();

    let ledger = Ledger::open(path, 100);
    assert_eq!(ledger.keys(), ["g2::https://x/2", "g1::https://x/1"]);
}

#[test]
fn corrupt_file_is_ignored() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("posted.json");
    std::fs::write(&path, "]]] definitely not json").unwrap();

    let ledger = Ledger::open(path, 100);
    assert!(ledger.is_empty());
}

#[test]
fn oversized_or_duplicated_file_is_repaired_on_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("posted.json");
    std::fs::write(&path, r#"["a", "b", "a", "c", "d"]"#).unwrap();

    let ledger = Ledger::open(path, 3);
    assert_eq!(ledger.keys(), ["a", "b", "c"]);
}

#[tokio::test]
async fn record_prepends_truncates_and_rewrites() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("posted.json");
    let mut ledger = Ledger::open(path.clone(), 2);

    ledger.record("k1".to_string()).await.unwrap();
    ledger.record("k2".to_string()).await.unwrap();
    ledger.record("k3".to_string()).await.unwrap();

    assert_eq!(ledger.keys(), ["k3", "k2"]);

    // Written form is the legacy bare array, most-recent-first.
    let persisted: Vec<String> =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(persisted, vec!["k3".to_string(), "k2".to_string()]);

    // No temp file left behind after the rename.
    assert!(!dir.path().join("posted.tmp").exists());
}

#[tokio::test]
async fn recording_a_known_key_does_not_duplicate_it() {
    let dir = tempdir().unwrap();
    let mut ledger = Ledger::open(dir.path().join("posted.json"), 10);

    ledger.record("k1".to_string()).await.unwrap();
    ledger.record("k1".to_string()).await.unwrap();

    assert_eq!(ledger.keys(), ["k1"]);
}

#[tokio::test]
async fn ledger_survives_a_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("posted.json");

    {
        let mut ledger = Ledger::open(path.clone(), 10);
        let key = identity_key("g1", "https://x/1");
        ledger.record(key).await.unwrap();
    }

    let reopened = Ledger::open(path, 10);
    assert!(reopened.contains("g1::https://x/1"));
}

#[tokio::test]
async fn parent_directory_is_created_on_first_write() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state/nested/posted.json");
    let mut ledger = Ledger::open(path.clone(), 10);

    ledger.record("k1".to_string()).await.unwrap();
    assert!(path.exists());
}

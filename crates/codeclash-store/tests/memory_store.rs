//! Integration tests for the in-memory store against the boundary
//! contract: creation collisions, merge granularity, conditional merges,
//! and the watch ordering guarantees the duel protocol leans on.

use codeclash_store::{DocumentStore, MemoryStore, StoreError};
use serde_json::json;

#[tokio::test]
async fn create_then_get_round_trips() {
    let store = MemoryStore::new();
    store.create("K1", json!({ "a": 1 })).await.unwrap();

    let doc = store.get("K1").await.unwrap();
    assert_eq!(doc, Some(json!({ "a": 1 })));
}

#[tokio::test]
async fn get_unknown_key_is_none() {
    let store = MemoryStore::new();
    assert_eq!(store.get("NOPE").await.unwrap(), None);
}

#[tokio::test]
async fn create_existing_key_reports_collision() {
    let store = MemoryStore::new();
    store.create("K1", json!({})).await.unwrap();

    let result = store.create("K1", json!({})).await;
    assert!(matches!(result, Err(StoreError::AlreadyExists(k)) if k == "K1"));
}

#[tokio::test]
async fn merge_is_field_granular() {
    let store = MemoryStore::new();
    store
        .create("K1", json!({ "host": { "ready": false, "score": 3 }, "status": "WAITING" }))
        .await
        .unwrap();

    store
        .merge("K1", json!({ "host": { "ready": true } }))
        .await
        .unwrap();

    let doc = store.get("K1").await.unwrap().unwrap();
    assert_eq!(doc["host"]["ready"], true);
    // Sibling fields survive the merge.
    assert_eq!(doc["host"]["score"], 3);
    assert_eq!(doc["status"], "WAITING");
}

#[tokio::test]
async fn merge_unknown_key_is_not_found() {
    let store = MemoryStore::new();
    let result = store.merge("NOPE", json!({ "a": 1 })).await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn merge_if_applies_only_on_matching_guard() {
    let store = MemoryStore::new();
    store
        .create("K1", json!({ "status": "WAITING", "guest": null }))
        .await
        .unwrap();

    let applied = store
        .merge_if("K1", "status", &json!("WAITING"), json!({ "status": "READY" }))
        .await
        .unwrap();
    assert!(applied);

    // Guard no longer matches: patch must not land.
    let applied = store
        .merge_if(
            "K1",
            "status",
            &json!("WAITING"),
            json!({ "guest": { "sneaky": true } }),
        )
        .await
        .unwrap();
    assert!(!applied);

    let doc = store.get("K1").await.unwrap().unwrap();
    assert_eq!(doc["status"], "READY");
    assert!(doc["guest"].is_null());
}

#[tokio::test]
async fn merge_if_missing_field_never_matches() {
    let store = MemoryStore::new();
    store.create("K1", json!({ "a": 1 })).await.unwrap();

    let applied = store
        .merge_if("K1", "status", &json!("WAITING"), json!({ "a": 2 }))
        .await
        .unwrap();
    assert!(!applied);
    assert_eq!(store.get("K1").await.unwrap().unwrap()["a"], 1);
}

#[tokio::test]
async fn delete_removes_record() {
    let store = MemoryStore::new();
    store.create("K1", json!({})).await.unwrap();
    store.delete("K1").await.unwrap();

    assert_eq!(store.get("K1").await.unwrap(), None);
    assert!(matches!(
        store.delete("K1").await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn keys_lists_all_records() {
    let store = MemoryStore::new();
    store.create("K1", json!({})).await.unwrap();
    store.create("K2", json!({})).await.unwrap();

    let mut keys = store.keys().await.unwrap();
    keys.sort();
    assert_eq!(keys, vec!["K1", "K2"]);
}

#[tokio::test]
async fn watch_delivers_snapshot_then_updates_in_write_order() {
    let store = MemoryStore::new();
    store.create("K1", json!({ "n": 0 })).await.unwrap();

    let mut watch = store.watch("K1").await.unwrap();
    assert_eq!(watch.snapshot, json!({ "n": 0 }));

    for n in 1..=3 {
        store.merge("K1", json!({ "n": n })).await.unwrap();
    }

    for n in 1..=3 {
        let update = watch.updates.recv().await.unwrap();
        assert_eq!(update["n"], n, "updates must arrive in write order");
    }
}

#[tokio::test]
async fn watch_sees_writes_made_after_snapshot() {
    let store = MemoryStore::new();
    store.create("K1", json!({ "n": 0 })).await.unwrap();

    // Subscribe, then write — no gap between snapshot and feed.
    let mut watch = store.watch("K1").await.unwrap();
    store.merge("K1", json!({ "n": 1 })).await.unwrap();

    let update = watch.updates.recv().await.unwrap();
    assert_eq!(update["n"], 1);
}

#[tokio::test]
async fn watch_unknown_key_is_not_found() {
    let store = MemoryStore::new();
    assert!(matches!(
        store.watch("NOPE").await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn delete_closes_watchers() {
    let store = MemoryStore::new();
    store.create("K1", json!({})).await.unwrap();
    let mut watch = store.watch("K1").await.unwrap();

    store.delete("K1").await.unwrap();

    assert!(matches!(
        watch.updates.recv().await,
        Err(tokio::sync::broadcast::error::RecvError::Closed)
    ));
}

#[tokio::test]
async fn two_writers_on_disjoint_fields_do_not_clobber() {
    let store = MemoryStore::new();
    store
        .create(
            "K1",
            json!({ "host": { "ready": false }, "guest": { "ready": false } }),
        )
        .await
        .unwrap();

    store
        .merge("K1", json!({ "host": { "ready": true } }))
        .await
        .unwrap();
    store
        .merge("K1", json!({ "guest": { "ready": true } }))
        .await
        .unwrap();

    let doc = store.get("K1").await.unwrap().unwrap();
    assert_eq!(doc["host"]["ready"], true);
    assert_eq!(doc["guest"]["ready"], true);
}

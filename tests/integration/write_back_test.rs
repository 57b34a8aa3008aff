//! Integration tests for write-back of the derived totals.

mod helpers;

use std::time::Duration;

use serde_json::json;

use coinsync_realtime::MemoryStore;
use coinsync_realtime::view::ViewState;

use helpers::{PACKAGES, TOTALS, TestApp, eventually, package};

#[tokio::test(start_paused = true)]
async fn test_newer_snapshot_supersedes_pending_write() {
    let store = MemoryStore::with_identity("anon-e");
    store.delay_writes(Duration::from_millis(50));
    store.put_document(PACKAGES, "p1", package(100, "kai", 1));
    let app = TestApp::start(store);
    app.wait_for_total(100).await;

    app.store.put_document(PACKAGES, "p2", package(250, "kai", 2));
    let view = app.wait_for_total(350).await;
    assert_eq!(view.state, ViewState::Ready);
    // The clock has not moved, so the first write is still in flight.
    assert_eq!(app.store.upsert_count(), 0);

    let store = app.store.clone();
    app.handle.shutdown().await.unwrap();

    let doc = store.document(TOTALS, "anon-e").expect("totals written");
    assert_eq!(doc.fields["totalCoins"], json!(350));
    assert!(store.upsert_count() <= 2);
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_snapshots_writes_latest_total() {
    let store = MemoryStore::with_identity("anon-burst");
    store.delay_writes(Duration::from_millis(30));
    let app = TestApp::start(store);
    app.wait_for_state(ViewState::Empty).await;

    let mut expected = 0;
    for i in 1..=10u64 {
        expected += i;
        app.store
            .put_document(PACKAGES, &format!("p{i}"), package(i, "kai", i as i64));
    }
    app.wait_for_total(expected).await;

    let store = app.store.clone();
    app.handle.shutdown().await.unwrap();

    let doc = store.document(TOTALS, "anon-burst").expect("totals written");
    assert_eq!(doc.fields["totalCoins"], json!(expected));
    assert!(store.upsert_count() < 10);
}

#[tokio::test]
async fn test_emptied_collection_keeps_stored_total() {
    let store = MemoryStore::with_identity("anon-keep");
    store.put_document(PACKAGES, "p1", package(60, "kai", 1));
    let app = TestApp::start(store);
    app.wait_for_total(60).await;
    eventually(|| app.totals().is_some()).await;

    app.store.remove_document(PACKAGES, "p1");
    app.wait_for_state(ViewState::Empty).await;

    let store = app.store.clone();
    app.handle.shutdown().await.unwrap();
    let doc = store.document(TOTALS, "anon-keep").expect("totals kept");
    assert_eq!(doc.fields["totalCoins"], json!(60));
}

#[tokio::test]
async fn test_write_failure_does_not_affect_view() {
    let store = MemoryStore::with_identity("anon-fail");
    store.fail_writes("quota exceeded");
    store.put_document(PACKAGES, "p1", package(80, "kai", 1));
    let app = TestApp::start(store);

    app.wait_for_state(ViewState::Ready).await;
    eventually(|| app.handle.metrics().write_backs_failed >= 1).await;

    let view = app.handle.current();
    assert_eq!(view.state, ViewState::Ready);
    assert!(view.error_message.is_none());
    assert_eq!(view.aggregate.map(|a| a.total_coins), Some(80));

    let store = app.store.clone();
    app.handle.shutdown().await.unwrap();
    assert!(store.document(TOTALS, "anon-fail").is_none());
}

#[tokio::test]
async fn test_write_back_merges_into_existing_document() {
    let store = MemoryStore::with_identity("anon-merge");
    store.put_document(TOTALS, "anon-merge", json!({"nickname": "K", "totalCoins": 1}));
    store.put_document(PACKAGES, "p1", package(45, "kai", 1));
    let app = TestApp::start(store);
    app.wait_for_state(ViewState::Ready).await;

    let store = app.store.clone();
    app.handle.shutdown().await.unwrap();

    let doc = store.document(TOTALS, "anon-merge").expect("totals");
    assert_eq!(doc.fields["nickname"], json!("K"));
    assert_eq!(doc.fields["totalCoins"], json!(45));
    assert_eq!(doc.fields["username"], json!("kai"));
    assert!(doc.fields.contains_key("updatedAt"));
}

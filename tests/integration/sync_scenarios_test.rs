//! Integration tests for the end-to-end sync pipeline.

mod helpers;

use std::time::Duration;

use serde_json::json;

use coinsync_core::config::SyncConfig;
use coinsync_core::types::{RawDocument, RawSnapshot};
use coinsync_realtime::MemoryStore;
use coinsync_realtime::view::ViewState;
use coinsync_realtime::view::state::{AUTH_REQUIRED_MESSAGE, EMPTY_MESSAGE, STREAM_FAILURE_MESSAGE};

use helpers::{PACKAGES, TestApp, package};

#[tokio::test]
async fn test_sign_in_failure_never_queries_packages() {
    let store = MemoryStore::new();
    store.fail_sign_in("anonymous auth disabled");
    store.put_document(PACKAGES, "p1", package(100, "kai", 10));
    let app = TestApp::start(store);

    let view = app.wait_for_state(ViewState::AuthFailed).await;
    assert_eq!(view.error_message.as_deref(), Some(AUTH_REQUIRED_MESSAGE));
    assert!(view.aggregate.is_none());

    app.handle.shutdown().await.unwrap();
    assert_eq!(app.store.subscribe_attempts(), 0);
    assert_eq!(app.store.upsert_count(), 0);
}

#[tokio::test]
async fn test_empty_snapshot_shows_empty_and_skips_write_back() {
    let app = TestApp::start(MemoryStore::new());

    let view = app.wait_for_state(ViewState::Empty).await;
    assert_eq!(view.error_message.as_deref(), Some(EMPTY_MESSAGE));
    let aggregate = view.aggregate.expect("empty aggregate");
    assert_eq!(aggregate.total_coins, 0);
    assert_eq!(aggregate.display_username, "User");
    assert!(aggregate.latest_package.is_none());

    let metrics = app.handle.metrics();
    let store = app.store.clone();
    app.handle.shutdown().await.unwrap();
    assert_eq!(store.upsert_count(), 0);
    assert_eq!(metrics.write_backs_skipped, 1);
}

#[tokio::test]
async fn test_two_packages_sum_and_write_back() {
    let store = MemoryStore::new();
    store.put_document(PACKAGES, "p1", package(100, "kai", 1_000));
    store.put_document(PACKAGES, "p2", package(250, "kai.gold", 2_000));
    let app = TestApp::start(store);

    let view = app.wait_for_state(ViewState::Ready).await;
    let aggregate = view.aggregate.expect("aggregate");
    assert_eq!(aggregate.total_coins, 350);
    assert_eq!(aggregate.package_count, 2);
    assert_eq!(aggregate.latest_package.as_ref().map(|p| p.price), Some(250));
    assert_eq!(aggregate.display_username, "kai.gold");
    assert!(view.error_message.is_none());

    let identity = app.identity();
    let store = app.store.clone();
    app.handle.shutdown().await.unwrap();

    let doc = store.document(helpers::TOTALS, &identity).expect("totals written");
    assert_eq!(doc.fields["totalCoins"], json!(350));
    assert_eq!(doc.fields["username"], json!("kai.gold"));
}

#[tokio::test]
async fn test_malformed_timestamp_sorts_as_oldest() {
    let store = MemoryStore::new();
    store.put_document(
        PACKAGES,
        "broken",
        json!({"status": "active", "price": 40, "username": "ghost", "updatedAt": "yesterday-ish"}),
    );
    store.put_document(PACKAGES, "p1", package(100, "kai", 1_000));
    let app = TestApp::start(store);

    let view = app.wait_for_state(ViewState::Ready).await;
    let aggregate = view.aggregate.expect("aggregate");
    assert_eq!(aggregate.total_coins, 140);
    assert_eq!(
        aggregate.latest_package.as_ref().map(|p| p.id.as_str()),
        Some("p1")
    );
    assert!(app.handle.metrics().malformed_records >= 1);

    app.store.remove_document(PACKAGES, "p1");
    let view = app.wait_for_total(40).await;
    let latest = view.aggregate.and_then(|a| a.latest_package).expect("latest");
    assert_eq!(latest.id.as_str(), "broken");

    app.handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_out_of_order_delivery_is_resorted() {
    let app = TestApp::start(MemoryStore::with_identity("anon-1"));
    app.wait_for_state(ViewState::Empty).await;

    let delivered = app.store.emit_raw(
        PACKAGES,
        RawSnapshot::new(vec![
            RawDocument::new("older", package(5, "old", 10)),
            RawDocument::new("newer", package(7, "new", 20)),
        ]),
    );
    assert_eq!(delivered, 1);

    let view = app.wait_for_total(12).await;
    assert_eq!(view.aggregate.map(|a| a.display_username), Some("new".to_string()));
    app.handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_empty_then_first_purchase_becomes_ready() {
    let app = TestApp::start(MemoryStore::with_identity("anon-returning"));
    app.wait_for_state(ViewState::Empty).await;

    app.store.put_document(PACKAGES, "p1", package(75, "nova", 5));
    let view = app.wait_for_state(ViewState::Ready).await;
    assert_eq!(view.aggregate.map(|a| a.total_coins), Some(75));
    assert_eq!(app.store.sign_in_attempts(), 0);

    app.handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_permission_loss_is_terminal() {
    let store = MemoryStore::new();
    store.put_document(PACKAGES, "p1", package(100, "kai", 1));
    let app = TestApp::start(store);
    app.wait_for_state(ViewState::Ready).await;

    app.store.fail_stream(PACKAGES, "missing or insufficient permissions");
    let view = app.wait_for_state(ViewState::DataError).await;
    assert_eq!(view.error_message.as_deref(), Some(STREAM_FAILURE_MESSAGE));

    let revision = view.revision;
    app.store.put_document(PACKAGES, "p2", package(1, "kai", 2));
    helpers::eventually(|| app.store.active_subscriptions() == 0).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    let after = app.handle.current();
    assert_eq!(after.state, ViewState::DataError);
    assert_eq!(after.revision, revision);

    app.handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_denied_query_reports_data_error() {
    let store = MemoryStore::with_identity("anon-1");
    store.deny_queries("missing or insufficient permissions");
    let app = TestApp::start(store);

    let view = app.wait_for_state(ViewState::DataError).await;
    assert_eq!(view.error_message.as_deref(), Some(STREAM_FAILURE_MESSAGE));
    assert!(view.aggregate.is_none());
    app.handle.shutdown().await.unwrap();
    assert_eq!(app.store.upsert_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_sign_in_timeout_fails_auth() {
    let store = MemoryStore::new();
    store.delay_sign_in(Duration::from_secs(120));
    let config = SyncConfig {
        bootstrap_timeout_seconds: 2,
        ..SyncConfig::default()
    };
    let app = TestApp::start_with(store, config);

    let view = app.wait_for_state(ViewState::AuthFailed).await;
    assert_eq!(view.error_message.as_deref(), Some(AUTH_REQUIRED_MESSAGE));
    assert_eq!(app.store.subscribe_attempts(), 0);
    app.handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_same_snapshot_yields_same_view() {
    let build = || {
        let store = MemoryStore::with_identity("anon-same");
        store.put_document(PACKAGES, "a", package(30, "a", 7));
        store.put_document(PACKAGES, "b", package(30, "b", 7));
        store.put_document(PACKAGES, "c", package(1, "c", 3));
        TestApp::start(store)
    };

    let first = build();
    let second = build();
    let a = first.wait_for_state(ViewState::Ready).await;
    let b = second.wait_for_state(ViewState::Ready).await;
    assert_eq!(a.aggregate, b.aggregate);
    assert_eq!(
        a.aggregate.and_then(|v| v.latest_package).map(|p| p.id.into_inner()),
        Some("a".to_string())
    );

    first.handle.shutdown().await.unwrap();
    second.handle.shutdown().await.unwrap();
}

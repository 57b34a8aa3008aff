//! Integration tests for engine teardown and subscription cancellation.

mod helpers;

use std::time::Duration;

use coinsync_core::config::SyncConfig;
use coinsync_core::traits::LiveQuery;
use coinsync_core::types::{PackageQuery, RawDocument, RawSnapshot};
use coinsync_realtime::MemoryStore;
use coinsync_realtime::view::ViewState;

use helpers::{PACKAGES, TestApp, package};

#[tokio::test]
async fn test_late_snapshot_after_shutdown_is_discarded() {
    let store = MemoryStore::with_identity("anon-late");
    store.keep_cancelled_subscriptions(true);
    store.put_document(PACKAGES, "p1", package(100, "kai", 1));
    let app = TestApp::start(store);

    let ready = app.wait_for_state(ViewState::Ready).await;
    let rx = app.handle.view();
    let store = app.store.clone();
    app.handle.shutdown().await.unwrap();

    let delivered = store.emit_raw(
        PACKAGES,
        RawSnapshot::new(vec![RawDocument::new("p9", package(9_999, "late", 99))]),
    );
    assert_eq!(delivered, 0);

    store.put_document(PACKAGES, "p2", package(5, "kai", 2));
    tokio::time::sleep(Duration::from_millis(20)).await;

    let last = rx.borrow().clone();
    assert_eq!(last.revision, ready.revision);
    assert_eq!(last.aggregate.map(|a| a.total_coins), Some(100));
    assert_eq!(store.active_subscriptions(), 0);
    assert_eq!(store.auth_observer_count(), 0);
}

#[tokio::test]
async fn test_shutdown_during_sign_in_never_subscribes() {
    let store = MemoryStore::new();
    store.delay_sign_in(Duration::from_secs(60));
    let app = TestApp::start(store);

    tokio::task::yield_now().await;
    let store = app.store.clone();
    tokio::time::timeout(Duration::from_secs(1), app.handle.shutdown())
        .await
        .expect("shutdown should not wait for sign-in")
        .unwrap();

    assert_eq!(store.subscribe_attempts(), 0);
    assert_eq!(store.active_subscriptions(), 0);
}

#[tokio::test]
async fn test_unsubscribe_is_idempotent() {
    let store = MemoryStore::new();
    let query = PackageQuery::active_packages(PACKAGES, SyncConfig::default().order_field);
    let mut subscription = store.subscribe(&query).await.unwrap();
    assert_eq!(store.active_subscriptions(), 1);

    assert!(subscription.unsubscribe());
    assert!(!subscription.unsubscribe());
    assert!(!subscription.is_active());
    assert_eq!(store.active_subscriptions(), 0);

    store.put_document(PACKAGES, "p1", package(1, "kai", 1));
    assert!(subscription.next().await.is_none());
    drop(subscription);
    assert_eq!(store.active_subscriptions(), 0);
}

#[tokio::test]
async fn test_view_is_sealed_after_auth_failure_shutdown() {
    let store = MemoryStore::new();
    store.fail_sign_in("disabled");
    let app = TestApp::start(store);
    let failed = app.wait_for_state(ViewState::AuthFailed).await;

    let rx = app.handle.view();
    app.handle.shutdown().await.unwrap();
    assert_eq!(rx.borrow().revision, failed.revision);
    assert_eq!(rx.borrow().state, ViewState::AuthFailed);
}

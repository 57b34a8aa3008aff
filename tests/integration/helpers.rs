//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use coinsync_core::config::SyncConfig;
use coinsync_realtime::{MemoryStore, SyncContext, SyncEngine, SyncHandle, ViewSnapshot, ViewState};

/// Package collection used by the default config.
pub const PACKAGES: &str = "packages";
/// Totals collection used by the default config.
pub const TOTALS: &str = "totalCoins";

/// Upper bound on how long any test waits for the engine.
const WAIT: Duration = Duration::from_secs(5);

/// A running engine over an in-memory store.
pub struct TestApp {
    /// Backing store, shared with the engine
    pub store: Arc<MemoryStore>,
    /// Engine handle
    pub handle: SyncHandle,
}

impl TestApp {
    /// Start an engine over `store` with default sync settings.
    pub fn start(store: MemoryStore) -> Self {
        Self::start_with(store, SyncConfig::default())
    }

    /// Start an engine over `store` with explicit sync settings.
    pub fn start_with(store: MemoryStore, config: SyncConfig) -> Self {
        let store = Arc::new(store);
        let ctx = SyncContext::from_store(Arc::clone(&store), config);
        let handle = SyncEngine::start(ctx);
        Self { store, handle }
    }

    /// Wait until the view satisfies `predicate`.
    pub async fn wait_until(&self, predicate: impl FnMut(&ViewSnapshot) -> bool) -> ViewSnapshot {
        let mut rx = self.handle.view();
        tokio::time::timeout(WAIT, rx.wait_for(predicate))
            .await
            .expect("Timed out waiting for view")
            .expect("View model dropped")
            .clone()
    }

    /// Wait until the view reaches `state`.
    pub async fn wait_for_state(&self, state: ViewState) -> ViewSnapshot {
        self.wait_until(|s| s.state == state).await
    }

    /// Wait until the view shows `total` coins.
    pub async fn wait_for_total(&self, total: u64) -> ViewSnapshot {
        self.wait_until(|s| s.aggregate.as_ref().is_some_and(|a| a.total_coins == total))
            .await
    }

    /// Identity key the store currently holds.
    pub fn identity(&self) -> String {
        self.store.current_identity_id().expect("No identity issued")
    }

    /// Stored totals document for the current identity.
    pub fn totals(&self) -> Option<serde_json::Map<String, Value>> {
        self.store
            .document(TOTALS, &self.identity())
            .map(|doc| doc.fields)
    }
}

/// An active package document.
pub fn package(price: u64, username: &str, updated_secs: i64) -> Value {
    json!({
        "status": "active",
        "price": price,
        "username": username,
        "createdAt": { "seconds": updated_secs, "nanoseconds": 0 },
        "updatedAt": { "seconds": updated_secs, "nanoseconds": 0 },
    })
}

/// Poll `condition` until it holds, yielding to the runtime between checks.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + WAIT;
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "Condition never held");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

//! In-memory document store for single-process runs and tests.
//!
//! Implements every collaborator trait: anonymous identity issuance with
//! auth-state observers, filtered/ordered live queries that re-emit the
//! full result set on every change, and merge upserts. Faults can be
//! injected to exercise the failure paths of the sync engine.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use coinsync_core::error::AppError;
use coinsync_core::result::AppResult;
use coinsync_core::subscription::{self, Subscription, SubscriptionSink};
use coinsync_core::traits::{DocumentStore, IdentityProvider, LiveQuery, SnapshotEvent};
use coinsync_core::types::{Identity, PackageQuery, RawDocument, RawSnapshot, SortDirection};

/// A live query registered with the store.
#[derive(Debug)]
struct LiveSubscriber {
    query: PackageQuery,
    sink: SubscriptionSink<SnapshotEvent>,
}

/// Injected failures and latencies.
#[derive(Debug, Default, Clone)]
struct Faults {
    sign_in_error: Option<String>,
    sign_in_delay: Option<Duration>,
    query_denied: Option<String>,
    write_error: Option<String>,
    write_delay: Option<Duration>,
}

/// In-memory store implementation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Collection name → documents in insertion order.
    collections: DashMap<String, Vec<RawDocument>>,
    /// Persisted session identity.
    identity: Mutex<Option<Identity>>,
    /// Observer id → auth-state sink.
    auth_observers: Arc<DashMap<u64, SubscriptionSink<Option<Identity>>>>,
    /// Subscriber id → live query.
    live: Arc<DashMap<u64, LiveSubscriber>>,
    next_subscriber: AtomicU64,
    /// Keep cancelled live queries registered to mimic a transport that
    /// still fires callbacks after teardown.
    keep_cancelled: AtomicBool,
    faults: Mutex<Faults>,
    sign_in_attempts: AtomicU64,
    subscribe_attempts: AtomicU64,
    upserts: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store with no session identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose persisted session already has an identity.
    pub fn with_identity(uid: impl Into<String>) -> Self {
        let store = Self::new();
        *lock(&store.identity) = Some(Identity::anonymous(uid.into()));
        store
    }

    /// Insert documents into a collection without notifying anyone.
    pub fn seed(&self, collection: &str, documents: Vec<RawDocument>) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
    }

    /// Create or replace a document and notify live queries.
    pub fn put_document(&self, collection: &str, id: &str, fields: Value) {
        let doc = RawDocument::new(id, fields);
        self.write_document(collection, doc, false);
        self.notify(collection);
    }

    /// Delete a document and notify live queries.
    pub fn remove_document(&self, collection: &str, id: &str) -> bool {
        let removed = self
            .collections
            .get_mut(collection)
            .map(|mut docs| {
                let before = docs.len();
                docs.retain(|d| d.id != id);
                docs.len() < before
            })
            .unwrap_or(false);
        if removed {
            self.notify(collection);
        }
        removed
    }

    /// Read a document.
    pub fn document(&self, collection: &str, id: &str) -> Option<RawDocument> {
        self.collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id).cloned())
    }

    /// Deliver an arbitrary snapshot to every live query on `collection`,
    /// bypassing filtering and ordering. Returns how many accepted it.
    pub fn emit_raw(&self, collection: &str, snapshot: RawSnapshot) -> usize {
        self.live
            .iter()
            .filter(|entry| entry.query.collection == collection)
            .filter(|entry| entry.sink.emit(SnapshotEvent::Next(snapshot.clone())))
            .count()
    }

    /// Fail every live query on `collection`, as a revoked permission
    /// would. The failed queries are dropped.
    pub fn fail_stream(&self, collection: &str, reason: &str) {
        let failed: Vec<u64> = self
            .live
            .iter()
            .filter(|entry| entry.query.collection == collection)
            .map(|entry| {
                entry
                    .sink
                    .emit(SnapshotEvent::Error(AppError::permission_denied(reason)));
                *entry.key()
            })
            .collect();
        for id in failed {
            self.live.remove(&id);
        }
    }

    /// Replace the session identity and notify auth-state observers.
    pub fn switch_identity(&self, uid: &str) {
        let identity = Identity::anonymous(uid);
        *lock(&self.identity) = Some(identity.clone());
        self.notify_auth(Some(identity));
    }

    /// Reject anonymous sign-in with `reason`.
    pub fn fail_sign_in(&self, reason: &str) {
        lock(&self.faults).sign_in_error = Some(reason.to_string());
    }

    /// Delay anonymous sign-in.
    pub fn delay_sign_in(&self, delay: Duration) {
        lock(&self.faults).sign_in_delay = Some(delay);
    }

    /// Deny live queries with `reason`.
    pub fn deny_queries(&self, reason: &str) {
        lock(&self.faults).query_denied = Some(reason.to_string());
    }

    /// Reject upserts with `reason`.
    pub fn fail_writes(&self, reason: &str) {
        lock(&self.faults).write_error = Some(reason.to_string());
    }

    /// Delay upserts.
    pub fn delay_writes(&self, delay: Duration) {
        lock(&self.faults).write_delay = Some(delay);
    }

    /// Keep delivering to live queries after they were cancelled.
    pub fn keep_cancelled_subscriptions(&self, keep: bool) {
        self.keep_cancelled.store(keep, Ordering::SeqCst);
    }

    /// Key of the persisted session identity.
    pub fn current_identity_id(&self) -> Option<String> {
        lock(&self.identity)
            .as_ref()
            .map(|i| i.id.as_str().to_string())
    }

    /// Number of anonymous sign-in requests received.
    pub fn sign_in_attempts(&self) -> u64 {
        self.sign_in_attempts.load(Ordering::SeqCst)
    }

    /// Number of live query subscriptions requested.
    pub fn subscribe_attempts(&self) -> u64 {
        self.subscribe_attempts.load(Ordering::SeqCst)
    }

    /// Number of upserts that reached the store.
    pub fn upsert_count(&self) -> u64 {
        self.upserts.load(Ordering::SeqCst)
    }

    /// Number of registered auth-state observers.
    pub fn auth_observer_count(&self) -> usize {
        self.auth_observers.len()
    }

    /// Number of live queries still delivering.
    pub fn active_subscriptions(&self) -> usize {
        self.live.iter().filter(|entry| entry.sink.is_active()).count()
    }

    /// Current result set of `query`, filtered and ordered.
    fn evaluate(&self, query: &PackageQuery) -> RawSnapshot {
        let mut matching: Vec<RawDocument> = self
            .collections
            .get(&query.collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| query.matches(&d.fields))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order_by {
            matching.sort_by(|a, b| {
                let (ka, kb) = (query.order_key(&a.fields), query.order_key(&b.fields));
                match order.direction {
                    SortDirection::Desc => kb.cmp(&ka),
                    SortDirection::Asc => ka.cmp(&kb),
                }
            });
        }
        RawSnapshot::new(matching)
    }

    /// Re-emit the full result set to every live query on `collection`.
    fn notify(&self, collection: &str) {
        let mut gone = Vec::new();
        for entry in self.live.iter() {
            if entry.query.collection != collection {
                continue;
            }
            let snapshot = self.evaluate(&entry.query);
            if !entry.sink.emit(SnapshotEvent::Next(snapshot)) {
                gone.push(*entry.key());
            }
        }
        if !self.keep_cancelled.load(Ordering::SeqCst) {
            for id in gone {
                self.live.remove(&id);
            }
        }
    }

    fn notify_auth(&self, state: Option<Identity>) {
        self.auth_observers.retain(|_, sink| sink.emit(state.clone()));
    }

    fn write_document(&self, collection: &str, doc: RawDocument, merge: bool) {
        let mut docs = self.collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|d| d.id == doc.id) {
            Some(existing) if merge => existing.fields.extend(doc.fields),
            Some(existing) => *existing = doc,
            None => docs.push(doc),
        }
    }
}

#[async_trait]
impl IdentityProvider for MemoryStore {
    fn current_identity(&self) -> Option<Identity> {
        lock(&self.identity).clone()
    }

    fn observe_auth_state(&self) -> Subscription<Option<Identity>> {
        let id = self.next_subscriber.fetch_add(1, Ordering::SeqCst);
        let (sink, subscription) = subscription::channel(format!("auth-state#{id}"));
        sink.emit(self.current_identity());
        self.auth_observers.insert(id, sink);

        let observers = Arc::clone(&self.auth_observers);
        subscription.on_cancel(move || {
            observers.remove(&id);
        })
    }

    async fn sign_in_anonymously(&self) -> AppResult<Identity> {
        self.sign_in_attempts.fetch_add(1, Ordering::SeqCst);
        let faults = lock(&self.faults).clone();

        if let Some(delay) = faults.sign_in_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = faults.sign_in_error {
            return Err(AppError::authentication(reason));
        }

        if let Some(existing) = self.current_identity() {
            return Ok(existing);
        }

        let identity = Identity::anonymous(format!("anon-{}", Uuid::new_v4().simple()));
        *lock(&self.identity) = Some(identity.clone());
        info!(identity = %identity.id, "Issued anonymous identity");
        self.notify_auth(Some(identity.clone()));
        Ok(identity)
    }
}

#[async_trait]
impl LiveQuery for MemoryStore {
    async fn subscribe(&self, query: &PackageQuery) -> AppResult<Subscription<SnapshotEvent>> {
        self.subscribe_attempts.fetch_add(1, Ordering::SeqCst);
        let id = self.next_subscriber.fetch_add(1, Ordering::SeqCst);
        let (sink, subscription) = subscription::channel(format!("live:{}#{id}", query.collection));

        let denied = lock(&self.faults).query_denied.clone();
        if let Some(reason) = denied {
            sink.emit(SnapshotEvent::Error(AppError::permission_denied(reason)));
            return Ok(subscription);
        }

        sink.emit(SnapshotEvent::Next(self.evaluate(query)));
        self.live.insert(
            id,
            LiveSubscriber {
                query: query.clone(),
                sink,
            },
        );

        let live = Arc::clone(&self.live);
        let keep = self.keep_cancelled.load(Ordering::SeqCst);
        debug!(subscriber = id, collection = %query.collection, "Live query registered");
        Ok(subscription.on_cancel(move || {
            if !keep {
                live.remove(&id);
            }
        }))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn upsert(
        &self,
        collection: &str,
        key: &str,
        fields: Map<String, Value>,
        merge: bool,
    ) -> AppResult<()> {
        let faults = lock(&self.faults).clone();
        if let Some(delay) = faults.write_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = faults.write_error {
            return Err(AppError::write_back(reason));
        }

        self.upserts.fetch_add(1, Ordering::SeqCst);
        let doc = RawDocument {
            id: key.to_string(),
            fields,
        };
        self.write_document(collection, doc, merge);
        self.notify(collection);
        Ok(())
    }
}

/// Lock a mutex, recovering the data if a holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

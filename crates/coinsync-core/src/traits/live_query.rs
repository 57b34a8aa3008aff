//! Live query boundary.

use async_trait::async_trait;

use crate::error::AppError;
use crate::result::AppResult;
use crate::subscription::Subscription;
use crate::types::query::PackageQuery;
use crate::types::snapshot::RawSnapshot;

/// One delivery from a live query.
#[derive(Debug, Clone)]
pub enum SnapshotEvent {
    /// The full current result set.
    Next(RawSnapshot),
    /// The stream failed; no further events follow.
    Error(AppError),
}

/// Real-time, filtered, ordered query subscriptions.
#[async_trait]
pub trait LiveQuery: Send + Sync + std::fmt::Debug + 'static {
    /// Subscribe to the full result set of `query`.
    ///
    /// The store emits a snapshot immediately and again whenever any
    /// matching document changes. Unsubscribing (or dropping the
    /// subscription) stops delivery.
    async fn subscribe(&self, query: &PackageQuery) -> AppResult<Subscription<SnapshotEvent>>;
}

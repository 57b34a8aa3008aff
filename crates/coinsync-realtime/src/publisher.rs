//! Write-back of the derived totals to a per-identity document.
//!
//! Publishing never blocks the read path. Each publish replaces the
//! pending document in a `watch` slot; a single writer task drains the
//! slot, so a write that has not started yet is superseded by a newer
//! one while a write already in flight runs to completion. Store
//! failures are logged and counted, never surfaced to the view model.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use coinsync_core::traits::DocumentStore;
use coinsync_core::types::{
    AggregateView, Identity, IdentityId, PackageRecord, TotalCoinsDocument,
};

use crate::context::SyncContext;
use crate::metrics::SyncMetrics;

/// A write waiting for the writer task.
#[derive(Debug, Clone)]
struct PendingWrite {
    generation: u64,
    key: IdentityId,
    document: TotalCoinsDocument,
}

/// What a publish call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Handed to the writer; supersedes any earlier pending write.
    Queued {
        /// Monotonic publish counter.
        generation: u64,
    },
    /// Nothing written because no records were observed.
    Skipped,
}

/// Publishes the totals document for the current identity.
#[derive(Debug)]
pub struct WriteBackPublisher {
    slot: watch::Sender<Option<PendingWrite>>,
    generation: u64,
    metrics: Arc<SyncMetrics>,
}

impl WriteBackPublisher {
    /// Create the publisher and spawn its writer task.
    ///
    /// The writer exits once the publisher is dropped and the last
    /// pending write has been attempted.
    pub fn spawn(ctx: &SyncContext, metrics: Arc<SyncMetrics>) -> (Self, JoinHandle<()>) {
        let (slot, rx) = watch::channel(None);
        let writer = tokio::spawn(run_writer(
            Arc::clone(&ctx.documents),
            ctx.config.totals_collection.clone(),
            rx,
            Arc::clone(&metrics),
        ));
        let publisher = Self {
            slot,
            generation: 0,
            metrics,
        };
        (publisher, writer)
    }

    /// Publish the aggregate derived from `records` for `identity`.
    ///
    /// An empty record set is never written, so a transient empty
    /// snapshot cannot zero a previously stored total.
    pub fn publish(
        &mut self,
        identity: &Identity,
        records: &[PackageRecord],
        aggregate: &AggregateView,
    ) -> PublishOutcome {
        if records.is_empty() {
            debug!(identity = %identity.id, "Empty snapshot, write-back skipped");
            SyncMetrics::inc(&self.metrics.write_backs_skipped);
            return PublishOutcome::Skipped;
        }

        self.generation += 1;
        let pending = PendingWrite {
            generation: self.generation,
            key: identity.id.clone(),
            document: TotalCoinsDocument {
                total_coins: aggregate.total_coins,
                username: aggregate
                    .latest_package
                    .as_ref()
                    .and_then(|p| p.username.clone()),
                updated_at: Utc::now(),
            },
        };
        self.slot.send_replace(Some(pending));
        SyncMetrics::inc(&self.metrics.write_backs_queued);

        PublishOutcome::Queued {
            generation: self.generation,
        }
    }
}

async fn run_writer(
    documents: Arc<dyn DocumentStore>,
    collection: String,
    mut rx: watch::Receiver<Option<PendingWrite>>,
    metrics: Arc<SyncMetrics>,
) {
    while rx.changed().await.is_ok() {
        let Some(pending) = rx.borrow_and_update().clone() else {
            continue;
        };

        let fields = pending.document.to_fields();
        match documents
            .upsert(&collection, pending.key.as_str(), fields, true)
            .await
        {
            Ok(()) => {
                SyncMetrics::inc(&metrics.write_backs_completed);
                debug!(
                    identity = %pending.key,
                    generation = pending.generation,
                    total_coins = pending.document.total_coins,
                    "Totals written back"
                );
            }
            Err(e) => {
                SyncMetrics::inc(&metrics.write_backs_failed);
                warn!(
                    identity = %pending.key,
                    generation = pending.generation,
                    error = %e,
                    "Write-back failed"
                );
            }
        }
    }
    debug!("Write-back writer stopped");
}

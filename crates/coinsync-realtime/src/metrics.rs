//! Sync pipeline counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level counters.
#[derive(Debug, Default)]
pub struct SyncMetrics {
    /// Snapshots delivered by the live query
    pub snapshots_received: AtomicU64,
    /// Records that survived translation
    pub records_translated: AtomicU64,
    /// Records recovered with a substituted value
    pub malformed_records: AtomicU64,
    /// Write-backs handed to the writer
    pub write_backs_queued: AtomicU64,
    /// Write-backs the store acknowledged
    pub write_backs_completed: AtomicU64,
    /// Write-backs skipped because the snapshot was empty
    pub write_backs_skipped: AtomicU64,
    /// Write-backs the store rejected
    pub write_backs_failed: AtomicU64,
}

impl SyncMetrics {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one translated snapshot
    pub fn record_snapshot(&self, records: usize, malformed: usize) {
        self.snapshots_received.fetch_add(1, Ordering::Relaxed);
        self.records_translated
            .fetch_add(records as u64, Ordering::Relaxed);
        self.malformed_records
            .fetch_add(malformed as u64, Ordering::Relaxed);
    }

    /// Increment a counter
    pub fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            snapshots_received: self.snapshots_received.load(Ordering::Relaxed),
            records_translated: self.records_translated.load(Ordering::Relaxed),
            malformed_records: self.malformed_records.load(Ordering::Relaxed),
            write_backs_queued: self.write_backs_queued.load(Ordering::Relaxed),
            write_backs_completed: self.write_backs_completed.load(Ordering::Relaxed),
            write_backs_skipped: self.write_backs_skipped.load(Ordering::Relaxed),
            write_backs_failed: self.write_backs_failed.load(Ordering::Relaxed),
        }
    }
}

/// Serializable counter snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Snapshots delivered by the live query
    pub snapshots_received: u64,
    /// Records that survived translation
    pub records_translated: u64,
    /// Records recovered with a substituted value
    pub malformed_records: u64,
    /// Write-backs handed to the writer
    pub write_backs_queued: u64,
    /// Write-backs the store acknowledged
    pub write_backs_completed: u64,
    /// Write-backs skipped because the snapshot was empty
    pub write_backs_skipped: u64,
    /// Write-backs the store rejected
    pub write_backs_failed: u64,
}

//! Balance derivation from the current package records.

use coinsync_core::types::{AggregateView, PackageRecord};

use crate::context::SyncContext;

/// Pure reduction from package records to the displayed balance.
///
/// The balance is the sum of all active packages. The latest package is
/// the one with the greatest `updated_at`; on a tie the earlier record in
/// input order wins.
#[derive(Debug, Clone)]
pub struct AggregateDeriver {
    default_username: String,
}

impl AggregateDeriver {
    /// Create a deriver using the configured placeholder username.
    pub fn new(ctx: &SyncContext) -> Self {
        Self::with_default_username(ctx.config.default_username.clone())
    }

    /// Create a deriver with an explicit placeholder username.
    pub fn with_default_username(default_username: impl Into<String>) -> Self {
        Self {
            default_username: default_username.into(),
        }
    }

    /// Derive the aggregate view. Deterministic and side-effect free.
    pub fn derive(&self, records: &[PackageRecord]) -> AggregateView {
        let total_coins = records
            .iter()
            .fold(0u64, |sum, r| sum.saturating_add(r.price));

        let latest_package = latest(records).cloned();

        let display_username = latest_package
            .as_ref()
            .and_then(|p| p.username.clone())
            .unwrap_or_else(|| self.default_username.clone());

        AggregateView {
            total_coins,
            latest_package,
            display_username,
            package_count: records.len(),
        }
    }
}

/// First record holding the maximum `updated_at`.
fn latest(records: &[PackageRecord]) -> Option<&PackageRecord> {
    records.iter().fold(None, |best: Option<&PackageRecord>, r| match best {
        Some(b) if b.updated_at >= r.updated_at => Some(b),
        _ => Some(r),
    })
}

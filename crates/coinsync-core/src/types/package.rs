//! Package records observed from the store.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::PackageId;

/// Lifecycle status of a coin package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageStatus {
    /// Purchased or assigned and counting towards the balance.
    Active,
    /// Awaiting payment confirmation.
    Pending,
    /// No longer valid.
    Expired,
    /// Cancelled by the user or an operator.
    Cancelled,
    /// Any value the store holds that this client does not know.
    #[serde(untagged)]
    Other(String),
}

impl PackageStatus {
    /// The value stored in the `status` field.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
            Self::Other(raw) => raw,
        }
    }

    /// Whether the record is part of the observed set.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for PackageStatus {
    fn from(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            "pending" => Self::Pending,
            "expired" => Self::Expired,
            "cancelled" => Self::Cancelled,
            other => Self::Other(other.to_string()),
        }
    }
}

impl FromStr for PackageStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

/// One purchased/assigned coin package, normalized from a raw document.
///
/// Held only for the lifetime of the snapshot it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Store-assigned document key.
    pub id: PackageId,
    /// Lifecycle status.
    pub status: PackageStatus,
    /// Coin amount of the package.
    pub price: u64,
    /// Display label of the package owner.
    pub username: Option<String>,
    /// Creation time, epoch when absent or malformed.
    pub created_at: DateTime<Utc>,
    /// Last modification time, epoch when absent or malformed.
    pub updated_at: DateTime<Utc>,
    /// Fields this client does not interpret, passed through untouched.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl PackageRecord {
    /// Canonical ordering: most recent `updated_at` first.
    ///
    /// Equal timestamps compare equal, so a stable sort keeps the store's
    /// delivery order for ties.
    pub fn canonical_cmp(a: &Self, b: &Self) -> Ordering {
        b.updated_at.cmp(&a.updated_at)
    }
}

/// Sort records into canonical order in place (stable).
pub fn sort_canonical(records: &mut [PackageRecord]) {
    records.sort_by(PackageRecord::canonical_cmp);
}

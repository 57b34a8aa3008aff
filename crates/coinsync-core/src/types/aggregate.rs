//! Derived balance view and the denormalized write-back document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::package::PackageRecord;

/// Balance derived from the current package records.
///
/// Never a source of truth; recomputed from every snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateView {
    /// Sum of `price` over all observed records.
    pub total_coins: u64,
    /// Most recently modified record, if any.
    pub latest_package: Option<PackageRecord>,
    /// Username of the latest record, or the configured placeholder.
    pub display_username: String,
    /// Number of records the aggregate was derived from.
    pub package_count: usize,
}

impl AggregateView {
    /// Whether the aggregate was derived from zero records.
    pub fn is_empty(&self) -> bool {
        self.package_count == 0
    }
}

/// Per-identity totals document written back to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalCoinsDocument {
    /// Derived coin total.
    pub total_coins: u64,
    /// Username from the latest record. Left out of the write when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// When the client computed this document.
    pub updated_at: DateTime<Utc>,
}

impl TotalCoinsDocument {
    /// Field map used for the merge upsert.
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("totalCoins".to_string(), Value::from(self.total_coins));
        if let Some(username) = &self.username {
            fields.insert("username".to_string(), Value::from(username.clone()));
        }
        fields.insert(
            "updatedAt".to_string(),
            super::timestamp::to_native(self.updated_at),
        );
        fields
    }
}

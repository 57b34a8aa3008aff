//! Sync pipeline configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Collection names, query shape, and timing for the sync engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Collection holding the package records.
    #[serde(default = "default_packages_collection")]
    pub packages_collection: String,
    /// Collection receiving the per-identity totals document.
    #[serde(default = "default_totals_collection")]
    pub totals_collection: String,
    /// Field the live query orders by (descending).
    #[serde(default = "default_order_field")]
    pub order_field: String,
    /// Username shown when no package exists.
    #[serde(default = "default_username")]
    pub default_username: String,
    /// How long anonymous identity issuance may take.
    #[serde(default = "default_bootstrap_timeout")]
    pub bootstrap_timeout_seconds: u64,
    /// How long shutdown waits for an in-flight write-back.
    #[serde(default = "default_write_back_drain")]
    pub write_back_drain_seconds: u64,
}

impl SyncConfig {
    /// Bootstrap timeout as a [`Duration`].
    pub fn bootstrap_timeout(&self) -> Duration {
        Duration::from_secs(self.bootstrap_timeout_seconds)
    }

    /// Write-back drain window as a [`Duration`].
    pub fn write_back_drain(&self) -> Duration {
        Duration::from_secs(self.write_back_drain_seconds)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            packages_collection: default_packages_collection(),
            totals_collection: default_totals_collection(),
            order_field: default_order_field(),
            default_username: default_username(),
            bootstrap_timeout_seconds: default_bootstrap_timeout(),
            write_back_drain_seconds: default_write_back_drain(),
        }
    }
}

fn default_packages_collection() -> String {
    "packages".to_string()
}

fn default_totals_collection() -> String {
    "totalCoins".to_string()
}

fn default_order_field() -> String {
    "updatedAt".to_string()
}

fn default_username() -> String {
    "User".to_string()
}

fn default_bootstrap_timeout() -> u64 {
    30
}

fn default_write_back_drain() -> u64 {
    5
}

//! Backing store configuration for the headless shell.

use serde::{Deserialize, Serialize};

/// Settings for the in-memory store the shell binary runs against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON file holding an array of package documents to seed.
    #[serde(default)]
    pub seed_file: Option<String>,
    /// Start with this identity already signed in instead of issuing one.
    #[serde(default)]
    pub existing_identity: Option<String>,
}

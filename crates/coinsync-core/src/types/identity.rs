//! Session identity issued by the identity provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::IdentityId;

/// An opaque, store-issued session identity for this device/user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The store-issued key; write-back documents are keyed by it.
    pub id: IdentityId,
    /// Whether the identity was issued without user credentials.
    pub anonymous: bool,
    /// When the provider issued the identity.
    pub issued_at: DateTime<Utc>,
}

impl Identity {
    /// Create an anonymous identity issued now.
    pub fn anonymous(id: impl Into<IdentityId>) -> Self {
        Self {
            id: id.into(),
            anonymous: true,
            issued_at: Utc::now(),
        }
    }

    /// Whether both values refer to the same store identity.
    pub fn same_as(&self, other: &Identity) -> bool {
        self.id == other.id
    }
}

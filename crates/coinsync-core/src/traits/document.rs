//! Document upsert boundary.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::result::AppResult;

/// Writes documents to the store.
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug + 'static {
    /// Create or update `collection/key`.
    ///
    /// With `merge`, only the given fields are written and all other
    /// fields of an existing document survive; without it the document
    /// is replaced.
    async fn upsert(
        &self,
        collection: &str,
        key: &str,
        fields: Map<String, Value>,
        merge: bool,
    ) -> AppResult<()>;
}

//! Raw snapshots as delivered by the live query.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One document in a snapshot: its key plus opaque store fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    /// Store-assigned document key.
    pub id: String,
    /// Document fields in store-native encoding.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl RawDocument {
    /// Create a document from a key and a JSON object.
    ///
    /// Non-object values produce a document with no fields.
    pub fn new(id: impl Into<String>, fields: Value) -> Self {
        let fields = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// The full current result set of a live query, in store order.
///
/// Each snapshot supersedes the previous one; it is never a delta.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSnapshot {
    /// Documents in the order the store delivered them.
    pub documents: Vec<RawDocument>,
}

impl RawSnapshot {
    /// Create a snapshot from documents in store order.
    pub fn new(documents: Vec<RawDocument>) -> Self {
        Self { documents }
    }

    /// Whether the result set is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }
}

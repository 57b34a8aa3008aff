//! Live query description: equality filters and a single ordering.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::package::PackageStatus;
use super::timestamp;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    #[default]
    Desc,
}

/// An ordering on one document field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Field name to order by.
    pub field: String,
    /// Sort direction.
    #[serde(default)]
    pub direction: SortDirection,
}

impl OrderBy {
    /// Create a descending ordering on the given field.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// An equality condition on one document field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    /// Field name.
    pub field: String,
    /// Value the field must equal.
    pub value: Value,
}

impl FieldFilter {
    /// Shorthand for an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// A filtered, ordered live query over one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageQuery {
    /// Collection to query.
    pub collection: String,
    /// All filters must match.
    pub filters: Vec<FieldFilter>,
    /// Requested ordering, if any.
    pub order_by: Option<OrderBy>,
}

impl PackageQuery {
    /// The query the sync engine subscribes to: active packages, newest first.
    pub fn active_packages(collection: impl Into<String>, order_field: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: vec![FieldFilter::eq("status", PackageStatus::Active.as_str())],
            order_by: Some(OrderBy::desc(order_field)),
        }
    }

    /// Whether a document's fields satisfy every filter.
    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        self.filters
            .iter()
            .all(|f| fields.get(&f.field) == Some(&f.value))
    }

    /// Sort key for a document under this query's ordering field.
    ///
    /// Timestamp-shaped values sort by time; anything else sorts as epoch.
    pub fn order_key(&self, fields: &Map<String, Value>) -> chrono::DateTime<chrono::Utc> {
        match &self.order_by {
            Some(order) => timestamp::normalize(fields.get(&order.field)).or_epoch(),
            None => timestamp::EPOCH,
        }
    }
}

//! Core type definitions used across the CoinSync workspace.

pub mod aggregate;
pub mod id;
pub mod identity;
pub mod package;
pub mod query;
pub mod snapshot;
pub mod timestamp;

pub use aggregate::{AggregateView, TotalCoinsDocument};
pub use id::*;
pub use identity::Identity;
pub use package::{PackageRecord, PackageStatus};
pub use query::{FieldFilter, OrderBy, PackageQuery, SortDirection};
pub use snapshot::{RawDocument, RawSnapshot};

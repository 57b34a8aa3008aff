//! # coinsync-core
//!
//! Core crate for CoinSync. Contains the collaborator traits the sync
//! engine talks to (identity provider, live query, document store),
//! configuration schemas, domain types, the subscription primitive,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other CoinSync crates.

pub mod config;
pub mod error;
pub mod result;
pub mod subscription;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;

//! Convenience result type alias for CoinSync.

use crate::error::AppError;

/// A specialized `Result` type for CoinSync operations.
pub type AppResult<T> = Result<T, AppError>;

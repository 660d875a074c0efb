//! Convenience result type alias for Keydrop.

use crate::error::AppError;

/// A specialized `Result` type for Keydrop operations.
pub type AppResult<T> = Result<T, AppError>;

//! Convenience result type alias for AudioGate.

use crate::error::AppError;

/// A specialized `Result` type for AudioGate operations.
pub type AppResult<T> = Result<T, AppError>;

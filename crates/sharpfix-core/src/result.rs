//! Result type alias for code-fix operations

use std::fmt::Display;

use crate::error::SharpfixError;

/// Standard Result type for code-fix operations
pub type Result<T> = std::result::Result<T, SharpfixError>;

/// Extension methods for fix results
pub trait ResultExt<T> {
    /// Turn a recoverable error into `None`, logged against `subject`;
    /// other errors still propagate
    fn skip_recoverable(self, subject: &dyn Display) -> Result<Option<T>>;
}

impl<T> ResultExt<T> for Result<T> {
    fn skip_recoverable(self, subject: &dyn Display) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_recoverable() => {
                tracing::warn!("Skipping {}: {}", subject, err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

//! Library Error Types
//!
//! Each module carries its own error kinds; the public entry points wrap
//! them in one of these so callers see which operation failed while the
//! module-level frame stays in the tree.

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("failed to import package")]
    Import,
    #[display("failed to delete package")]
    Delete,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

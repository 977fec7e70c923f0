//! Error types for the [`scan`](super) module.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A scan error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for scan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies scan failures.
///
/// Only [`AlreadyScanning`](Self::AlreadyScanning) is ever returned from
/// [`Scanner::scan`](super::Scanner::scan); the others are logged and
/// reported as events while the scan carries on.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Another scan is running on the same [`Scanner`](super::Scanner).
    #[display("a scan is already in progress")]
    AlreadyScanning,
    /// A scan root has no package directory to walk.
    #[display("scan root has no package directory: {}", _0.display())]
    InvalidRoot(#[error(not(source))] PathBuf),
    /// The store could not say which files were already imported.
    #[display("could not read imported package paths")]
    Cache,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AlreadyScanning | Self::Cache)
    }
}

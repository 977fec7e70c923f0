//! Error types for the [`import`](super) module.
//!
//! Variants carry the message of the failure underneath them so a scan can
//! report *why* a package was rejected without walking the error tree; the
//! original error is still attached as a child frame.

use derive_more::{Display, Error};

/// An import error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for import operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of an import failure.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The file name, archive or manifest could not be used.
    #[display("{_0}")]
    Package(#[error(not(source))] String),
    /// Reading from or writing to the
    /// [package store](varstash_cache::Repository) failed.
    #[display("package store failure: {_0}")]
    Cache(#[error(not(source))] String),
    /// A blocking worker panicked or was cancelled by the runtime.
    #[display("background task failed")]
    Task,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Cache(_))
    }

    #[track_caller]
    pub(crate) fn package(err: varstash_package::error::Error) -> Error {
        let message = (*err).to_string();
        err.raise(Self::Package(message))
    }

    #[track_caller]
    pub(crate) fn cache(err: varstash_cache::error::Error) -> Error {
        let message = (*err).to_string();
        err.raise(Self::Cache(message))
    }
}

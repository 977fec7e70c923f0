use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A source could not be read or did not match the expected shape.
    #[display("failed to load configuration")]
    Load,
    /// Values were read but are not usable.
    #[display("invalid configuration: {_0}")]
    Invalid(#[error(not(source))] String),
    #[display("failed to save configuration to {}", _0.display())]
    Save(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Save(_))
    }
}

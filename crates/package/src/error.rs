//! Package Error Types
//!
//! Every error here concerns a single package file. The import pipeline
//! records them against that file and moves on to the next one.

use derive_more::{Display, Error};

/// A package error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for package operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The first dot-separated segment of the file name is empty.
    #[display("invalid creator name in package file name: {_0}")]
    InvalidCreatorName(#[error(not(source))] String),
    /// The second dot-separated segment of the file name is empty.
    #[display("invalid package name in package file name: {_0}")]
    InvalidPackageName(#[error(not(source))] String),
    /// The third dot-separated segment is missing or not a whole number.
    #[display("invalid version in package file name: {_0}")]
    InvalidVersion(#[error(not(source))] String),
    /// The archive has no `meta.json`, or it is empty.
    #[display("manifest missing from package")]
    ManifestMissing,
    /// The `meta.json` entry is not a JSON object.
    #[display("manifest is not valid: {_0}")]
    ManifestInvalid(#[error(not(source))] String),
    /// The file could not be opened or is not a zip container.
    #[display("unreadable package archive: {_0}")]
    Archive(#[error(not(source))] String),
    /// A named entry does not exist in the archive.
    #[display("entry not found in package: {_0}")]
    EntryNotFound(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // A package is either readable or it is not; rescanning the same
        // bytes gives the same answer.
        false
    }

    /// Whether this error means the manifest could not be used.
    pub fn is_manifest_error(&self) -> bool {
        matches!(self, Self::ManifestMissing | Self::ManifestInvalid(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            ErrorKind::InvalidCreatorName(".MyScene.3".to_string()).to_string(),
            "invalid creator name in package file name: .MyScene.3"
        );
        assert_eq!(ErrorKind::ManifestMissing.to_string(), "manifest missing from package");
    }

    #[test]
    fn test_nothing_is_retryable() {
        assert!(!ErrorKind::ManifestMissing.is_retryable());
        assert!(!ErrorKind::Archive("truncated".to_string()).is_retryable());
    }

    #[test]
    fn test_manifest_errors() {
        assert!(ErrorKind::ManifestMissing.is_manifest_error());
        assert!(ErrorKind::ManifestInvalid("array".to_string()).is_manifest_error());
        assert!(!ErrorKind::EntryNotFound("a.jpg".to_string()).is_manifest_error());
    }
}

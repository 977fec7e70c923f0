//! Relative path validation for storage backends.
//!
//! Image paths are built from creator names and archive entry names, both of
//! which come from untrusted package files. Everything handed to a backend
//! goes through [`validate`] first so that nothing can land outside the
//! backend root.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a storage path and returns it in normalized form.
///
/// `.` components and repeated separators are dropped, `..` is resolved
/// against the preceding component, and a path that would climb out of the
/// root (or that resolves to nothing) is rejected with
/// [`InvalidPath`](crate::error::ErrorKind::InvalidPath). Null bytes and
/// drive prefixes are rejected too.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use varstash_storage::validate_path;
///
/// assert!(validate_path("Alice/scene-preview.jpg").is_ok());
/// assert!(validate_path("../Alice/scene-preview.jpg").is_err());
/// assert_eq!(
///     validate_path("Alice/./thumbs/../scene.png").unwrap(),
///     Path::new("Alice/scene.png")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(original.to_path_buf());
    let mut components = Vec::new();
    for component in original.components() {
        match component {
            Component::Normal(segment) => {
                // Null bytes survive Path::components() on Unix but truncate
                // the path once it reaches a syscall.
                if segment.as_encoded_bytes().contains(&0) {
                    exn::bail!(invalid());
                }
                components.push(segment);
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    if components.is_empty() {
        exn::bail!(invalid());
    }
    Ok(components.into_iter().collect())
}

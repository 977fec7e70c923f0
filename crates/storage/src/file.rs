//! Snapshot of a file found by the lister.

use std::path::PathBuf;
use time::UtcDateTime;

/// A regular file discovered while walking a scan root.
///
/// Captures filesystem state at listing time; nothing here is refreshed
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedFile {
    /// File name including extension, e.g. `Alice.MyScene.3.var`.
    pub name: String,
    /// Full path as discovered (root joined with the relative walk).
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Creation time, falling back to the modification time on filesystems
    /// that don't record a birth time.
    pub created_at: UtcDateTime,
}
impl ListedFile {
    /// File name without its final extension.
    pub fn base_name(&self) -> &str {
        self.name.rsplit_once('.').map_or(self.name.as_str(), |(stem, _)| stem)
    }

    /// Path rendered as a string, the form used to match against previously
    /// imported records.
    pub fn path_string(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

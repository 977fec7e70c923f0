//! Recursive file listing for scan roots.
//!
//! Unlike the [`StorageBackend`](crate::StorageBackend) methods this never
//! fails: directories that can't be read are logged and skipped, and the
//! caller gets whatever was found elsewhere in the tree.

use crate::file::ListedFile;
use async_stream::stream;
use futures::{Stream, StreamExt};
use std::collections::HashSet;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use time::UtcDateTime;
use tokio::fs;

/// Collect every regular file under `root` whose name ends with `extension`.
///
/// Convenience wrapper around [`list_stream()`].
pub async fn list(root: &Path, extension: &str) -> Vec<ListedFile> {
    list_stream(root, extension).collect().await
}

/// Stream every regular file under `root` whose name ends with `extension`.
///
/// The suffix match is literal and case-sensitive (`.var` does not match
/// `Scene.VAR`). Files are yielded in directory enumeration order, which is
/// filesystem dependent. Symlinks are followed; a directory reached twice
/// (through a link cycle or two links to the same target) is walked once.
///
/// # Examples
///
/// ```no_run
/// use futures::StreamExt;
/// use std::path::Path;
///
/// # async fn example() {
/// let mut files = std::pin::pin!(varstash_storage::list_stream(Path::new("/vam/AddonPackages"), ".var"));
/// while let Some(file) = files.next().await {
///     println!("{} ({} bytes)", file.path.display(), file.size);
/// }
/// # }
/// ```
pub fn list_stream<'a>(root: &'a Path, extension: &'a str) -> impl Stream<Item = ListedFile> + Send + 'a {
    let mut stack = vec![root.to_path_buf()];
    let mut visited = HashSet::new();
    stream! {
        while let Some(current) = stack.pop() {
            match fs::canonicalize(&current).await {
                Ok(canonical) if !visited.insert(canonical.clone()) => continue,
                Ok(_) => {},
                Err(err) => {
                    tracing::debug!(path = %current.display(), error = %err, "skipping unresolvable directory");
                    continue;
                },
            }
            let mut entries = match fs::read_dir(&current).await {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::debug!(path = %current.display(), error = %err, "skipping unreadable directory");
                    continue;
                },
            };
            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(err) => {
                        tracing::debug!(path = %current.display(), error = %err, "directory listing interrupted");
                        break;
                    },
                };
                let path = entry.path();
                let metadata = match fs::metadata(&path).await {
                    Ok(metadata) => metadata,
                    Err(err) => {
                        tracing::debug!(path = %path.display(), error = %err, "skipping unreadable entry");
                        continue;
                    },
                };
                if metadata.is_dir() {
                    stack.push(path);
                    continue;
                }
                if !metadata.is_file() {
                    continue;
                }
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.ends_with(extension) {
                    yield listed_file(name, path, &metadata);
                }
            }
        }
    }
}

fn listed_file(name: String, path: PathBuf, metadata: &Metadata) -> ListedFile {
    let created_at = metadata
        .created()
        .or_else(|_| metadata.modified())
        .map(UtcDateTime::from)
        .unwrap_or(UtcDateTime::UNIX_EPOCH);
    ListedFile { name, path, size: metadata.len(), created_at }
}

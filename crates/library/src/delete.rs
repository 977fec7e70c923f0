use crate::error::{ErrorKind as LibraryErrorKind, Result as LibraryResult};
use exn::ResultExt;
use std::path::Path;
use tracing::instrument;
use varstash_cache::{ImportedPackage, Repository};
use varstash_storage::BackendHandle;
use varstash_storage::error::ErrorKind as StorageErrorKind;

/// Remove a package from the store, along with any of its preview images
/// that no remaining package refers to.
///
/// Returns the removed package, or `None` if `id` wasn't in the store. Image
/// files that are already gone are ignored; other image clean-up failures
/// are logged, since the records are already deleted by then.
#[instrument(skip(cache, images))]
pub async fn delete_package(cache: &Repository, images: &BackendHandle, id: &str) -> LibraryResult<Option<ImportedPackage>> {
    let Some(package) = cache.delete(id).await.or_raise(|| LibraryErrorKind::Delete)? else {
        return Ok(None);
    };
    for image in &package.images {
        if cache.count_image_references(&image.path).await.or_raise(|| LibraryErrorKind::Delete)? > 0 {
            tracing::debug!(path = %image.path, "Image is shared with another package; keeping it");
            continue;
        }
        match images.delete(Path::new(&image.path)).await {
            Ok(()) => tracing::debug!(path = %image.path, "Deleted image"),
            Err(err) if matches!(&*err, StorageErrorKind::NotFound(_)) => {},
            Err(err) => tracing::warn!(path = %image.path, error = ?err, "Could not delete image"),
        }
    }
    tracing::info!(package = %package.id, "Deleted package");
    Ok(Some(package))
}

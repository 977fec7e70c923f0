use crate::Context;
use crate::error::{ErrorKind as LibraryErrorKind, Result as LibraryResult};
use crate::import::error::{ErrorKind, Result as ImportResult};
use crate::import::images::{ExtractedImage, materialize};
use exn::ResultExt;
use std::path::PathBuf;
use tracing::instrument;
use varstash_cache::{ImportedPackage, NewPackage, NewPackageFile, Repository};
use varstash_package::{
    Archive, ContentType, Manifest, PackageIdentity, classify, normalize_entry_path, parse_identity, select_images,
};
use varstash_storage::ListedFile;

/// What happened to a package file handed to [`import_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Import {
    /// The package was read and recorded.
    Imported(Box<ImportedPackage>),
    /// A package with the same `Creator.Package.Version` is already in the
    /// store (most likely the same file under another path). Nothing was
    /// written.
    AlreadyExists(String),
}

/// Import one package file.
///
/// The file name must follow the `Creator.Package.Version.var` convention.
/// Preview images that can't be saved are left out; any other failure
/// (unreadable archive, missing manifest, store error) fails the import and
/// leaves the store untouched.
pub async fn import_file(cache: &Repository, ctx: &Context, file: &ListedFile) -> LibraryResult<Import> {
    let identity = parse_identity(file.base_name()).map_err(ErrorKind::package).or_raise(|| LibraryErrorKind::Import)?;
    import_file_inner(cache, ctx, file, &identity).await.or_raise(|| LibraryErrorKind::Import)
}

#[instrument(level = "debug", skip_all, fields(package = %identity))]
pub(crate) async fn import_file_inner(
    cache: &Repository,
    ctx: &Context,
    file: &ListedFile,
    identity: &PackageIdentity,
) -> ImportResult<Import> {
    if cache.exists(&identity.id).await.map_err(ErrorKind::cache)? {
        return Ok(Import::AlreadyExists(identity.id.clone()));
    }

    // Zip access and decompression are synchronous; keep them off the runtime.
    let path = file.path.clone();
    let package_name = identity.package_name.clone();
    let contents = tokio::task::spawn_blocking(move || read_package(path, &package_name))
        .await
        .or_raise(|| ErrorKind::Task)??;
    tracing::debug!(
        package_type = contents.package_type.map(|kind| kind.as_str()),
        images = contents.images.len(),
        "Read package"
    );

    let images = materialize(ctx, &identity.creator_name, contents.images).await;
    let manifest = contents.manifest;
    let package = NewPackage {
        id: identity.id.clone(),
        version: identity.version,
        creator_name: identity.creator_name.clone(),
        description: manifest.description,
        package_type: contents.package_type,
        credits: manifest.credits,
        has_reference_issues: manifest.had_reference_issues,
        license_type: manifest.license_type,
        instructions: manifest.instructions,
        promotional_link: manifest.promotional_link,
        dependencies: manifest.dependencies,
        file: NewPackageFile {
            path: file.path_string(),
            name: file.name.clone(),
            size: file.size,
            birthtime: file.created_at,
        },
        images,
    };
    let imported = cache.create(&package).await.map_err(ErrorKind::cache)?;
    tracing::info!(package = %imported.id, "Imported package");
    Ok(Import::Imported(Box::new(imported)))
}

struct PackageContents {
    manifest: Manifest,
    package_type: Option<ContentType>,
    images: Vec<ExtractedImage>,
}

/// Everything the import needs from the archive, read in one pass.
fn read_package(path: PathBuf, package_name: &str) -> ImportResult<PackageContents> {
    let mut archive = Archive::open(&path).map_err(ErrorKind::package)?;
    let manifest = archive.manifest().map_err(ErrorKind::package)?;
    let package_type = classify(&manifest);
    let candidates = select_images(archive.entries(), &manifest, package_name);
    let images = candidates
        .into_iter()
        .map(|candidate| {
            let bytes = archive.read(&candidate.path).map_err(ErrorKind::package)?;
            Ok(ExtractedImage {
                path: normalize_entry_path(&candidate.path),
                sort_weight: candidate.sort_weight,
                bytes,
            })
        })
        .collect::<ImportResult<Vec<_>>>()?;
    Ok(PackageContents { manifest, package_type, images })
}

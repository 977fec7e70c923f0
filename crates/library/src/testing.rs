//! Fixtures shared by the pipeline tests: real `.var` archives on disk, an
//! in-memory store and a mock image store.

use crate::Context;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::UtcDateTime;
use varstash_cache::{Database, Repository};
use varstash_storage::ListedFile;
use varstash_storage::backend::MockBackend;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub(crate) fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Write a zip archive with the given entries to `dir/name`.
pub(crate) fn write_archive(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(name);
    let mut zip = ZipWriter::new(std::fs::File::create(&path).unwrap());
    for (entry, data) in entries {
        zip.start_file(*entry, SimpleFileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
    path
}

/// A scene package with a manifest listing one scene and its preview image.
pub(crate) fn write_scene_package(dir: &Path, name: &str) -> PathBuf {
    let stem = name.split('.').nth(1).unwrap_or("Scene");
    let scene = format!("Saves/scene/{stem}.json");
    let preview = format!("Saves/scene/{stem}.jpg");
    let manifest = format!(
        r#"{{"licenseType": "CC BY", "description": "A scene", "contentList": ["{scene}"], "dependencies": {{"Bob.Base.1": {{"licenseType": "FC"}}}}}}"#
    );
    let image = png(16, 16);
    write_archive(
        dir,
        name,
        &[("meta.json", manifest.as_bytes()), (scene.as_str(), b"{}".as_slice()), (preview.as_str(), image.as_slice())],
    )
}

pub(crate) fn listed(path: &Path) -> ListedFile {
    let metadata = std::fs::metadata(path).unwrap();
    ListedFile {
        name: path.file_name().unwrap().to_string_lossy().into_owned(),
        path: path.to_path_buf(),
        size: metadata.len(),
        created_at: UtcDateTime::UNIX_EPOCH,
    }
}

pub(crate) async fn store() -> (Database, Repository) {
    let db = Database::connect_in_memory().await.unwrap();
    let repo = Repository::from(&db);
    (db, repo)
}

pub(crate) fn context() -> (Arc<MockBackend>, Context) {
    let backend = Arc::new(MockBackend::default());
    let ctx = Context { images: backend.clone(), image_quality: 70 };
    (backend, ctx)
}

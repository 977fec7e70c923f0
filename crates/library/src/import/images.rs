//! Writing selected preview images to the image store.
//!
//! Images land at `<creator>/<slug><ext>` relative to the image
//! [backend](varstash_storage). An image already present at that path is
//! reused as-is; otherwise it is decoded, shrunk so neither side exceeds
//! [`IMAGE_MAX_DIMENSION`] and re-encoded before being written.
//!
//! Failing to save one image never fails the package: the image is logged
//! and left out of the result.

use crate::Context;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageError};
use rslug::slugify;
use std::path::Path;
use tracing::instrument;
use uuid::Uuid;
use varstash_cache::PackageImage;
use varstash_package::IMAGE_MAX_DIMENSION;
use varstash_storage::StorageBackend;

/// Raw bytes of an archive entry picked by
/// [`select_images`](varstash_package::select_images).
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    /// Normalized entry path inside the archive.
    pub path: String,
    pub sort_weight: i32,
    pub bytes: Vec<u8>,
}

/// Save every image for a package by `creator_name`, returning the records
/// for those that made it to the store.
pub async fn materialize(ctx: &Context, creator_name: &str, images: Vec<ExtractedImage>) -> Vec<PackageImage> {
    let mut saved = Vec::with_capacity(images.len());
    for image in images {
        let target = target_path(creator_name, &image.path);
        if save(ctx, &target, &image.path, image.bytes).await {
            saved.push(PackageImage {
                id: Uuid::new_v4(),
                path: target,
                sort: image.sort_weight,
            });
        }
    }
    saved
}

#[instrument(level = "debug", skip(ctx, bytes), fields(backend = ctx.images.name()))]
async fn save(ctx: &Context, target: &str, entry: &str, bytes: Vec<u8>) -> bool {
    let path = Path::new(target);
    match ctx.images.exists(path).await {
        Ok(true) => {
            tracing::debug!("Image already saved; reusing it");
            return true;
        },
        Ok(false) => {},
        // Writing will most likely fail too, but let that decide.
        Err(err) => tracing::debug!(error = ?err, "Could not check for an existing image"),
    }

    let format = ImageKind::from_path(target);
    let quality = ctx.image_quality;
    let encoded = match tokio::task::spawn_blocking(move || transcode(&bytes, format, quality)).await {
        Ok(Ok(encoded)) => encoded,
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "Could not re-encode image; skipping it");
            return false;
        },
        Err(err) => {
            tracing::warn!(error = %err, "Image worker failed; skipping image");
            return false;
        },
    };
    if let Err(err) = ctx.images.write(path, &encoded).await {
        tracing::warn!(error = ?err, "Could not save image; skipping it");
        return false;
    }
    tracing::debug!(size = encoded.len(), "Saved image");
    true
}

/// Relative store path for an image entry: the creator's directory, then the
/// slugified file stem with the original extension.
pub(crate) fn target_path(creator_name: &str, entry: &str) -> String {
    let file_name = entry.rsplit(['/', '\\']).next().unwrap_or(entry);
    let (stem, extension) = match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => (stem, format!(".{extension}")),
        _ => (file_name, String::new()),
    };
    let slug = slug(stem);
    let slug = if slug.is_empty() { "image" } else { slug.as_str() };
    format!("{creator_name}/{slug}{extension}")
}

/// Quotation marks are dropped before slugifying; otherwise `Bob's` would
/// become `bob-s`.
fn slug(value: &str) -> String {
    // Various quotation marks: '"''""„"`«»
    let marks = [
        '\u{0027}', '\u{0022}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{201E}', '\u{201B}', '\u{0060}',
        '\u{00AB}', '\u{00BB}', '\u{2039}', '\u{203A}',
    ];
    let stripped: String = value.chars().filter(|c| !marks.contains(c)).collect();
    slugify!(&stripped)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageKind {
    Jpeg,
    Png,
}
impl ImageKind {
    fn from_path(path: &str) -> Self {
        let is_png = path.rsplit_once('.').is_some_and(|(_, extension)| extension.eq_ignore_ascii_case("png"));
        if is_png { Self::Png } else { Self::Jpeg }
    }
}

fn transcode(bytes: &[u8], kind: ImageKind, quality: u8) -> Result<Vec<u8>, ImageError> {
    let image = image::load_from_memory(bytes)?;
    let image = if image.width() > IMAGE_MAX_DIMENSION || image.height() > IMAGE_MAX_DIMENSION {
        image.resize(IMAGE_MAX_DIMENSION, IMAGE_MAX_DIMENSION, FilterType::Lanczos3)
    } else {
        image
    };
    let mut encoded = Vec::new();
    match kind {
        ImageKind::Png => image.write_with_encoder(PngEncoder::new(&mut encoded))?,
        ImageKind::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut encoded, quality.clamp(1, 100)))?
        },
    }
    Ok(encoded)
}

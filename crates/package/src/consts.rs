/// Subdirectory of a VaM install that holds addon packages.
pub const ADDON_PACKAGES_DIR: &str = "AddonPackages";
/// Extension of addon package archives.
pub const PACKAGE_EXTENSION: &str = ".var";
/// Entry name of the manifest inside every package.
pub(crate) const MANIFEST_ENTRY: &str = "meta.json";
/// Images are downsampled so that neither side exceeds this many pixels.
pub const IMAGE_MAX_DIMENSION: u32 = 512;

pub(crate) const IMAGE_EXTENSIONS: &[&str] = &["jpg", "png"];
/// Entries under a folder with this marker are textures, not previews.
pub(crate) const TEXTURE_MARKER: &str = "Texture";
/// Extensions of files that carry package content (as opposed to previews).
pub(crate) const CONTENT_EXTENSIONS: &[&str] = &[
    "var",
    "vac",
    "vmb",
    "vmi",
    "dsf",
    "vab",
    "vaj",
    "vam",
    "vap",
    "fav",
    "cs",
    "json",
    "assetbundle",
];
/// Only the leading entries of a content list are inspected when classifying.
pub(crate) const CLASSIFY_MAX_ENTRIES: usize = 3;
/// Fallback image candidates must score strictly above this.
pub(crate) const SIMILARITY_THRESHOLD: f64 = 80.0;

/// Archive entry names written on Windows use backslashes.
pub fn normalize_entry_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Lowercased extension of the last path component, without the dot.
pub(crate) fn extension(path: &str) -> Option<String> {
    let name = file_name(path);
    name.rsplit_once('.').filter(|(stem, _)| !stem.is_empty()).map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Last path component, accepting either separator.
pub(crate) fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Last path component without its extension.
pub(crate) fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

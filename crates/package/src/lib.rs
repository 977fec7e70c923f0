//! Everything that can be learned about a `.var` package without touching
//! the database: its identity (from the file name), its manifest, what kind
//! of content it carries and which of its entries are preview images.

mod archive;
mod consts;
mod content;
pub mod error;
mod identity;
mod images;
mod manifest;
mod similarity;

pub use crate::archive::Archive;
pub use crate::consts::{ADDON_PACKAGES_DIR, IMAGE_MAX_DIMENSION, PACKAGE_EXTENSION, normalize_entry_path};
pub use crate::content::{ContentType, classify};
pub use crate::identity::{PackageIdentity, parse_identity};
pub use crate::images::{ImageCandidate, select_images};
pub use crate::manifest::{Dependency, Manifest};
pub use crate::similarity::similarity;

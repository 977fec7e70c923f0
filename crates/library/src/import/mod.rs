//! Importing a single package file.
//!
//! [`import_file`] takes one `.var` file from the [lister](varstash_storage::list)
//! through to the [package store](varstash_cache): identity from the file
//! name, manifest and content type from the archive, preview images into the
//! image store, and finally one atomic store write.

pub mod error;
mod file;
mod images;

pub use self::file::{Import, import_file};
pub(crate) use self::file::import_file_inner;
pub use self::images::{ExtractedImage, materialize};

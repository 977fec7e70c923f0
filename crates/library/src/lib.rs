//! The package import pipeline.
//!
//! [`Scanner`] walks VaM install directories for `.var` packages that
//! haven't been imported yet and imports each one with [`import_file`]:
//! manifest, content type and preview images go into the
//! [package store](varstash_cache), and the images themselves are written to
//! the image [storage backend](varstash_storage).

mod delete;
pub mod error;
mod events;
pub mod import;
mod progress;
pub mod scan;
#[cfg(test)]
mod testing;

pub use crate::delete::delete_package;
pub use crate::events::{EventSink, ScanEvent};
pub use crate::import::{Import, import_file};
pub use crate::scan::{ImportFailure, ScanOutcome, ScanReport, ScanState, Scanner};
use varstash_storage::BackendHandle;

/// Shared settings for importing packages.
#[derive(Clone)]
pub struct Context {
    /// Where preview images are written.
    pub images: BackendHandle,
    /// JPEG quality (0-100) for re-encoded preview images.
    pub image_quality: u8,
}

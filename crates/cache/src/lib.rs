//! SQLite package store.
//!
//! Tracks which package files have been imported, along with the metadata
//! read from them and the preview images extracted for them.
//!
//! # Architecture
//! - **Creators** are keyed by their unique name and created on first use.
//! - **Packages** are keyed by their `Creator.Package.Version` id; a package
//!   is written once and never updated.
//! - Every package has exactly one **file** record (the `.var` on disk) and
//!   any number of **images**. Both cascade when the package is deleted.

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::models::{Creator, ImportedPackage, NewPackage, NewPackageFile, PackageFile, PackageImage, Pagination};
pub use crate::repo::Repository;

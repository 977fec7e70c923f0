//! Finding and importing new packages.
//!
//! A [`Scanner`] turns a list of VaM install directories into imported
//! packages. Each root's `AddonPackages` directory is walked for `.var`
//! files, files whose path is already in the store are dropped, and the rest
//! are imported one at a time, grouped by creator. Progress and failures are
//! reported through an [`EventSink`](crate::EventSink) as the scan goes, and
//! a summary is returned at the end.
//!
//! A single file failing (bad name, broken archive, store error) is recorded
//! and skipped; nothing short of a second concurrent scan stops a scan early,
//! except cancellation.

pub mod error;
mod scanner;

pub use self::scanner::{ImportFailure, ScanOutcome, ScanReport, ScanState, Scanner};

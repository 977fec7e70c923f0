use crate::Context;
use crate::events::{EventSink, ScanEvent};
use crate::import::error::ErrorKind as ImportErrorKind;
use crate::import::{Import, import_file_inner};
use crate::progress::Progress;
use crate::scan::error::{ErrorKind, Result as ScanResult};
use exn::ResultExt;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use varstash_cache::{ImportedPackage, Repository};
use varstash_package::error::Result as PackageResult;
use varstash_package::{ADDON_PACKAGES_DIR, PACKAGE_EXTENSION, PackageIdentity, parse_identity};
use varstash_storage::{ListedFile, list};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
}

/// How a scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Every candidate file was processed.
    Stopped,
    /// The cancellation token fired before every file was processed.
    Cancelled,
}

/// A file (or scan root) that could not be imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Summary of a finished scan.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub outcome: ScanOutcome,
    /// Packages imported by this scan, in import order.
    pub imported: Vec<ImportedPackage>,
    /// Files skipped because a package with the same identity already exists.
    pub skipped: usize,
    pub errors: Vec<ImportFailure>,
    pub duration: Duration,
}

/// Runs scans against one package store and image store.
///
/// Only one scan may run at a time per `Scanner`; a second call to
/// [`scan`](Self::scan) while the first is in flight is rejected rather
/// than queued.
pub struct Scanner {
    cache: Repository,
    ctx: Context,
    scanning: AtomicBool,
}

impl Scanner {
    pub fn new(cache: Repository, ctx: Context) -> Self {
        Self { cache, ctx, scanning: AtomicBool::new(false) }
    }

    pub fn state(&self) -> ScanState {
        if self.scanning.load(Ordering::Acquire) { ScanState::Scanning } else { ScanState::Idle }
    }

    /// Import every package under `roots` that isn't in the store yet.
    ///
    /// Emits [`ScanEvent`]s to `events` in the documented order and checks
    /// `cancel` before each file. A cancelled scan keeps everything imported
    /// so far. The store is left open; closing it is up to the caller.
    #[instrument(skip_all, fields(roots = roots.len()))]
    pub async fn scan(
        &self,
        roots: &[PathBuf],
        events: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> ScanResult<ScanReport> {
        let Some(_guard) = ScanGuard::acquire(&self.scanning) else {
            exn::bail!(ErrorKind::AlreadyScanning);
        };
        let started = Instant::now();
        events.emit(ScanEvent::Started);
        tracing::info!("Scan started");

        let mut errors = Vec::new();
        let pending = self.discover(roots, events, &mut errors).await;
        let mut progress = Progress::new(pending.len());
        let mut imported = Vec::new();
        let mut skipped = 0;
        let mut outcome = ScanOutcome::Stopped;

        for candidate in group_by_creator(pending) {
            if cancel.is_cancelled() {
                outcome = ScanOutcome::Cancelled;
                break;
            }
            let file = candidate.file;
            let result = match candidate.identity {
                Ok(identity) => import_file_inner(&self.cache, &self.ctx, &file, &identity).await,
                Err(err) => Err(ImportErrorKind::package(err)),
            };
            match result {
                Ok(Import::Imported(package)) => {
                    events.emit(ScanEvent::Imported(package.clone()));
                    imported.push(*package);
                },
                Ok(Import::AlreadyExists(id)) => {
                    tracing::info!(package = %id, path = %file.path.display(), "Package already imported from another path; skipping");
                    skipped += 1;
                },
                Err(err) => {
                    tracing::error!(path = %file.path.display(), error = ?err, "Could not import package");
                    let message = format!("{}: {}", file.name, &*err);
                    record(events, &mut errors, file.path, message);
                },
            }
            if let Some(percent) = progress.advance() {
                events.emit(ScanEvent::Progress(percent));
            }
            // Give the UI (and the cancellation token) a chance between files.
            tokio::task::yield_now().await;
        }

        let duration = started.elapsed();
        match outcome {
            ScanOutcome::Stopped => {
                tracing::info!(imported = imported.len(), skipped, errors = errors.len(), ?duration, "Scan complete")
            },
            ScanOutcome::Cancelled => {
                tracing::warn!(imported = imported.len(), skipped, errors = errors.len(), ?duration, "Scan cancelled")
            },
        }
        events.emit(ScanEvent::Stopped(imported.len()));
        Ok(ScanReport { outcome, imported, skipped, errors, duration })
    }

    /// List the `.var` files under every root's package directory that
    /// aren't in the store yet. A file reachable from two roots is kept once.
    async fn discover(
        &self,
        roots: &[PathBuf],
        events: &dyn EventSink,
        errors: &mut Vec<ImportFailure>,
    ) -> Vec<ListedFile> {
        if roots.is_empty() {
            tracing::warn!("No scan roots configured; nothing to scan");
            return Vec::new();
        }
        let existing: HashSet<String> = match self.cache.find_existing_paths().await.or_raise(|| ErrorKind::Cache) {
            Ok(paths) => paths.into_iter().collect(),
            Err(err) => {
                tracing::error!(error = ?err, "Could not read imported packages; nothing will be scanned");
                for root in roots {
                    record(events, errors, root.clone(), (*err).to_string());
                }
                return Vec::new();
            },
        };

        let mut seen = HashSet::new();
        let mut pending = Vec::new();
        for root in roots {
            let dir = root.join(ADDON_PACKAGES_DIR);
            if !tokio::fs::metadata(&dir).await.is_ok_and(|metadata| metadata.is_dir()) {
                let err = ErrorKind::InvalidRoot(root.clone());
                tracing::error!(dir = %dir.display(), "{err}");
                record(events, errors, root.clone(), err.to_string());
                continue;
            }
            let files = list(&dir, PACKAGE_EXTENSION).await;
            let found = files.len();
            let before = pending.len();
            pending.extend(files.into_iter().filter(|file| {
                let path = file.path_string();
                !existing.contains(&path) && seen.insert(path)
            }));
            tracing::info!(dir = %dir.display(), found, new = pending.len() - before, "Listed packages");
        }
        pending
    }
}

fn record(events: &dyn EventSink, errors: &mut Vec<ImportFailure>, path: PathBuf, message: String) {
    events.emit(ScanEvent::Error(message.clone()));
    errors.push(ImportFailure { path, message });
}

struct Candidate {
    file: ListedFile,
    identity: PackageResult<PackageIdentity>,
}

/// Order files so each creator's packages are imported together, creators
/// in the order they were first seen. Files whose names don't parse go last.
fn group_by_creator(files: Vec<ListedFile>) -> Vec<Candidate> {
    let mut groups: Vec<Vec<Candidate>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut unparseable = Vec::new();
    for file in files {
        let identity = parse_identity(file.base_name());
        let Ok(creator) = identity.as_ref().map(|identity| identity.creator_name.clone()) else {
            unparseable.push(Candidate { file, identity });
            continue;
        };
        let group = *index.entry(creator).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[group].push(Candidate { file, identity });
    }
    groups.into_iter().flatten().chain(unparseable).collect()
}

/// Holds the "scan in progress" flag and clears it when dropped, including
/// when the scan future is dropped part way through.
struct ScanGuard<'a>(&'a AtomicBool);
impl<'a> ScanGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).ok().map(|_| Self(flag))
    }
}
impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, store, write_archive, write_scene_package};
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use time::UtcDateTime;
    use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
    use varstash_cache::Pagination;
    use varstash_package::ContentType;

    fn install() -> (TempDir, PathBuf) {
        let root = TempDir::new().unwrap();
        let packages = root.path().join(ADDON_PACKAGES_DIR);
        std::fs::create_dir_all(&packages).unwrap();
        (root, packages)
    }

    fn drain(rx: &mut UnboundedReceiver<ScanEvent>) -> Vec<ScanEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn progress(events: &[ScanEvent]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|event| match event {
                ScanEvent::Progress(percent) => Some(*percent),
                _ => None,
            })
            .collect()
    }

    fn listed(name: &str) -> ListedFile {
        ListedFile {
            name: name.to_string(),
            path: Path::new("/vam/AddonPackages").join(name),
            size: 0,
            created_at: UtcDateTime::UNIX_EPOCH,
        }
    }

    /// Cancels the scan as soon as the first package is imported.
    struct CancelAfterFirstImport {
        token: CancellationToken,
        events: Mutex<Vec<ScanEvent>>,
    }
    impl EventSink for CancelAfterFirstImport {
        fn emit(&self, event: ScanEvent) {
            if matches!(event, ScanEvent::Imported(_)) {
                self.token.cancel();
            }
            self.events.lock().unwrap().push(event);
        }
    }

    #[tokio::test]
    async fn test_imports_new_packages_and_reports_failures() {
        let (root, packages) = install();
        let nested = packages.join("Bob");
        std::fs::create_dir_all(&nested).unwrap();
        for index in 0..5 {
            write_scene_package(&packages, &format!("Alice.Scene{index}.1.var"));
        }
        for index in 0..4 {
            write_scene_package(&nested, &format!("Bob.Look{index}.2.var"));
        }
        std::fs::write(packages.join("Alice.Broken.1.var"), b"not a zip").unwrap();
        std::fs::write(packages.join("readme.txt"), b"ignored").unwrap();

        let (_db, cache) = store().await;
        let (images, ctx) = context();
        let scanner = Scanner::new(cache.clone(), ctx);
        let (tx, mut rx) = unbounded_channel();
        let report = scanner.scan(&[root.path().to_path_buf()], &tx, &CancellationToken::new()).await.unwrap();

        assert_eq!(report.outcome, ScanOutcome::Stopped);
        assert_eq!(report.imported.len(), 9);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, packages.join("Alice.Broken.1.var"));
        assert!(report.errors[0].message.starts_with("Alice.Broken.1.var: "));

        let events = drain(&mut rx);
        assert_eq!(events.first(), Some(&ScanEvent::Started));
        assert_eq!(events.last(), Some(&ScanEvent::Stopped(9)));
        assert_eq!(events.iter().filter(|e| matches!(e, ScanEvent::Imported(_))).count(), 9);
        assert_eq!(events.iter().filter(|e| matches!(e, ScanEvent::Error(_))).count(), 1);
        let progress = progress(&events);
        assert!(progress.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(progress.last(), Some(&100));

        let stored = cache.find_many(Pagination { take: 100, skip: 0 }).await.unwrap();
        assert_eq!(stored.len(), 9);
        let scene = cache.get("Alice.Scene0.1").await.unwrap().unwrap();
        assert_eq!(scene.package_type, Some(ContentType::Scene));
        assert_eq!(scene.creator.name, "Alice");
        assert_eq!(scene.license_type.as_deref(), Some("CC BY"));
        assert!(scene.dependencies.contains_key("Bob.Base.1"));
        assert_eq!(scene.images.len(), 1);
        assert_eq!(scene.images[0].path, "Alice/scene0.jpg");
        assert_eq!(scene.file.path, packages.join("Alice.Scene0.1.var").to_string_lossy());
        assert!(images.paths().await.contains(&PathBuf::from("Alice/scene0.jpg")));
        assert_eq!(scanner.state(), ScanState::Idle);
    }

    #[tokio::test]
    async fn test_rescan_imports_nothing_new() {
        let (root, packages) = install();
        write_scene_package(&packages, "Alice.SceneA.1.var");
        write_scene_package(&packages, "Alice.SceneB.1.var");

        let (_db, cache) = store().await;
        let (_images, ctx) = context();
        let scanner = Scanner::new(cache.clone(), ctx);
        let roots = [root.path().to_path_buf()];
        let first = scanner.scan(&roots, &(), &CancellationToken::new()).await.unwrap();
        assert_eq!(first.imported.len(), 2);

        let (tx, mut rx) = unbounded_channel();
        let second = scanner.scan(&roots, &tx, &CancellationToken::new()).await.unwrap();
        assert!(second.imported.is_empty());
        assert!(second.errors.is_empty());
        assert_eq!(drain(&mut rx), vec![ScanEvent::Started, ScanEvent::Stopped(0)]);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_file() {
        let (root, packages) = install();
        write_scene_package(&packages, "Alice.SceneA.1.var");

        let (_db, cache) = store().await;
        let (_images, ctx) = context();
        let scanner = Scanner::new(cache.clone(), ctx);
        let token = CancellationToken::new();
        token.cancel();
        let (tx, mut rx) = unbounded_channel();
        let report = scanner.scan(&[root.path().to_path_buf()], &tx, &token).await.unwrap();

        assert_eq!(report.outcome, ScanOutcome::Cancelled);
        assert!(report.imported.is_empty());
        assert_eq!(drain(&mut rx), vec![ScanEvent::Started, ScanEvent::Stopped(0)]);
        assert!(!cache.exists("Alice.SceneA.1").await.unwrap());
    }

    #[tokio::test]
    async fn test_cancel_keeps_completed_imports() {
        let (root, packages) = install();
        for name in ["Alice.SceneA.1.var", "Alice.SceneB.1.var", "Alice.SceneC.1.var"] {
            write_scene_package(&packages, name);
        }

        let (_db, cache) = store().await;
        let (_images, ctx) = context();
        let scanner = Scanner::new(cache.clone(), ctx);
        let token = CancellationToken::new();
        let sink = CancelAfterFirstImport { token: token.clone(), events: Mutex::new(Vec::new()) };
        let report = scanner.scan(&[root.path().to_path_buf()], &sink, &token).await.unwrap();

        assert_eq!(report.outcome, ScanOutcome::Cancelled);
        assert_eq!(report.imported.len(), 1);
        assert!(cache.exists(&report.imported[0].id).await.unwrap());
        assert_eq!(cache.find_many(Pagination::default()).await.unwrap().len(), 1);
        let events = sink.events.into_inner().unwrap();
        assert_eq!(events.last(), Some(&ScanEvent::Stopped(1)));
    }

    #[tokio::test]
    async fn test_same_package_under_two_roots_is_skipped() {
        let (first_root, first) = install();
        let (second_root, second) = install();
        write_scene_package(&first, "Alice.SceneA.1.var");
        write_scene_package(&second, "Alice.SceneA.1.var");

        let (_db, cache) = store().await;
        let (_images, ctx) = context();
        let scanner = Scanner::new(cache, ctx);
        let roots = [first_root.path().to_path_buf(), second_root.path().to_path_buf()];
        let report = scanner.scan(&roots, &(), &CancellationToken::new()).await.unwrap();

        assert_eq!(report.imported.len(), 1);
        assert_eq!(report.skipped, 1);
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_roots_list_a_file_once() {
        let (root, packages) = install();
        write_scene_package(&packages, "Alice.SceneA.1.var");

        let (_db, cache) = store().await;
        let (_images, ctx) = context();
        let scanner = Scanner::new(cache, ctx);
        let roots = [root.path().to_path_buf(), root.path().to_path_buf()];
        let report = scanner.scan(&roots, &(), &CancellationToken::new()).await.unwrap();

        assert_eq!(report.imported.len(), 1);
        assert_eq!(report.skipped, 0);
    }

    #[tokio::test]
    async fn test_bad_file_names_are_reported() {
        let (root, packages) = install();
        write_scene_package(&packages, "Alice.SceneA.latest.var");
        write_scene_package(&packages, "Loose.var");

        let (_db, cache) = store().await;
        let (_images, ctx) = context();
        let scanner = Scanner::new(cache, ctx);
        let report = scanner.scan(&[root.path().to_path_buf()], &(), &CancellationToken::new()).await.unwrap();

        assert!(report.imported.is_empty());
        let mut messages: Vec<_> = report.errors.iter().map(|failure| failure.message.as_str()).collect();
        messages.sort();
        assert_eq!(
            messages,
            vec![
                "Alice.SceneA.latest.var: invalid version in package file name: Alice.SceneA.latest",
                "Loose.var: invalid package name in package file name: Loose",
            ]
        );
    }

    #[tokio::test]
    async fn test_package_without_manifest_is_reported() {
        let (root, packages) = install();
        write_archive(&packages, "Alice.Empty.1.var", &[("Saves/scene/Empty.json", b"{}".as_slice())]);

        let (_db, cache) = store().await;
        let (images, ctx) = context();
        let scanner = Scanner::new(cache.clone(), ctx);
        let report = scanner.scan(&[root.path().to_path_buf()], &(), &CancellationToken::new()).await.unwrap();

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].message, "Alice.Empty.1.var: manifest missing from package");
        assert!(!cache.exists("Alice.Empty.1").await.unwrap());
        assert!(images.paths().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_package_directory_is_reported() {
        let root = TempDir::new().unwrap();
        let (_db, cache) = store().await;
        let (_images, ctx) = context();
        let scanner = Scanner::new(cache, ctx);
        let (tx, mut rx) = unbounded_channel();
        let report = scanner.scan(&[root.path().to_path_buf()], &tx, &CancellationToken::new()).await.unwrap();

        assert_eq!(report.outcome, ScanOutcome::Stopped);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, root.path());
        let events = drain(&mut rx);
        assert!(matches!(events.as_slice(), [ScanEvent::Started, ScanEvent::Error(_), ScanEvent::Stopped(0)]));
    }

    #[tokio::test]
    async fn test_no_roots_is_a_no_op() {
        let (_db, cache) = store().await;
        let (_images, ctx) = context();
        let scanner = Scanner::new(cache, ctx);
        let report = scanner.scan(&[], &(), &CancellationToken::new()).await.unwrap();
        assert_eq!(report.outcome, ScanOutcome::Stopped);
        assert!(report.imported.is_empty());
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn test_second_scan_is_rejected_while_running() {
        let (_db, cache) = store().await;
        let (_images, ctx) = context();
        let scanner = Scanner::new(cache, ctx);
        let guard = ScanGuard::acquire(&scanner.scanning).unwrap();
        assert_eq!(scanner.state(), ScanState::Scanning);

        let err = scanner.scan(&[], &(), &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::AlreadyScanning));

        drop(guard);
        assert_eq!(scanner.state(), ScanState::Idle);
        assert!(scanner.scan(&[], &(), &CancellationToken::new()).await.is_ok());
    }

    #[test]
    fn test_group_by_creator_keeps_first_seen_order() {
        let files = ["Bob.A.1.var", "Alice.B.1.var", "Broken.var", "Bob.C.1.var", "Alice.D.1.var"].map(listed);
        let order: Vec<_> = group_by_creator(files.into()).into_iter().map(|candidate| candidate.file.name).collect();
        assert_eq!(order, vec!["Bob.A.1.var", "Bob.C.1.var", "Alice.B.1.var", "Alice.D.1.var", "Broken.var"]);
    }
}

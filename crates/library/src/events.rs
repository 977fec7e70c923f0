use tokio::sync::mpsc::UnboundedSender;
use varstash_cache::ImportedPackage;

/// Notifications produced while a scan runs.
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started) exactly once.
/// 2. Any number of [`Progress`](Self::Progress), [`Imported`](Self::Imported)
///    and [`Error`](Self::Error), interleaved in processing order.
/// 3. [`Stopped`](Self::Stopped) exactly once, whether the scan finished or
///    was cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Started,
    /// Percentage (0-100) of candidate files processed. Never decreases and
    /// never repeats a value within one scan.
    Progress(u8),
    Imported(Box<ImportedPackage>),
    /// Human-readable description of a failure that did not stop the scan.
    Error(String),
    /// Number of packages imported by this scan.
    Stopped(usize),
}

/// Receiver of [`ScanEvent`]s, injected into [`Scanner::scan`](crate::Scanner::scan).
///
/// Emitting must not block; a sink that can't deliver an event drops it.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ScanEvent);
}

impl EventSink for UnboundedSender<ScanEvent> {
    fn emit(&self, event: ScanEvent) {
        // The receiver going away (UI closed) is not the scan's problem.
        if self.send(event).is_err() {
            tracing::trace!("scan event receiver dropped");
        }
    }
}

/// Discards every event.
impl EventSink for () {
    fn emit(&self, _event: ScanEvent) {}
}

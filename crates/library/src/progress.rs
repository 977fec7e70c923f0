/// Tracks processed files and reports the rounded percentage only when it
/// changes, so a scan of thousands of files emits at most 100 updates.
/// Counting starts from a 0% baseline, which is never reported itself.
#[derive(Debug)]
pub(crate) struct Progress {
    total: usize,
    done: usize,
    last: u8,
}

impl Progress {
    pub(crate) fn new(total: usize) -> Self {
        Self { total, done: 0, last: 0 }
    }

    /// Mark one more file as processed. Returns the new percentage if it
    /// differs from the last one reported.
    pub(crate) fn advance(&mut self) -> Option<u8> {
        self.done = (self.done + 1).min(self.total);
        let percent = match self.total {
            0 => 100,
            total => ((self.done as f64 / total as f64) * 100.0).round() as u8,
        };
        if self.last == percent {
            return None;
        }
        self.last = percent;
        Some(percent)
    }
}

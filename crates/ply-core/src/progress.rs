//! Progress reporting for long-running reads and writes.

use std::sync::Arc;

/// Callback receiving a completion percentage in `[0, 100]`.
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Sink for coarse-grained progress updates.
///
/// A sink observes the operation; it cannot cancel it.
pub trait ProgressSink {
    fn set_total(&mut self, total: u64);

    /// `count` never decreases between calls.
    fn update(&mut self, count: u64);

    fn finish(&mut self);
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn set_total(&mut self, _total: u64) {}

    fn update(&mut self, _count: u64) {}

    fn finish(&mut self) {}
}

/// Turns counts into percentages for a callback and, optionally, the log.
pub struct CountingProgressReporter {
    callback: Option<ProgressCallback>,
    print_progress: bool,
    total: u64,
    last_count: u64,
    finished: bool,
}

impl CountingProgressReporter {
    pub fn new(callback: Option<ProgressCallback>, print_progress: bool) -> Self {
        Self {
            callback,
            print_progress,
            total: 0,
            last_count: 0,
            finished: false,
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn last_count(&self) -> u64 {
        self.last_count
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn report(&self, percent: f64) {
        if let Some(callback) = &self.callback {
            callback(percent);
        }
        if self.print_progress {
            tracing::info!("progress {:.1}%", percent);
        }
    }
}

impl ProgressSink for CountingProgressReporter {
    fn set_total(&mut self, total: u64) {
        self.total = total;
        self.last_count = 0;
        self.finished = false;
    }

    fn update(&mut self, count: u64) {
        if self.finished || self.total == 0 {
            return;
        }
        self.last_count = count.max(self.last_count).min(self.total);
        self.report(self.last_count as f64 * 100.0 / self.total as f64);
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.last_count = self.total;
        self.report(100.0);
    }
}

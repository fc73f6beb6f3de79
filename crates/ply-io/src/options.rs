use std::fmt;

use ply_core::{CountingProgressReporter, ProgressCallback};

use crate::format::Encoding;

/// Options for reading a point cloud.
#[derive(Clone, Default)]
pub struct ReadOptions {
    /// Log progress percentages at `info` level.
    pub print_progress: bool,
    /// Receives progress percentages in `[0, 100]`.
    pub update_progress: Option<ProgressCallback>,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_print_progress(mut self, print_progress: bool) -> Self {
        self.print_progress = print_progress;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.update_progress = Some(callback);
        self
    }

    pub(crate) fn reporter(&self) -> CountingProgressReporter {
        CountingProgressReporter::new(self.update_progress.clone(), self.print_progress)
    }
}

impl fmt::Debug for ReadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOptions")
            .field("print_progress", &self.print_progress)
            .field("update_progress", &self.update_progress.is_some())
            .finish()
    }
}

/// Options for writing a point cloud. Defaults to binary little-endian.
#[derive(Clone, Default)]
pub struct WriteOptions {
    pub write_ascii: bool,
    pub print_progress: bool,
    pub update_progress: Option<ProgressCallback>,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ascii(mut self, write_ascii: bool) -> Self {
        self.write_ascii = write_ascii;
        self
    }

    pub fn with_print_progress(mut self, print_progress: bool) -> Self {
        self.print_progress = print_progress;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.update_progress = Some(callback);
        self
    }

    pub fn encoding(&self) -> Encoding {
        if self.write_ascii {
            Encoding::Ascii
        } else {
            Encoding::BinaryLittleEndian
        }
    }

    pub(crate) fn reporter(&self) -> CountingProgressReporter {
        CountingProgressReporter::new(self.update_progress.clone(), self.print_progress)
    }
}

impl fmt::Debug for WriteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteOptions")
            .field("write_ascii", &self.write_ascii)
            .field("print_progress", &self.print_progress)
            .field("update_progress", &self.update_progress.is_some())
            .finish()
    }
}

//! Scan progress reporting.
//!
//! Live progress is a trio of monotone atomic counters the UI can read at
//! any time without coordination; terminal outcomes and per-entry error
//! notices travel over a crossbeam channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::model::TreemapMetadata;

/// Monotonically increasing counters updated while a scan runs.
#[derive(Debug, Default)]
pub struct ScanProgress {
    files_scanned: AtomicU64,
    directories_scanned: AtomicU64,
    bytes_processed: AtomicU64,
}

impl ScanProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_file(&self, bytes: u64) {
        self.files_scanned.fetch_add(1, Ordering::Relaxed);
        self.bytes_processed.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_directory(&self) {
        self.directories_scanned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn files_scanned(&self) -> u64 {
        self.files_scanned.load(Ordering::Relaxed)
    }

    pub fn directories_scanned(&self) -> u64 {
        self.directories_scanned.load(Ordering::Relaxed)
    }

    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed.load(Ordering::Relaxed)
    }
}

/// Messages sent from the scan thread.
///
/// The tree itself lives in the shared `LiveTree`; these messages carry
/// only outcomes and lightweight notices.
#[derive(Debug)]
pub enum ScanMessage {
    /// A non-fatal error (e.g. permission denied on one entry); the scan
    /// continues.
    Error { path: String, message: String },
    /// Scanning and post-processing completed.
    Complete {
        metadata: TreemapMetadata,
        duration: Duration,
    },
    /// The scan was cancelled; the tree holds a possibly-partial but fully
    /// post-processed result.
    Cancelled { metadata: TreemapMetadata },
    /// The scan could not start (e.g. the root is not a directory). The
    /// tree holds only its root node.
    Failed { message: String },
}

//! Scanner module — orchestrates filesystem scanning.
//!
//! A scan runs on a dedicated named thread and walks the directory tree in
//! parallel, writing nodes into a **shared `LiveTree`**
//! (`Arc<RwLock<Tree<VizBlock>>>`). When the walk finishes (or is
//! cancelled) the scan thread post-processes the tree single-threadedly:
//! directory sizes are aggregated bottom-up, sizeless nodes are pruned,
//! and every sibling list is sorted descending by size. Only then is the
//! terminal message sent, so readers observing it also observe the fully
//! post-processed tree.

pub mod progress;
pub mod worker;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crossbeam_channel::Receiver;
use parking_lot::RwLock;
use tracing::info;

use crate::model::{FileKind, TreemapMetadata, VizBlock};
use crate::tree::{NodeId, Tree};
use progress::{ScanMessage, ScanProgress};

/// A shared, concurrently-readable visualization tree.
///
/// The scan thread holds the write lock while inserting nodes; the UI may
/// hold a read lock to inspect partial results.
pub type LiveTree = Arc<RwLock<Tree<VizBlock>>>;

/// Maximum number of scan messages that may queue up in the channel.
///
/// Per-entry error notices are the only high-volume traffic; if the
/// consumer falls behind, `try_send` drops notices rather than stalling
/// the walk.
pub const MESSAGE_CHANNEL_CAPACITY: usize = 4_096;

/// Handle to a running or completed scan.
pub struct ScanHandle {
    /// Receiver for error notices and the terminal outcome.
    pub messages: Receiver<ScanMessage>,
    /// Live counters, readable at any time.
    pub progress: Arc<ScanProgress>,
    /// Shared tree that is populated during the scan.
    pub live_tree: LiveTree,
    cancel_flag: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ScanHandle {
    /// Request the scan to stop as soon as possible. The walk exits at its
    /// next loop head; post-processing still runs on the partial tree.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }

    /// Block until the scan thread has exited.
    pub fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for ScanHandle {
    fn drop(&mut self) {
        self.cancel();
        self.join();
    }
}

/// Start a new scan of `root_path` on a background thread.
pub fn start_scan(root_path: PathBuf) -> ScanHandle {
    // Canonicalize so relative roots (".", "..") never leak dot elements
    // into the walked paths, which the worker refuses.
    let root_path = std::fs::canonicalize(&root_path).unwrap_or(root_path);

    let (message_tx, message_rx) =
        crossbeam_channel::bounded::<ScanMessage>(MESSAGE_CHANNEL_CAPACITY);
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let progress = Arc::new(ScanProgress::new());

    // The root node carries the full root path as its name; children carry
    // bare file names.
    let root_record = crate::model::FileRecord::directory(&root_path.to_string_lossy());
    let live_tree: LiveTree = Arc::new(RwLock::new(Tree::with_capacity(
        VizBlock::new(root_record),
        500_000,
    )));

    let cancel_clone = Arc::clone(&cancel_flag);
    let progress_clone = Arc::clone(&progress);
    let tree_clone = Arc::clone(&live_tree);

    let thread = thread::Builder::new()
        .name("diskscape-scanner".into())
        .spawn(move || {
            info!("starting scan of {}", root_path.display());
            let start = Instant::now();

            if !root_path.is_dir() {
                let _ = message_tx.send(ScanMessage::Failed {
                    message: crate::error::Error::NotADirectory(root_path).to_string(),
                });
                return;
            }

            let cancelled = worker::walk(
                &root_path,
                &tree_clone,
                &progress_clone,
                &cancel_clone,
                &message_tx,
            );

            // Post-processing is single-threaded and runs even after a
            // cancelled walk, so a partial tree is still well-formed.
            let metadata = {
                let mut tree = tree_clone.write();
                aggregate_directory_sizes(&mut tree);
                prune_sizeless_nodes(&mut tree);
                sort_descending_by_size(&mut tree);
                compute_metadata(&tree)
            };

            let duration = start.elapsed();
            info!(
                "scan finished in {duration:?}: {} files, {} directories",
                metadata.file_count, metadata.directory_count
            );

            let outcome = if cancelled {
                ScanMessage::Cancelled { metadata }
            } else {
                ScanMessage::Complete { metadata, duration }
            };
            let _ = message_tx.send(outcome);
        })
        .expect("failed to spawn scanner thread");

    ScanHandle {
        messages: message_rx,
        progress,
        live_tree,
        cancel_flag,
        thread: Some(thread),
    }
}

/// Add every node's size to its directory parent, children before parents.
///
/// A post-order walk guarantees every child is processed before its parent,
/// giving O(n) aggregation with no recursion. Directory sizes are reset
/// first so repeated passes don't accumulate.
pub fn aggregate_directory_sizes(tree: &mut Tree<VizBlock>) {
    let ids: Vec<NodeId> = tree.post_order(tree.root()).collect();

    for &id in &ids {
        if tree.data(id).file.kind == FileKind::Directory {
            tree.data_mut(id).file.size_bytes = 0;
        }
    }

    for id in ids {
        let Some(parent) = tree.node(id).parent() else {
            continue;
        };
        let size = tree.data(id).file.size_bytes;
        if tree.data(parent).file.kind == FileKind::Directory {
            tree.data_mut(parent).file.size_bytes += size;
        }
    }
}

/// Detach every node whose aggregated size is zero — zero-byte files and
/// directories left empty after skipped entries.
pub fn prune_sizeless_nodes(tree: &mut Tree<VizBlock>) {
    let doomed: Vec<NodeId> = tree
        .post_order(tree.root())
        .filter(|&id| id != tree.root() && tree.data(id).file.size_bytes == 0)
        .collect();

    let removed = doomed.len();
    for id in doomed {
        tree.detach(id);
    }

    if removed > 0 {
        info!("pruned {removed} sizeless nodes");
    }
}

/// Sort every sibling list descending by size.
pub fn sort_descending_by_size(tree: &mut Tree<VizBlock>) {
    let ids: Vec<NodeId> = tree.post_order(tree.root()).collect();
    for id in ids {
        tree.sort_children_by(id, |a, b| b.file.size_bytes.cmp(&a.file.size_bytes));
    }
}

/// Count files, directories, and total bytes over the attached tree.
pub fn compute_metadata(tree: &Tree<VizBlock>) -> TreemapMetadata {
    let mut metadata = TreemapMetadata::default();
    for id in tree.pre_order(tree.root()) {
        let file = &tree.data(id).file;
        match file.kind {
            FileKind::Regular => metadata.file_count += 1,
            FileKind::Directory => metadata.directory_count += 1,
        }
    }
    metadata.total_bytes = tree.data(tree.root()).file.size_bytes;
    metadata
}

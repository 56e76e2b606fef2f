//! Parallel directory walker built on `jwalk`.
//!
//! The walker's rayon pool (bounded by hardware parallelism, capped at 4)
//! reads directories concurrently; this thread consumes the entry stream
//! and is the sole writer into the shared tree, appending children under
//! the `LiveTree` write lock. A path→node map resolves each entry's parent
//! in O(1).
//!
//! Per-entry failures are logged, reported as notices, and skipped — a scan
//! never aborts on a single bad entry. Symlinks are never followed or
//! recorded, paths containing `.` or `..` elements are refused, zero-byte
//! files are not recorded, and empty directories are not descended into.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use tracing::warn;

use crate::model::{FileRecord, VizBlock};
use crate::scanner::progress::{ScanMessage, ScanProgress};
use crate::scanner::LiveTree;
use crate::tree::NodeId;

/// Upper bound on walker threads, matching the original engine's pool cap.
const MAX_WALKER_THREADS: usize = 4;

/// Walk `root_path` into `live_tree`. Returns `true` if the walk was cut
/// short by cancellation.
pub fn walk(
    root_path: &Path,
    live_tree: &LiveTree,
    progress: &ScanProgress,
    cancel_flag: &Arc<AtomicBool>,
    messages: &Sender<ScanMessage>,
) -> bool {
    let root_id = live_tree.read().root();

    let mut dir_map: HashMap<PathBuf, NodeId> = HashMap::with_capacity(100_000);
    dir_map.insert(root_path.to_path_buf(), root_id);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_cpus::get().min(MAX_WALKER_THREADS))
        .thread_name(|index| format!("diskscape-walker-{index}"))
        .build()
        .expect("failed to build walker thread pool");

    let walker = jwalk::WalkDir::new(root_path)
        .skip_hidden(false)
        .follow_links(false)
        .parallelism(jwalk::Parallelism::RayonExistingPool {
            pool: Arc::new(pool),
            busy_timeout: None,
        });

    for entry_result in walker {
        if cancel_flag.load(Ordering::Relaxed) {
            return true;
        }

        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                report_entry_error(messages, String::new(), &err.to_string());
                continue;
            }
        };

        let path = entry.path();
        if path == root_path {
            continue;
        }

        if contains_rejected_elements(&path) {
            warn!("{}", crate::error::Error::PathRejected(path));
            continue;
        }

        let file_type = entry.file_type();
        if file_type.is_symlink() {
            continue;
        }

        let Some(parent_path) = path.parent() else {
            continue;
        };
        let Some(&parent_id) = dir_map.get(parent_path) else {
            // The parent was skipped (empty, errored, or rejected); skip
            // its stragglers too.
            continue;
        };

        let file_name = entry.file_name().to_string_lossy().into_owned();

        if file_type.is_dir() {
            if !directory_has_entries(&path) {
                continue;
            }

            let record = FileRecord::directory(&file_name);
            let dir_id = {
                let mut tree = live_tree.write();
                tree.append_child(parent_id, VizBlock::new(record))
            };
            dir_map.insert(path, dir_id);
            progress.record_directory();
        } else {
            let Some(size) = file_size(&path, messages) else {
                continue;
            };
            if size == 0 {
                continue;
            }

            let record = FileRecord::regular(&file_name, size);
            {
                let mut tree = live_tree.write();
                tree.append_child(parent_id, VizBlock::new(record));
            }
            progress.record_file(size);
        }
    }

    false
}

/// True when any path element is `.` or `..`; such paths caused the walk
/// to loop indefinitely on some filesystems. `Path::components` normalizes
/// lone dots away, so the raw elements are inspected instead.
fn contains_rejected_elements(path: &Path) -> bool {
    path.as_os_str()
        .to_string_lossy()
        .split(['/', '\\'])
        .any(|element| element == "." || element == "..")
}

/// One-entry probe: does the directory contain anything at all?
fn directory_has_entries(path: &Path) -> bool {
    match std::fs::read_dir(path) {
        Ok(mut entries) => entries.next().is_some(),
        Err(err) => {
            warn!("cannot probe directory {}: {err}", path.display());
            false
        }
    }
}

/// Size of a regular file, falling back to the symlink-transparent native
/// call before giving up on the entry.
fn file_size(path: &Path, messages: &Sender<ScanMessage>) -> Option<u64> {
    match std::fs::metadata(path) {
        Ok(metadata) => Some(metadata.len()),
        Err(first_err) => match std::fs::symlink_metadata(path) {
            Ok(metadata) if metadata.is_file() => Some(metadata.len()),
            _ => {
                report_entry_error(
                    messages,
                    path.to_string_lossy().into_owned(),
                    &first_err.to_string(),
                );
                None
            }
        },
    }
}

fn report_entry_error(messages: &Sender<ScanMessage>, path: String, message: &str) {
    warn!("scan error at {path:?}: {message}");
    let _ = messages.try_send(ScanMessage::Error {
        path,
        message: message.to_owned(),
    });
}

//! Filesystem monitor — watches the scanned root for live change events.
//!
//! Built on `notify`'s recommended watcher in recursive mode: the backend
//! owns the platform primitive (a single `ReadDirectoryChangesW` watch on
//! Windows; per-directory inotify registration on Linux, including
//! directories created after startup) and delivers raw events on its own
//! thread. A forwarder thread owned by the monitor normalises those into
//! [`FileEvent`]s and hands them to the caller's sink, so the caller's
//! thread is never blocked.
//!
//! # Cancellation
//!
//! [`FileSystemMonitor::stop`] drops the watcher, which cancels the
//! platform call and closes the event channel; the forwarder drains and
//! exits, and `stop` joins it. `stop` is idempotent and also runs on drop.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, Sender};
use notify::event::{Event, EventKind, ModifyKind};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::error::Error;

/// Maximum number of raw watcher events buffered before back-pressure.
///
/// Events below this watermark are buffered internally and forwarded in
/// arrival order; a full buffer drops the oldest-pending delivery attempt
/// rather than blocking the watcher's callback.
const EVENT_CHANNEL_CAPACITY: usize = 4_096;

/// What happened to a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileEventKind {
    Created,
    Deleted,
    Touched,
    Renamed,
}

/// A normalised filesystem change notification.
#[derive(Clone, Debug)]
pub struct FileEvent {
    /// Absolute path the event refers to.
    pub path: PathBuf,
    pub kind: FileEventKind,
    /// Size of the file at the time the event was observed; 0 when the
    /// path no longer exists or refers to a directory.
    pub size_bytes: u64,
    /// Monotonically increasing per-monitor sequence number.
    pub id: u64,
}

/// Recursive filesystem watcher with a normalising forwarder thread.
pub struct FileSystemMonitor {
    watcher: Option<RecommendedWatcher>,
    forwarder: Option<JoinHandle<()>>,
    active: Arc<AtomicBool>,
}

impl Default for FileSystemMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystemMonitor {
    pub fn new() -> Self {
        Self {
            watcher: None,
            forwarder: None,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start watching `root` recursively, delivering events to `on_event`.
    ///
    /// `on_event` is invoked from the monitor's forwarder thread. Returns
    /// `Error::WatchFailed` if the OS registration fails; the monitor is
    /// left inactive in that case.
    pub fn start<F>(&mut self, root: &Path, on_event: F) -> Result<(), Error>
    where
        F: Fn(FileEvent) + Send + 'static,
    {
        if self.is_active() {
            return Ok(());
        }

        let (tx, rx) = bounded::<Event>(EVENT_CHANNEL_CAPACITY);

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| match result {
                Ok(event) => forward_raw(&tx, event),
                Err(err) => warn!("watch error: {err}"),
            },
            notify::Config::default(),
        )
        .map_err(Error::WatchFailed)?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(Error::WatchFailed)?;

        let active = Arc::clone(&self.active);
        let forwarder = std::thread::Builder::new()
            .name("diskscape-monitor".to_owned())
            .spawn(move || {
                let mut next_id: u64 = 0;
                // Exits when the watcher (and with it the sender) is dropped.
                while let Ok(event) = rx.recv() {
                    for file_event in normalize(event, &mut next_id) {
                        on_event(file_event);
                    }
                }
                active.store(false, Ordering::Release);
                debug!("monitor forwarder exited");
            })
            .expect("failed to spawn monitor thread");

        self.watcher = Some(watcher);
        self.forwarder = Some(forwarder);
        self.active.store(true, Ordering::Release);

        debug!("monitoring {}", root.display());
        Ok(())
    }

    /// Stop watching and join the forwarder thread. Safe to call repeatedly.
    pub fn stop(&mut self) {
        // Dropping the watcher cancels the platform watch and disconnects
        // the channel, which in turn terminates the forwarder loop.
        self.watcher = None;
        if let Some(handle) = self.forwarder.take() {
            let _ = handle.join();
        }
        self.active.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl Drop for FileSystemMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Hand a raw event to the forwarder, preferring to drop it over blocking
/// the watcher's callback thread.
fn forward_raw(tx: &Sender<Event>, event: Event) {
    if tx.try_send(event).is_err() {
        warn!("monitor buffer full; dropping filesystem event");
    }
}

/// Map a raw `notify` event onto zero or more [`FileEvent`]s, one per path.
fn normalize(event: Event, next_id: &mut u64) -> Vec<FileEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => FileEventKind::Created,
        EventKind::Remove(_) => FileEventKind::Deleted,
        EventKind::Modify(ModifyKind::Name(_)) => FileEventKind::Renamed,
        EventKind::Modify(_) => FileEventKind::Touched,
        // Access notifications and backend-specific noise carry no size or
        // structure changes.
        _ => return Vec::new(),
    };

    event
        .paths
        .into_iter()
        .map(|path| {
            let size_bytes = std::fs::metadata(&path)
                .ok()
                .filter(|meta| meta.is_file())
                .map(|meta| meta.len())
                .unwrap_or(0);
            let id = *next_id;
            *next_id += 1;
            FileEvent {
                path,
                kind,
                size_bytes,
                id,
            }
        })
        .collect()
}

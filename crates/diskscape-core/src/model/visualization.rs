//! The visualization model: the tree, selection state, and the live-update
//! pipeline between the filesystem monitor and the rest of the system.
//!
//! Three queues connect the pieces. The monitor pushes raw events; a
//! pipeline thread drains them and fans each event out to a visual queue
//! (consumed by the renderer's tick for paint hints) and a model queue
//! (consumed by [`VisualizationModel::refresh_treemap`]). The pipeline is
//! the only writer of both downstream queues, so the monitor's arrival
//! order is preserved end to end.
//!
//! `refresh_treemap` mutates tree structure and sizes only; block
//! coordinates stay stale until the caller re-runs `layout::parse` and the
//! bounding-box pass.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{debug, warn};

use crate::config::VisualizationOptions;
use crate::error::Error;
use crate::layout;
use crate::model::{FileRecord, TreemapMetadata, VizBlock};
use crate::monitor::{FileEvent, FileEventKind, FileSystemMonitor};
use crate::pick::{self, Camera, Ray};
use crate::queue::EventQueue;
use crate::search::{self, SearchFlags};
use crate::tree::{NodeId, Tree};

/// Owns the visualization tree and everything that references into it.
pub struct VisualizationModel {
    root_path: PathBuf,
    tree: Option<Tree<VizBlock>>,
    metadata: TreemapMetadata,
    has_been_parsed: bool,

    selected: Option<NodeId>,
    highlighted: Vec<NodeId>,

    monitor: FileSystemMonitor,
    raw_events: Arc<EventQueue<FileEvent>>,
    pending_visual: Arc<EventQueue<FileEvent>>,
    pending_model: Arc<EventQueue<FileEvent>>,
    keep_processing: Arc<AtomicBool>,
    pipeline: Option<JoinHandle<()>>,
}

impl VisualizationModel {
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            root_path,
            tree: None,
            metadata: TreemapMetadata::default(),
            has_been_parsed: false,
            selected: None,
            highlighted: Vec::new(),
            monitor: FileSystemMonitor::new(),
            raw_events: Arc::new(EventQueue::new()),
            pending_visual: Arc::new(EventQueue::new()),
            pending_model: Arc::new(EventQueue::new()),
            keep_processing: Arc::new(AtomicBool::new(false)),
            pipeline: None,
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn metadata(&self) -> TreemapMetadata {
        self.metadata
    }

    pub fn tree(&self) -> Option<&Tree<VizBlock>> {
        self.tree.as_ref()
    }

    pub fn tree_mut(&mut self) -> Option<&mut Tree<VizBlock>> {
        self.tree.as_mut()
    }

    /// Replace the tree wholesale (after a rescan). Selection and highlight
    /// references are invalidated before the old tree is dropped.
    pub fn set_tree(&mut self, tree: Tree<VizBlock>, metadata: TreemapMetadata) {
        self.selected = None;
        self.highlighted.clear();
        self.has_been_parsed = false;
        self.tree = Some(tree);
        self.metadata = metadata;
    }

    /// Run the squarified layout and the bounding-box pass.
    pub fn parse(&mut self) {
        let Some(tree) = self.tree.as_mut() else {
            debug_assert!(false, "no tree to parse");
            return;
        };
        layout::parse(tree);
        layout::bounds::update_bounding_boxes(tree);
        self.has_been_parsed = true;
    }

    pub fn has_been_parsed(&self) -> bool {
        self.has_been_parsed
    }

    // ── Selection and highlights ───────────────────────────────────────

    /// Pick the nearest visible block in front of the camera.
    pub fn select_nearest(
        &self,
        camera: &dyn Camera,
        ray: Ray,
        options: &VisualizationOptions,
    ) -> Option<NodeId> {
        if !self.has_been_parsed {
            return None;
        }
        let tree = self.tree.as_ref()?;
        pick::find_nearest_intersection(tree, camera, ray, options)
    }

    pub fn select_node(&mut self, node: NodeId) {
        self.selected = Some(node);
    }

    pub fn selected_node(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn highlighted_nodes(&self) -> &[NodeId] {
        &self.highlighted
    }

    pub fn clear_highlights(&mut self) {
        self.highlighted.clear();
    }

    /// Highlight every ancestor of `node`, nearest first.
    pub fn highlight_ancestors(&mut self, node: NodeId) {
        let Some(tree) = self.tree.as_ref() else {
            return;
        };
        let mut current = tree.node(node).parent();
        while let Some(id) = current {
            self.highlighted.push(id);
            current = tree.node(id).parent();
        }
    }

    /// Highlight every leaf under `node` that passes the filter.
    pub fn highlight_descendants(&mut self, node: NodeId, options: &VisualizationOptions) {
        let Some(tree) = self.tree.as_ref() else {
            return;
        };
        for leaf in tree.leaves(node) {
            if options.is_visible(&tree.data(leaf).file) {
                self.highlighted.push(leaf);
            }
        }
    }

    /// Highlight every leaf whose extension matches `extension`.
    pub fn highlight_extensions(&mut self, extension: &str, options: &VisualizationOptions) {
        let Some(tree) = self.tree.as_ref() else {
            return;
        };
        for leaf in tree.leaves(tree.root()) {
            let file = &tree.data(leaf).file;
            if file.extension == extension && options.is_visible(file) {
                self.highlighted.push(leaf);
            }
        }
    }

    /// Highlight every node matching the query. The existing highlight set
    /// is untouched; callers clear it between queries.
    pub fn highlight_matching_names(
        &mut self,
        query: &str,
        options: &VisualizationOptions,
        flags: SearchFlags,
    ) -> Result<usize, Error> {
        let Some(tree) = self.tree.as_ref() else {
            return Ok(0);
        };
        let matches = search::matching_nodes(tree, query, options, flags)?;
        let count = matches.len();
        self.highlighted.extend(matches);
        Ok(count)
    }

    // ── Monitoring and the update pipeline ─────────────────────────────

    /// Start watching the root path and processing its events.
    pub fn start_monitoring(&mut self) -> Result<(), Error> {
        let raw_events = Arc::clone(&self.raw_events);
        let root = self.root_path.clone();
        self.monitor.start(&root, move |event| {
            raw_events.push(event);
        })?;
        self.start_event_pipeline();
        Ok(())
    }

    /// Start the pipeline thread that fans raw events out to the visual and
    /// model queues. Available separately from the monitor so event streams
    /// can be injected directly.
    pub fn start_event_pipeline(&mut self) {
        if self.pipeline.is_some() {
            return;
        }

        self.raw_events.reset_wait();
        self.keep_processing.store(true, Ordering::Release);

        let raw_events = Arc::clone(&self.raw_events);
        let pending_visual = Arc::clone(&self.pending_visual);
        let pending_model = Arc::clone(&self.pending_model);
        let keep_processing = Arc::clone(&self.keep_processing);

        let handle = std::thread::Builder::new()
            .name("diskscape-pipeline".to_owned())
            .spawn(move || {
                while keep_processing.load(Ordering::Acquire) {
                    let Some(event) = raw_events.wait_pop() else {
                        // The wait was abandoned; re-check the run flag.
                        continue;
                    };

                    debug!(
                        "file event #{}: {:?} {}",
                        event.id,
                        event.kind,
                        event.path.display()
                    );

                    pending_visual.push(event.clone());
                    pending_model.push(event);
                }
                debug!("pipeline thread exited");
            })
            .expect("failed to spawn pipeline thread");

        self.pipeline = Some(handle);
    }

    /// Stop the monitor and the pipeline thread. Idempotent; joins both.
    pub fn stop_monitoring(&mut self) {
        self.monitor.stop();

        self.keep_processing.store(false, Ordering::Release);
        self.raw_events.abandon_wait();
        if let Some(handle) = self.pipeline.take() {
            let _ = handle.join();
        }
    }

    pub fn is_monitoring_active(&self) -> bool {
        self.monitor.is_active()
    }

    /// Feed an event into the pipeline as the monitor would.
    pub fn enqueue_file_event(&self, event: FileEvent) {
        self.raw_events.push(event);
    }

    /// Next event the renderer should paint a hint for, if any.
    pub fn fetch_next_visual_change(&self) -> Option<FileEvent> {
        self.pending_visual.try_pop()
    }

    /// Number of events waiting on the visual queue.
    pub fn pending_visual_len(&self) -> usize {
        self.pending_visual.len()
    }

    /// Number of events waiting on the model queue.
    pub fn pending_model_len(&self) -> usize {
        self.pending_model.len()
    }

    /// Drain the model queue, applying each event to the tree in arrival
    /// order. Does not recompute layout.
    pub fn refresh_treemap(&mut self) {
        while let Some(event) = self.pending_model.try_pop() {
            self.apply_event(&event);
        }
    }

    fn apply_event(&mut self, event: &FileEvent) {
        match event.kind {
            FileEventKind::Created => self.on_file_created(event),
            FileEventKind::Deleted => self.on_file_deleted(event),
            FileEventKind::Touched => self.on_file_touched(event),
            FileEventKind::Renamed => {
                // Rename association is deliberately unresolved; the event
                // is logged and dropped.
                debug!("dropping rename event for {}", event.path.display());
            }
        }
    }

    fn on_file_created(&mut self, event: &FileEvent) {
        let Some(parent_path) = event.path.parent() else {
            return;
        };
        let Some(parent) = self.find_node_by_path(parent_path) else {
            warn!(
                "created file has no parent in the tree: {}",
                event.path.display()
            );
            return;
        };
        let Some(file_name) = event.path.file_name() else {
            return;
        };

        let record = FileRecord::regular(&file_name.to_string_lossy(), event.size_bytes);
        if let Some(tree) = self.tree.as_mut() {
            tree.append_child(parent, VizBlock::new(record));
        }
    }

    fn on_file_deleted(&mut self, event: &FileEvent) {
        let Some(node) = self.find_node_by_path(&event.path) else {
            debug!("deleted path not in tree: {}", event.path.display());
            return;
        };

        self.invalidate_references_into(node);
        if let Some(tree) = self.tree.as_mut() {
            tree.detach(node);
        }
    }

    fn on_file_touched(&mut self, event: &FileEvent) {
        let Some(node) = self.find_node_by_path(&event.path) else {
            debug!("touched path not in tree: {}", event.path.display());
            return;
        };
        let Some(tree) = self.tree.as_mut() else {
            return;
        };

        let data = tree.data_mut(node);
        if data.file.is_regular() {
            data.file.size_bytes = event.size_bytes;
        } else {
            // Directory modification has no defined meaning here.
            debug!("ignoring directory touch: {}", event.path.display());
        }
    }

    /// Drop selection/highlight references that point into the subtree
    /// rooted at `node`, before that subtree is detached.
    fn invalidate_references_into(&mut self, node: NodeId) {
        let Some(tree) = self.tree.as_ref() else {
            return;
        };
        let doomed: HashSet<NodeId> = tree.pre_order(node).collect();

        if let Some(selected) = self.selected {
            if doomed.contains(&selected) {
                self.selected = None;
            }
        }
        self.highlighted.retain(|id| !doomed.contains(id));
    }

    /// Resolve an absolute path to a node by walking name matches from the
    /// root.
    pub fn find_node_by_path(&self, path: &Path) -> Option<NodeId> {
        let tree = self.tree.as_ref()?;
        let relative = path.strip_prefix(&self.root_path).ok()?;

        let mut current = tree.root();
        for component in relative.components() {
            let wanted = component.as_os_str().to_string_lossy();
            let matched = tree
                .children(current)
                .find(|&child| tree.data(child).file.full_name() == wanted)?;
            current = matched;
        }
        Some(current)
    }
}

impl Drop for VisualizationModel {
    fn drop(&mut self) {
        self.stop_monitoring();
    }
}

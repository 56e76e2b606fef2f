//! The block stream handed to the renderer.
//!
//! After layout, every visible node is assigned a dense `vbo_offset` in
//! pre-order; the renderer indexes its transform and color arrays with it.
//! This module is the single place where geometry drops from `f64` to
//! `f32`.

use crate::config::VisualizationOptions;
use crate::model::{Block, VizBlock};
use crate::monitor::{FileEvent, FileEventKind};
use crate::tree::{NodeId, Tree};

/// Base color for regular-file blocks.
pub const FILE_COLOR: [f32; 3] = [0.33, 0.67, 0.42];
/// Base color for directory blocks.
pub const DIRECTORY_COLOR: [f32; 3] = [0.78, 0.78, 0.82];
/// Paint hint for recently modified files.
pub const MODIFIED_COLOR: [f32; 3] = [0.95, 0.85, 0.23];
/// Paint hint for deleted files.
pub const DELETED_COLOR: [f32; 3] = [0.90, 0.24, 0.20];

/// One renderer instance: a unit cube transform and a base color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockInstance {
    /// Column-major `translate(origin) · scale(width, height, depth)`.
    pub transform: [f32; 16],
    pub color: [f32; 3],
}

/// Assign dense `vbo_offset`s in pre-order over visible nodes.
///
/// Nodes rejected by the filter are skipped along with their subtree, the
/// same pruning rule the pick engine uses; their stale offsets are
/// meaningless. Returns the number of visible nodes.
pub fn assign_offsets(tree: &mut Tree<VizBlock>, options: &VisualizationOptions) -> u32 {
    let visible = visible_pre_order(tree, options);
    for (offset, &id) in visible.iter().enumerate() {
        tree.data_mut(id).vbo_offset = offset as u32;
    }
    visible.len() as u32
}

/// Build the instance array, indexed by the offsets `assign_offsets`
/// produced for the same filter.
pub fn instances(tree: &Tree<VizBlock>, options: &VisualizationOptions) -> Vec<BlockInstance> {
    visible_pre_order(tree, options)
        .into_iter()
        .map(|id| {
            let data = tree.data(id);
            BlockInstance {
                transform: block_transform(&data.block),
                color: if data.file.is_directory() {
                    DIRECTORY_COLOR
                } else {
                    FILE_COLOR
                },
            }
        })
        .collect()
}

/// The color a paint hint for `event` should use, if any.
pub fn paint_hint(event: &FileEvent) -> Option<[f32; 3]> {
    match event.kind {
        FileEventKind::Touched => Some(MODIFIED_COLOR),
        FileEventKind::Deleted => Some(DELETED_COLOR),
        FileEventKind::Created | FileEventKind::Renamed => None,
    }
}

/// Column-major `translate(origin) · scale(w, h, d)` mapping the renderer's
/// unit cube onto `block`. The cube has its origin corner at (0,0,0) and
/// extends one unit along +x, +y, and −z, matching the block's axes.
fn block_transform(block: &Block) -> [f32; 16] {
    let origin = block.origin();
    let (w, h, d) = (
        block.width() as f32,
        block.height() as f32,
        block.depth() as f32,
    );

    [
        w, 0.0, 0.0, 0.0, // column 0
        0.0, h, 0.0, 0.0, // column 1
        0.0, 0.0, d, 0.0, // column 2
        origin.x as f32,
        origin.y as f32,
        origin.z as f32,
        1.0, // column 3
    ]
}

/// Visible nodes in pre-order, pruning rejected subtrees.
fn visible_pre_order(tree: &Tree<VizBlock>, options: &VisualizationOptions) -> Vec<NodeId> {
    let mut visible = Vec::new();
    let mut current = Some(tree.root());

    while let Some(id) = current {
        if !options.is_visible(&tree.data(id).file) {
            current = next_non_descendant(tree, id);
            continue;
        }
        visible.push(id);
        current = match tree.node(id).first_child() {
            Some(child) => Some(child),
            None => next_non_descendant(tree, id),
        };
    }

    visible
}

fn next_non_descendant(tree: &Tree<VizBlock>, mut id: NodeId) -> Option<NodeId> {
    loop {
        if let Some(sibling) = tree.node(id).next_sibling() {
            return Some(sibling);
        }
        id = tree.node(id).parent()?;
    }
}

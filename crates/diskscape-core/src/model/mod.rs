//! Data model for the visualization tree.
//!
//! Re-exports the geometry and file-record types, the per-node payload
//! [`VizBlock`], and the [`VisualizationModel`] that owns the tree,
//! selection state, and the live-update pipeline.

pub mod block;
pub mod file_record;
pub mod size;
pub mod visualization;

pub use block::{Block, Point3};
pub use file_record::{FileKind, FileRecord};
pub use visualization::VisualizationModel;

/// The payload carried by every node of the visualization tree.
#[derive(Clone, Debug)]
pub struct VizBlock {
    /// File metadata from the scanner.
    pub file: FileRecord,
    /// The prism assigned by the layouter. Zeroed until `layout::parse` runs.
    pub block: Block,
    /// Minimal enclosure of `block` and every descendant's `bounds`,
    /// computed by the bounding-box pass.
    pub bounds: Block,
    /// Dense index into the renderer's transform/color arrays. Meaningful
    /// only after offsets have been assigned for the current layout.
    pub vbo_offset: u32,
}

impl VizBlock {
    pub fn new(file: FileRecord) -> Self {
        Self {
            file,
            block: Block::default(),
            bounds: Block::default(),
            vbo_offset: 0,
        }
    }
}

impl From<FileRecord> for VizBlock {
    fn from(file: FileRecord) -> Self {
        Self::new(file)
    }
}

/// Aggregate scan statistics, set once when a scan finishes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreemapMetadata {
    pub file_count: u64,
    pub directory_count: u64,
    pub total_bytes: u64,
}

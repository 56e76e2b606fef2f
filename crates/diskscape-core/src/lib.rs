//! Diskscape Core — the engine beneath a 3D disk-usage visualizer.
//!
//! This crate contains all business logic with zero UI dependencies: it
//! scans a directory tree in parallel, lays every node out as a nested
//! rectangular prism with a squarified treemap, answers ray picks against
//! the result, and keeps the model live through a filesystem monitor and
//! an ordered update pipeline.
//!
//! # Modules
//!
//! - [`tree`] — Arena tree with sibling links and traversal iterators.
//! - [`model`] — Geometry, file records, and the [`model::VisualizationModel`].
//! - [`scanner`] — Parallel filesystem scanning with progress counters.
//! - [`layout`] — Squarified treemap layout and the bounding-box pass.
//! - [`pick`] — Ray-vs-block tests and hierarchical pick descent.
//! - [`search`] — Substring and regex name search.
//! - [`monitor`] — Recursive filesystem watcher with normalised events.
//! - [`queue`] — The blocking event queue between monitor and consumers.
//! - [`scene`] — The transform/color block stream handed to a renderer.
//! - [`config`] — Configuration and the visibility filter.

pub mod config;
pub mod error;
pub mod layout;
pub mod model;
pub mod monitor;
pub mod pick;
pub mod queue;
pub mod scanner;
pub mod scene;
pub mod search;
pub mod tree;

pub use config::{Config, SizePrefix, VisualizationOptions};
pub use error::Error;
pub use model::{Block, FileKind, FileRecord, Point3, TreemapMetadata, VisualizationModel, VizBlock};
pub use monitor::{FileEvent, FileEventKind, FileSystemMonitor};
pub use tree::{NodeId, Tree};

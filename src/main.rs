//! Diskscape — 3D disk-usage visualization engine.
//!
//! Thin binary entry point: scan a directory, lay it out, and print a
//! summary. All logic lives in the `diskscape-core` crate; a renderer
//! front-end consumes the same APIs this binary exercises.

use std::path::PathBuf;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use diskscape_core::model::size::{format_count, format_size};
use diskscape_core::scanner::progress::ScanMessage;
use diskscape_core::scanner::start_scan;
use diskscape_core::{layout, scene, Config};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut config = Config::default();
    if let Some(root) = std::env::args().nth(1) {
        config.root_directory = PathBuf::from(root);
    }

    tracing::info!("scanning {}", config.root_directory.display());
    let mut handle = start_scan(config.root_directory.clone());

    // Poll the live counters while waiting for the terminal message.
    let metadata = loop {
        match handle.messages.recv_timeout(Duration::from_millis(500)) {
            Ok(ScanMessage::Complete { metadata, duration }) => {
                tracing::info!("scan completed in {duration:?}");
                break metadata;
            }
            Ok(ScanMessage::Cancelled { metadata }) => {
                tracing::warn!("scan cancelled; continuing with partial results");
                break metadata;
            }
            Ok(ScanMessage::Failed { message }) => {
                anyhow::bail!("scan failed: {message}");
            }
            Ok(ScanMessage::Error { path, message }) => {
                tracing::warn!("skipped {path}: {message}");
            }
            Err(RecvTimeoutError::Timeout) => {
                // Progress tick while the scan keeps running.
                tracing::info!(
                    "scanned {} files, {} directories, {}",
                    format_count(handle.progress.files_scanned()),
                    format_count(handle.progress.directories_scanned()),
                    format_size(handle.progress.bytes_processed(), config.size_prefix),
                );
            }
            Err(RecvTimeoutError::Disconnected) => {
                anyhow::bail!("scanner exited without reporting an outcome");
            }
        }
    };
    handle.join();

    // Lay the tree out and build the renderer stream once, as a front-end
    // would each time it calls for a reparse.
    let options = config.options();
    let instance_count = {
        let mut tree = handle.live_tree.write();
        layout::parse(&mut tree);
        layout::bounds::update_bounding_boxes(&mut tree);
        scene::assign_offsets(&mut tree, &options)
    };

    println!(
        "{} files in {} directories, {} total — {} blocks visible",
        format_count(metadata.file_count),
        format_count(metadata.directory_count),
        format_size(metadata.total_bytes, config.size_prefix),
        format_count(u64::from(instance_count)),
    );

    Ok(())
}

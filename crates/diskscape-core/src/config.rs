//! Runtime configuration and the visibility filter.
//!
//! Everything here is passed around by explicit reference — there is no
//! process-wide mutable state and no initialization-order requirement.
//! Preferences arrive as an opaque JSON key/value map read once at startup;
//! unknown keys are ignored and missing keys fall back to defaults.

use std::io::Read;
use std::path::PathBuf;

use serde_json::Value;

use crate::error::Error;
use crate::model::FileRecord;

/// Unit system used when formatting sizes for display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizePrefix {
    /// 1 KiB = 1024 B.
    #[default]
    Binary,
    /// 1 kB = 1000 B.
    Decimal,
}

/// Controls which nodes participate in layout offsets, picking, search,
/// and highlighting.
#[derive(Clone, Copy, Debug, Default)]
pub struct VisualizationOptions {
    /// Files strictly smaller than this are omitted.
    pub minimum_file_size: u64,
    /// When true, regular files are omitted entirely.
    pub only_show_directories: bool,
}

impl VisualizationOptions {
    /// Whether a node passes the filter.
    #[inline]
    pub fn is_visible(&self, file: &FileRecord) -> bool {
        if file.size_bytes < self.minimum_file_size {
            return false;
        }
        if self.only_show_directories && !file.is_directory() {
            return false;
        }
        true
    }
}

/// Configuration recognized at construction.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path at which scanning begins.
    pub root_directory: PathBuf,
    /// Files strictly smaller than this are omitted from layout, pick,
    /// highlight, and search.
    pub minimum_file_size: u64,
    /// When true, regular files are omitted from layout, pick, highlight,
    /// and search.
    pub only_directories: bool,
    /// When true, the filesystem monitor is started after a successful scan.
    pub monitor_filesystem: bool,
    /// Unit system for status display.
    pub size_prefix: SizePrefix,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_directory: PathBuf::from("."),
            minimum_file_size: 0,
            only_directories: false,
            monitor_filesystem: false,
            size_prefix: SizePrefix::Binary,
        }
    }
}

impl Config {
    /// Build a configuration from an opaque preferences map.
    pub fn from_preferences(preferences: &serde_json::Map<String, Value>) -> Self {
        let mut config = Self::default();

        if let Some(root) = preferences.get("root_directory").and_then(Value::as_str) {
            config.root_directory = PathBuf::from(root);
        }
        if let Some(size) = preferences.get("minimum_file_size").and_then(Value::as_u64) {
            config.minimum_file_size = size;
        }
        if let Some(flag) = preferences.get("only_directories").and_then(Value::as_bool) {
            config.only_directories = flag;
        }
        if let Some(flag) = preferences
            .get("monitor_filesystem")
            .and_then(Value::as_bool)
        {
            config.monitor_filesystem = flag;
        }
        if let Some(prefix) = preferences.get("size_prefix").and_then(Value::as_str) {
            config.size_prefix = match prefix {
                "decimal" => SizePrefix::Decimal,
                _ => SizePrefix::Binary,
            };
        }

        config
    }

    /// Read a preferences map from a JSON document. A document that is not
    /// a JSON object yields an empty map.
    pub fn read_preferences<R: Read>(reader: R) -> Result<serde_json::Map<String, Value>, Error> {
        let value: Value = serde_json::from_reader(reader).map_err(|err| Error::Io {
            path: PathBuf::from("<preferences>"),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, err),
        })?;

        match value {
            Value::Object(map) => Ok(map),
            _ => Ok(serde_json::Map::new()),
        }
    }

    /// The visibility filter induced by this configuration.
    pub fn options(&self) -> VisualizationOptions {
        VisualizationOptions {
            minimum_file_size: self.minimum_file_size,
            only_show_directories: self.only_directories,
        }
    }
}

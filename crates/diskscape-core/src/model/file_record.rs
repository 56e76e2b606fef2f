//! File metadata carried by every tree node.

use compact_str::CompactString;

/// What a node represents on disk. Symlinks and reparse points never make it
/// into the tree — they are excluded at scan time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Directory,
}

/// Name, extension, and size of a single file or directory.
///
/// `name` holds the stem only; `extension` keeps its leading dot (or is
/// empty), so `name + extension` reproduces the on-disk file name. For
/// directories the size is the sum of all descendant file sizes, computed
/// once by the scanner's aggregation pass.
#[derive(Clone, Debug)]
pub struct FileRecord {
    pub name: CompactString,
    pub extension: CompactString,
    pub size_bytes: u64,
    pub kind: FileKind,
}

impl FileRecord {
    /// Build a record for a regular file, splitting the extension off the
    /// file name.
    pub fn regular(file_name: &str, size_bytes: u64) -> Self {
        let (name, extension) = split_extension(file_name);
        Self {
            name: CompactString::new(name),
            extension: CompactString::new(extension),
            size_bytes,
            kind: FileKind::Regular,
        }
    }

    /// Build a record for a directory. Directory sizes are undefined until
    /// aggregation runs.
    pub fn directory(name: &str) -> Self {
        Self {
            name: CompactString::new(name),
            extension: CompactString::new(""),
            size_bytes: 0,
            kind: FileKind::Directory,
        }
    }

    #[inline]
    pub fn is_directory(&self) -> bool {
        self.kind == FileKind::Directory
    }

    #[inline]
    pub fn is_regular(&self) -> bool {
        self.kind == FileKind::Regular
    }

    /// The on-disk name: stem plus extension.
    pub fn full_name(&self) -> String {
        let mut name = String::with_capacity(self.name.len() + self.extension.len());
        name.push_str(&self.name);
        name.push_str(&self.extension);
        name
    }
}

/// Split `"archive.tar.gz"` into `("archive.tar", ".gz")`. Dotfiles like
/// `".bashrc"` are treated as extensionless names, matching
/// `Path::extension`.
fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(pos) if pos > 0 && pos + 1 < file_name.len() => file_name.split_at(pos),
        _ => (file_name, ""),
    }
}

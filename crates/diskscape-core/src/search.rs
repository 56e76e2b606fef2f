//! Name search over the visualization tree.
//!
//! Matches against `name + extension`. The plain path lowercases both the
//! query and each candidate up front instead of using a case-insensitive
//! comparator, since doing so is significantly faster over large trees.
//! The regex path compiles the query once and surfaces compile errors to
//! the caller; every other failure mode simply yields no match.

use regex::Regex;

use crate::config::VisualizationOptions;
use crate::error::Error;
use crate::model::VizBlock;
use crate::tree::{NodeId, Tree};

/// What a search should look at and how.
#[derive(Clone, Copy, Debug)]
pub struct SearchFlags {
    /// Treat the query as a regular expression instead of a substring.
    pub use_regex: bool,
    /// Consider regular files.
    pub search_files: bool,
    /// Consider directories.
    pub search_dirs: bool,
}

impl Default for SearchFlags {
    fn default() -> Self {
        Self {
            use_regex: false,
            search_files: true,
            search_dirs: true,
        }
    }
}

/// Collect every node matching `query` under the filter and flags.
///
/// The result is freshly computed on every call; repeated searches never
/// accumulate state.
pub fn matching_nodes(
    tree: &Tree<VizBlock>,
    query: &str,
    options: &VisualizationOptions,
    flags: SearchFlags,
) -> Result<Vec<NodeId>, Error> {
    if flags.use_regex {
        let pattern = Regex::new(query)?;
        Ok(scan(tree, options, flags, |name| pattern.is_match(name)))
    } else {
        let lowercase_query = query.to_lowercase();
        Ok(scan(tree, options, flags, |name| {
            name.to_lowercase().contains(&lowercase_query)
        }))
    }
}

fn scan<F>(
    tree: &Tree<VizBlock>,
    options: &VisualizationOptions,
    flags: SearchFlags,
    mut matches: F,
) -> Vec<NodeId>
where
    F: FnMut(&str) -> bool,
{
    let mut results = Vec::new();

    for id in tree.post_order(tree.root()) {
        let file = &tree.data(id).file;

        if file.size_bytes < options.minimum_file_size {
            continue;
        }
        if file.is_directory() && !flags.search_dirs {
            continue;
        }
        if file.is_regular() && !flags.search_files {
            continue;
        }

        if matches(&file.full_name()) {
            results.push(id);
        }
    }

    results
}

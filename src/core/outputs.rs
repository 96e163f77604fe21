//! Output registry - step outputs accumulated over a run

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Mapping from node id to the file path that node produced.
///
/// Append-only for the duration of a run: the runner inserts exactly one
/// entry per executed node, and nodes read it during validation and
/// variable expansion. Backed by a `BTreeMap` so iteration order (and with
/// it variable-expansion order) is deterministic.
#[derive(Debug, Clone, Default)]
pub struct OutputRegistry {
    outputs: BTreeMap<String, PathBuf>,
}

impl OutputRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the output path of a node
    pub fn insert(&mut self, node_id: &str, path: PathBuf) {
        self.outputs.insert(node_id.to_string(), path);
    }

    /// Get the output path of a node
    pub fn get(&self, node_id: &str) -> Option<&PathBuf> {
        self.outputs.get(node_id)
    }

    /// Whether the given node id has a recorded output
    pub fn contains(&self, node_id: &str) -> bool {
        self.outputs.contains_key(node_id)
    }

    /// Whether no node has produced output yet
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Number of recorded outputs
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Iterate over (id, path) pairs in lexicographic id order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PathBuf)> {
        self.outputs.iter()
    }
}

impl<S: Into<String>, P: AsRef<Path>> FromIterator<(S, P)> for OutputRegistry {
    fn from_iter<I: IntoIterator<Item = (S, P)>>(iter: I) -> Self {
        Self {
            outputs: iter
                .into_iter()
                .map(|(id, path)| (id.into(), path.as_ref().to_path_buf()))
                .collect(),
        }
    }
}

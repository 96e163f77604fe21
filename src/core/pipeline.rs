//! Pipeline domain model and loader

use crate::core::node::Node;
use crate::error::PipelineError;
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// An ordered pipeline: declaration order is execution order.
///
/// Nodes are immutable after loading; the only mutable state of a run is
/// the output registry owned by the runner.
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Nodes in declaration order
    pub nodes: Vec<Node>,

    /// Shared scratch directory for intermediate step outputs
    pub workspace: PathBuf,
}

impl Pipeline {
    /// Load a pipeline from a YAML specification file.
    ///
    /// The workspace directory (and any missing parents) is created here,
    /// before any validation runs.
    pub fn from_file<P: AsRef<Path>>(path: P, workspace: &Path) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| PipelineError::SpecRead {
            path: path.to_path_buf(),
            source,
        })?;

        let pipeline = Self::from_yaml(&content, workspace)?;
        info!(
            "loaded pipeline from {} ({} nodes)",
            path.display(),
            pipeline.nodes.len()
        );
        Ok(pipeline)
    }

    /// Parse a pipeline from a YAML string.
    ///
    /// Two-phase fail-fast gate: structural errors (top level not a
    /// sequence, empty document, element not a mapping, factory rejection)
    /// take precedence over the duplicate-id scan that follows.
    pub fn from_yaml(yaml: &str, workspace: &Path) -> Result<Self, PipelineError> {
        let document: Value = serde_yaml::from_str(yaml)?;

        let steps = document
            .as_sequence()
            .ok_or(PipelineError::NotASequence)?;
        if steps.is_empty() {
            return Err(PipelineError::EmptyPipeline);
        }

        let mut nodes = Vec::with_capacity(steps.len());
        for (i, step) in steps.iter().enumerate() {
            let position = i + 1;
            let mapping = step
                .as_mapping()
                .ok_or(PipelineError::StepNotAMapping { position })?;

            let node = Node::from_mapping(mapping, workspace)
                .map_err(|source| PipelineError::NodeConstruction { position, source })?;
            debug!("constructed node {} ({})", node.id(), node.kind());
            nodes.push(node);
        }

        Self::check_duplicate_ids(&nodes)?;

        let pipeline = Pipeline {
            nodes,
            workspace: workspace.to_path_buf(),
        };
        pipeline.prepare_workspace()?;
        Ok(pipeline)
    }

    /// Report every id declared more than once, in first-occurrence order.
    fn check_duplicate_ids(nodes: &[Node]) -> Result<(), PipelineError> {
        let ids: Vec<&str> = nodes.iter().map(|n| n.id()).collect();
        let mut duplicates: Vec<&str> = Vec::new();
        for id in &ids {
            if ids.iter().filter(|other| *other == id).count() > 1
                && !duplicates.contains(id)
            {
                duplicates.push(id);
            }
        }

        if duplicates.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::DuplicateIds(duplicates.join(", ")))
        }
    }

    fn prepare_workspace(&self) -> Result<(), PipelineError> {
        std::fs::create_dir_all(&self.workspace).map_err(|source| PipelineError::Workspace {
            dir: self.workspace.clone(),
            source,
        })
    }

    /// Number of nodes in the pipeline
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

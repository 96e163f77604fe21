//! Error types for pipeline loading, validation and execution

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while validating a node, either at load time or
/// immediately before its execution.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A step mapping is missing one of the identity fields (`node`, `id`)
    #[error("step missing '{0}' field")]
    MissingIdentity(&'static str),

    /// The declared node kind matches no known variant
    #[error("unknown node type: {0}")]
    UnknownKind(String),

    /// A kind-specific required field is absent
    #[error("{kind} node '{node_id}' missing '{field}' field")]
    MissingField {
        kind: &'static str,
        node_id: String,
        field: &'static str,
    },

    /// A referenced file does not exist
    #[error("node '{node_id}': file '{path}' does not exist")]
    FileNotFound { node_id: String, path: PathBuf },

    /// A referenced path exists but is not a regular file
    #[error("node '{node_id}': path '{path}' is not a file")]
    NotAFile { node_id: String, path: PathBuf },

    /// A WriteFile step names an upstream id with no recorded output
    #[error("node '{node_id}': input node '{input}' not found or not yet executed")]
    UpstreamMissing { node_id: String, input: String },

    /// The parent directory of a WriteFile destination cannot be created
    #[error("node '{node_id}': cannot create output directory '{dir}': {source}")]
    OutputDirCreate {
        node_id: String,
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while a node performs its side effect.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// A file copy failed
    #[error("node '{node_id}': copy to '{dest}' failed: {source}")]
    Copy {
        node_id: String,
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The invoked command exited with a non-zero status
    #[error("node '{node_id}': command exited with code {code}: {stderr}")]
    NonZeroExit {
        node_id: String,
        code: i32,
        stderr: String,
    },

    /// Any other I/O failure during execution (spawn, output write, ...)
    #[error("node '{node_id}': {source}")]
    Io {
        node_id: String,
        #[source]
        source: std::io::Error,
    },
}

/// Document-level and run-level errors. Step-scoped failures wrap the
/// underlying cause together with the 1-based step position and node id.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The specification file could not be read
    #[error("failed to load pipeline file '{path}': {source}")]
    SpecRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The specification file is not valid YAML
    #[error("failed to parse pipeline file: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The document's top level is not a sequence
    #[error("pipeline file must contain a list of nodes")]
    NotASequence,

    /// The document's top-level sequence is empty
    #[error("pipeline file is empty")]
    EmptyPipeline,

    /// A sequence element is not a mapping
    #[error("node {position} must be a mapping")]
    StepNotAMapping { position: usize },

    /// The factory rejected a step mapping
    #[error("failed to create node {position}: {source}")]
    NodeConstruction {
        position: usize,
        #[source]
        source: ValidationError,
    },

    /// Two or more steps declare the same id
    #[error("duplicate node IDs found: {0}")]
    DuplicateIds(String),

    /// The workspace directory could not be created
    #[error("failed to create workspace directory '{dir}': {source}")]
    Workspace {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Validation failed for a step, at either validation pass
    #[error("validation failed for node {position} ({node_id}): {source}")]
    StepValidation {
        position: usize,
        node_id: String,
        #[source]
        source: ValidationError,
    },

    /// Execution failed for a step
    #[error("execution failed for node {position} ({node_id}): {source}")]
    StepExecution {
        position: usize,
        node_id: String,
        #[source]
        source: ExecutionError,
    },
}

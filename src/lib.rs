//! powermake - makefile-style linear pipeline runner

pub mod cli;
pub mod core;
pub mod error;
pub mod execution;

// Re-export commonly used types
pub use crate::core::{Node, NodeKind, OutputRegistry, Pipeline, RunState, RunStatus};
pub use crate::error::{ExecutionError, PipelineError, ValidationError};
pub use crate::execution::{CommandRunner, PipelineRunner, RunEvent, RunReport, SystemShell};

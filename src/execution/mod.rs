//! Pipeline execution

pub mod runner;
pub mod shell;

pub use runner::{PipelineRunner, RunEvent, RunReport};
pub use shell::{CommandOutput, CommandRunner, SystemShell};

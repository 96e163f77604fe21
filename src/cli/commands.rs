//! CLI command definitions

use clap::Args;
use std::path::PathBuf;

/// Run a pipeline
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// YAML pipeline specification file
    pub file: PathBuf,

    /// Directory for intermediate step outputs
    /// (default: .tmp/ beside the specification file)
    #[arg(short, long)]
    pub tmp_dir: Option<PathBuf>,
}

impl RunCommand {
    /// Effective workspace directory for this run
    pub fn workspace(&self) -> PathBuf {
        match &self.tmp_dir {
            Some(dir) => dir.clone(),
            None => self
                .file
                .parent()
                .unwrap_or_else(|| std::path::Path::new("."))
                .join(".tmp"),
        }
    }
}

/// Validate a pipeline specification
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// YAML pipeline specification file
    pub file: PathBuf,

    /// Directory for intermediate step outputs
    /// (default: .tmp/ beside the specification file)
    #[arg(short, long)]
    pub tmp_dir: Option<PathBuf>,

    /// Output the parsed step list as JSON
    #[arg(long)]
    pub json: bool,
}

impl ValidateCommand {
    pub fn workspace(&self) -> PathBuf {
        match &self.tmp_dir {
            Some(dir) => dir.clone(),
            None => self
                .file
                .parent()
                .unwrap_or_else(|| std::path::Path::new("."))
                .join(".tmp"),
        }
    }
}

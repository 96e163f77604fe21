//! Run state - status and progress of a single pipeline run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall status of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run has not started
    Pending,
    /// Run is in progress
    Running,
    /// All nodes executed successfully
    Completed,
    /// Validation or execution failed; remaining nodes were not run
    Failed,
}

/// Mutable state of one pipeline run.
///
/// Lifetime is a single run; nothing here survives the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// Unique run ID
    pub execution_id: Uuid,

    /// Current status
    pub status: RunStatus,

    /// When the run started
    pub started_at: Option<DateTime<Utc>>,

    /// When the run completed or failed
    pub completed_at: Option<DateTime<Utc>>,

    /// Total number of nodes in the pipeline
    pub total_steps: usize,

    /// Number of nodes that have executed successfully
    pub completed_steps: usize,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            status: RunStatus::Pending,
            started_at: None,
            completed_at: None,
            total_steps: 0,
            completed_steps: 0,
        }
    }

    /// Mark the run as started
    pub fn start(&mut self, total_steps: usize) {
        self.status = RunStatus::Running;
        self.started_at = Some(Utc::now());
        self.total_steps = total_steps;
    }

    /// Record one successfully executed node
    pub fn record_step(&mut self) {
        self.completed_steps += 1;
    }

    /// Mark the run as completed
    pub fn complete(&mut self) {
        self.status = RunStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Mark the run as failed
    pub fn fail(&mut self) {
        self.status = RunStatus::Failed;
        self.completed_at = Some(Utc::now());
    }

    /// Progress fraction (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.total_steps == 0 {
            return 0.0;
        }
        self.completed_steps as f64 / self.total_steps as f64
    }

    /// Wall-clock seconds since the run started
    pub fn elapsed_secs(&self) -> f64 {
        match self.started_at {
            Some(started) => {
                let end = self.completed_at.unwrap_or_else(Utc::now);
                end.signed_duration_since(started)
                    .to_std()
                    .map(|d| d.as_secs_f64())
                    .unwrap_or(0.0)
            }
            None => 0.0,
        }
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

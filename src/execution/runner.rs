//! Pipeline runner - drives validate-then-execute over the node sequence

use crate::core::node::NodeKind;
use crate::core::outputs::OutputRegistry;
use crate::core::pipeline::Pipeline;
use crate::core::state::RunState;
use crate::error::PipelineError;
use crate::execution::shell::{CommandRunner, SystemShell};
use std::path::PathBuf;
use tracing::{error, info};
use uuid::Uuid;

/// Events emitted while a pipeline runs, for progress display.
#[derive(Debug, Clone)]
pub enum RunEvent {
    PipelineStarted {
        execution_id: Uuid,
        total_steps: usize,
    },
    ValidationPassed,
    StepStarted {
        position: usize,
        total_steps: usize,
        node_id: String,
        kind: NodeKind,
        elapsed_secs: f64,
    },
    StepCompleted {
        position: usize,
        node_id: String,
        output: PathBuf,
    },
    PipelineCompleted {
        execution_id: Uuid,
        elapsed_secs: f64,
    },
}

pub type EventHandler = Box<dyn Fn(&RunEvent) + Send + Sync>;

/// Everything a successful run leaves behind.
#[derive(Debug)]
pub struct RunReport {
    /// Final run state (status, timestamps, counters)
    pub state: RunState,
    /// One output path per declared node, keyed by node id
    pub outputs: OutputRegistry,
}

/// Executes a pipeline strictly in declaration order.
///
/// Two validation passes: one over the whole pipeline before anything
/// executes (static errors, empty registry), then one per node against the
/// live registry immediately before its execute. The second pass is the one
/// that enforces "upstream already ran".
pub struct PipelineRunner<S: CommandRunner = SystemShell> {
    shell: S,
    handlers: Vec<EventHandler>,
}

impl PipelineRunner<SystemShell> {
    pub fn new() -> Self {
        Self::with_shell(SystemShell::new())
    }
}

impl Default for PipelineRunner<SystemShell> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: CommandRunner> PipelineRunner<S> {
    /// Create a runner over a specific command runner (tests use a mock)
    pub fn with_shell(shell: S) -> Self {
        Self {
            shell,
            handlers: Vec::new(),
        }
    }

    /// Register a handler invoked on every run event
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(&RunEvent) + Send + Sync + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    fn emit(&self, event: RunEvent) {
        for handler in &self.handlers {
            handler(&event);
        }
    }

    /// Validate every node against the outputs recorded so far.
    ///
    /// With an empty registry this is the load-time pass: it catches
    /// structural and static errors, while upstream-ordering errors are
    /// deferred to the per-step revalidation.
    pub fn validate(
        &self,
        pipeline: &Pipeline,
        outputs: &OutputRegistry,
    ) -> Result<(), PipelineError> {
        for (i, node) in pipeline.nodes.iter().enumerate() {
            node.validate(outputs)
                .map_err(|source| PipelineError::StepValidation {
                    position: i + 1,
                    node_id: node.id().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Run the whole pipeline.
    ///
    /// Aborts at the first validation or execution failure; nodes already
    /// executed keep their workspace files (no rollback).
    pub async fn run(&self, pipeline: &Pipeline) -> Result<RunReport, PipelineError> {
        let mut state = RunState::new();
        let mut outputs = OutputRegistry::new();

        state.start(pipeline.len());
        info!(
            "starting pipeline run {} ({} nodes)",
            state.execution_id,
            pipeline.len()
        );
        self.emit(RunEvent::PipelineStarted {
            execution_id: state.execution_id,
            total_steps: pipeline.len(),
        });

        if let Err(e) = self.validate(pipeline, &outputs) {
            state.fail();
            error!("pipeline validation failed: {}", e);
            return Err(e);
        }
        self.emit(RunEvent::ValidationPassed);

        for (i, node) in pipeline.nodes.iter().enumerate() {
            let position = i + 1;
            self.emit(RunEvent::StepStarted {
                position,
                total_steps: pipeline.len(),
                node_id: node.id().to_string(),
                kind: node.kind(),
                elapsed_secs: state.elapsed_secs(),
            });

            // Revalidate against the live registry before the side effect.
            if let Err(source) = node.validate(&outputs) {
                state.fail();
                let e = PipelineError::StepValidation {
                    position,
                    node_id: node.id().to_string(),
                    source,
                };
                error!("{}", e);
                return Err(e);
            }

            let output = match node.execute(&outputs, &self.shell).await {
                Ok(path) => path,
                Err(source) => {
                    state.fail();
                    let e = PipelineError::StepExecution {
                        position,
                        node_id: node.id().to_string(),
                        source,
                    };
                    error!("{}", e);
                    return Err(e);
                }
            };

            info!("node {} produced {}", node.id(), output.display());
            outputs.insert(node.id(), output.clone());
            state.record_step();
            self.emit(RunEvent::StepCompleted {
                position,
                node_id: node.id().to_string(),
                output,
            });
        }

        state.complete();
        self.emit(RunEvent::PipelineCompleted {
            execution_id: state.execution_id,
            elapsed_secs: state.elapsed_secs(),
        });
        info!(
            "pipeline run {} completed in {:.2}s",
            state.execution_id,
            state.elapsed_secs()
        );

        Ok(RunReport { state, outputs })
    }
}

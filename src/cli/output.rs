//! CLI output formatting

use crate::core::pipeline::Pipeline;
use crate::execution::runner::RunEvent;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a progress bar over the node count
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format a run event for display
pub fn format_run_event(event: &RunEvent) -> String {
    match event {
        RunEvent::PipelineStarted {
            execution_id,
            total_steps,
        } => format!(
            "{} Starting pipeline run {} ({} nodes)",
            ROCKET,
            style(&execution_id.to_string()[..8]).dim(),
            style(total_steps).cyan()
        ),
        RunEvent::ValidationPassed => {
            format!("{} Pipeline validation successful", CHECK)
        }
        RunEvent::StepStarted {
            position,
            total_steps,
            node_id,
            kind,
            elapsed_secs,
        } => format!(
            "{} Step {}/{} - {} ({}) - Elapsed: {:.1}s",
            SPINNER,
            style(position).cyan(),
            total_steps,
            style(node_id).bold(),
            kind,
            elapsed_secs
        ),
        RunEvent::StepCompleted {
            node_id, output, ..
        } => format!(
            "{} {} -> {}",
            CHECK,
            style(node_id).green(),
            style(output.display()).dim()
        ),
        RunEvent::PipelineCompleted { elapsed_secs, .. } => format!(
            "{} Pipeline completed {} in {:.2}s",
            CHECK,
            style("successfully").green(),
            elapsed_secs
        ),
    }
}

/// Render the pipeline summary table shown in verbose mode
pub fn format_summary_table(pipeline: &Pipeline) -> String {
    let mut lines = Vec::with_capacity(pipeline.len() + 2);
    lines.push(format!(
        "{:>4}  {:<16} {:<10} {}",
        style("Step").bold(),
        style("Node ID").bold(),
        style("Type").bold(),
        style("Description").bold()
    ));

    for (i, node) in pipeline.nodes.iter().enumerate() {
        lines.push(format!(
            "{:>4}  {:<16} {:<10} {}",
            i + 1,
            style(node.id()).magenta(),
            style(node.kind()).green(),
            node.describe()
        ));
    }

    lines.join("\n")
}

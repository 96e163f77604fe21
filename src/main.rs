use anyhow::{Context, Result};
use powermake::cli::commands::{RunCommand, ValidateCommand};
use powermake::cli::output::{self, style, CHECK, CROSS, INFO};
use powermake::cli::{Cli, Command};
use powermake::core::{OutputRegistry, Pipeline};
use powermake::execution::{PipelineRunner, RunEvent};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    match &cli.command {
        Command::Run(cmd) => run_pipeline(cmd, cli.verbose).await,
        Command::Validate(cmd) => validate_pipeline(cmd),
    }
}

async fn run_pipeline(cmd: &RunCommand, verbose: bool) -> Result<()> {
    if !cmd.file.exists() {
        eprintln!("Error: pipeline file '{}' not found", cmd.file.display());
        std::process::exit(1);
    }

    let workspace = cmd.workspace();
    let pipeline = match Pipeline::from_file(&cmd.file, &workspace) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("{} {}", CROSS, style(&e).red());
            std::process::exit(1);
        }
    };

    println!(
        "{} Loaded pipeline: {} ({} nodes)",
        INFO,
        style(cmd.file.display()).bold(),
        style(pipeline.len()).cyan()
    );
    println!("{} Workspace: {}", INFO, style(workspace.display()).dim());

    if verbose {
        println!("\n{}\n", output::format_summary_table(&pipeline));
    }

    let mut runner = PipelineRunner::new();
    let progress = output::create_progress_bar(pipeline.len());
    let bar = progress.clone();
    runner.add_event_handler(move |event| {
        bar.println(output::format_run_event(event));
        if matches!(event, RunEvent::StepCompleted { .. }) {
            bar.inc(1);
        }
    });

    let result = runner.run(&pipeline).await;
    progress.finish_and_clear();

    match result {
        Ok(report) => {
            if verbose {
                println!("\n{}", style("Final outputs:").bold());
                for (node_id, path) in report.outputs.iter() {
                    println!("  {}: {}", style(node_id).cyan(), path.display());
                }
            }
            println!(
                "\n{} Pipeline completed {} in {:.2}s",
                CHECK,
                style("successfully").green(),
                report.state.elapsed_secs()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("\n{} {}", CROSS, style(&e).red());
            std::process::exit(1);
        }
    }
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating pipeline...", INFO);

    if !cmd.file.exists() {
        eprintln!("Error: pipeline file '{}' not found", cmd.file.display());
        std::process::exit(1);
    }

    match Pipeline::from_file(&cmd.file, &cmd.workspace()) {
        Ok(pipeline) => {
            let runner = PipelineRunner::new();
            if let Err(e) = runner.validate(&pipeline, &OutputRegistry::new()) {
                println!("{} Validation failed:", CROSS);
                println!("  {}", style(&e).red());
                std::process::exit(1);
            }

            println!("{} Pipeline specification is valid!", CHECK);
            println!("  Nodes: {}", style(pipeline.len()).cyan());

            if cmd.json {
                let steps: Vec<_> = pipeline
                    .nodes
                    .iter()
                    .enumerate()
                    .map(|(i, node)| {
                        serde_json::json!({
                            "position": i + 1,
                            "id": node.id(),
                            "type": node.kind().as_str(),
                            "description": node.describe(),
                        })
                    })
                    .collect();
                println!("\n{}", serde_json::to_string_pretty(&steps)?);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(&e).red());
            std::process::exit(1);
        }
    }
}

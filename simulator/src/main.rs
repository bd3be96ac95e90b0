use anyhow::Context;
use clap::Parser;
use generator::profile::build_observations;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use workflow::config::{Mode, WorkflowConfig};
use workflow::runner::{Runner, WorkflowResult};

mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Synthetic IACT map-making workflow driver")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Stacking mode (defaults to the workflow file, else `stack`)
    #[arg(long, value_enum)]
    mode: Option<Mode>,
    /// Collapse the energy axis into images
    #[arg(long, default_value_t = false)]
    images: bool,
    /// Number of synthetic observations
    #[arg(long)]
    observations: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    /// JSON-lines report, appended to on every run
    #[arg(long, default_value = "reports/cubesim.jsonl")]
    report: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = &args.workflow {
        let mut config = WorkflowConfig::load(path)?;
        config.apply_overrides(args.mode, args.images, args.observations, args.seed);
        config
    } else {
        WorkflowConfig::from_args(
            args.mode.unwrap_or_default(),
            args.images,
            args.observations.unwrap_or(4),
            args.seed.unwrap_or(0),
        )
    };

    let observations =
        build_observations(&workflow_config.generator).context("generating observations")?;
    let runner = Runner::new(workflow_config);
    let result = runner.execute(&observations)?;

    println!(
        "{:?} run -> observations {}, processed {}, skipped {}, peak significance {}",
        result.mode,
        result.observations,
        result.metrics.processed,
        result.metrics.skipped(),
        result
            .peak_significance
            .map(|value| format!("{value:.2}"))
            .unwrap_or_else(|| "n/a".to_string())
    );
    for (key, total) in &result.totals {
        println!("  {key:<13} {total:.4e}");
    }

    append_report(&args.report, &result)
        .with_context(|| format!("writing report {}", args.report.display()))?;
    Ok(())
}

fn append_report(path: &Path, result: &WorkflowResult) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut line = serde_json::to_string(result)?;
    line.push('\n');
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

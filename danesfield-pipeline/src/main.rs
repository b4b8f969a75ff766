//! danesfield - run the reconstruction pipeline on an AOI from start to finish

use anyhow::{Context, Result};
use clap::Parser;
use danesfield_common::config::{PipelineConfig, WORK_DIR_ENV};
use danesfield_pipeline::services::GdalInfoOpener;
use danesfield_pipeline::stages::{CommandExecutor, DryRunExecutor, StageExecutor};
use danesfield_pipeline::{logging, run_pipeline, RunOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Command-line arguments for danesfield
#[derive(Parser, Debug)]
#[command(name = "danesfield")]
#[command(about = "Run the Danesfield reconstruction pipeline")]
#[command(version)]
struct Args {
    /// Run configuration file (TOML)
    config: PathBuf,

    /// Working directory for all generated files
    #[arg(long, env = WORK_DIR_ENV)]
    work_dir: Option<PathBuf>,

    /// Maximum concurrent per-collection stage invocations
    #[arg(long)]
    parallelism: Option<usize>,

    /// Log every stage command without executing it
    #[arg(long)]
    dry_run: bool,

    /// Program used to inspect rasters
    #[arg(long, default_value = "gdalinfo")]
    gdalinfo: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = PipelineConfig::load(&args.config)
        .with_context(|| format!("Failed to load configuration {}", args.config.display()))?;

    logging::init(config.logging.level.as_deref());

    info!("Starting danesfield {}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {}", args.config.display());

    let executor: Arc<dyn StageExecutor> = if args.dry_run {
        info!("Dry run: stage commands are logged, not executed");
        Arc::new(DryRunExecutor)
    } else {
        Arc::new(CommandExecutor::new())
    };
    let opener = Arc::new(GdalInfoOpener::new(args.gdalinfo));

    let options = RunOptions {
        work_dir: args.work_dir,
        parallelism: args.parallelism,
    };

    let summary = run_pipeline(config, options, executor, opener)
        .await
        .context("Pipeline run failed")?;

    info!(
        "Finished in {:.1}s; outputs in {}",
        summary.elapsed.as_secs_f64(),
        summary.work_dir.display()
    );
    Ok(())
}

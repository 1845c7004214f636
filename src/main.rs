// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use sheetsplit::{SplitConfig, Splitter};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sheetsplit")]
#[command(about = "Split a project/batch keyed spreadsheet into per-batch workbooks")]
struct Args {
    /// Input .xlsx file to split
    input: PathBuf,

    /// Output directory for the per-project folders (default: ./split_output)
    #[arg(short, long, default_value = "split_output")]
    output: PathBuf,

    /// Worker count for the write phase (default: derived from CPU count)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sheetsplit={}", log_level)));
    tracing_subscriber::fmt().with_env_filter(env).init();

    info!("Input file: {}", args.input.display());
    info!("Output directory: {}", args.output.display());

    fs::create_dir_all(&args.output).context("Failed to create output directory")?;

    let mut splitter = Splitter::new(SplitConfig {
        max_workers: args.jobs,
        ..SplitConfig::default()
    });
    let progress = |percent: u8| info!("{}% of projects written", percent);
    let summary = splitter.split(&args.input, &args.output, Some(&progress))?;

    info!(
        "Done: {} projects, {} batches, {} rows",
        summary.projects, summary.batches, summary.rows
    );
    Ok(())
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Pop Defence scenarios headlessly.

mod runner;
mod scenario;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use pop_defence_catalog::Catalog;
use tracing_subscriber::EnvFilter;

use crate::{runner::Runner, scenario::Scenario};

/// Runs a scenario to completion and prints the outcome.
#[derive(Debug, Parser)]
#[command(name = "pop-defence", version)]
struct Cli {
    /// Scenario file describing the path, towers and waves.
    #[arg(long)]
    scenario: PathBuf,
    /// Overrides the scenario's tick budget.
    #[arg(long)]
    ticks: Option<u64>,
    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Entry point for the Pop Defence command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let mut scenario = Scenario::load(&cli.scenario)?;
    if let Some(ticks) = cli.ticks {
        scenario.max_ticks = ticks;
    }
    let catalog = Catalog::builtin().context("builtin catalog is invalid")?;

    let summary = Runner::new(&scenario, catalog)?.run();
    println!("{summary}");
    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level '{level}'"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow!("failed to install log subscriber: {error}"))
}

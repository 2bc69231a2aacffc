//! Trellis CLI
//!
//! Run the bundled scenarios and print the widget trees they produce.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod scenarios;

use config::TrellisConfig;
use scenarios::Scenario;

#[derive(Parser)]
#[command(name = "trellis")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Trellis widget tree runtime", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ./trellis.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a bundled scenario
    Run {
        /// Scenario to run
        #[arg(value_enum)]
        scenario: Scenario,

        /// Override the settle pass limit
        #[arg(long)]
        max_passes: Option<usize>,
    },

    /// List the bundled scenarios
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => TrellisConfig::load(path)?,
        None => TrellisConfig::load_from_dir(
            &std::env::current_dir().context("Failed to read working directory")?,
        )?,
    };

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_new(&config.log.filter)
            .with_context(|| format!("Invalid log filter '{}'", config.log.filter))?
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Run {
            scenario,
            max_passes,
        } => cmd_run(scenario, config, max_passes),

        Commands::List => cmd_list(),
    }
}

fn cmd_run(scenario: Scenario, config: TrellisConfig, max_passes: Option<usize>) -> Result<()> {
    let mut runtime = config.runtime;
    if let Some(max_passes) = max_passes {
        runtime.max_settle_passes = max_passes;
    }

    info!(
        "Running {:?} (max {} settle passes)",
        scenario, runtime.max_settle_passes
    );
    scenarios::run(scenario, runtime)
}

fn cmd_list() -> Result<()> {
    println!("Scenarios:");
    for scenario in Scenario::value_variants() {
        if let Some(value) = scenario.to_possible_value() {
            println!("  {:<14} {}", value.get_name(), scenario.summary());
        }
    }
    Ok(())
}

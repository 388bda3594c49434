#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless PokerShot simulation.

mod config;
mod simulation;

use std::{path::PathBuf, time::Duration};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::simulation::{Options, Simulation};

/// Runs a seeded PokerShot arena simulation and prints a run summary.
#[derive(Debug, Parser)]
#[command(name = "pokershot", version)]
struct Args {
    /// TOML file holding the run configuration. Built-in defaults apply when omitted.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Simulated seconds before the run is cut short.
    #[arg(long, default_value_t = 180.0)]
    seconds: f32,
    /// Length of a single simulation tick in milliseconds.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,
    /// Overrides the seed from the configuration file.
    #[arg(long)]
    seed: Option<u64>,
    /// Never activate the held hand automatically.
    #[arg(long)]
    no_auto_activate: bool,
    /// Stay in the shop instead of launching the next wave.
    #[arg(long)]
    no_auto_advance: bool,
}

/// Entry point for the PokerShot command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    ensure!(args.tick_ms > 0, "--tick-ms must be positive");
    ensure!(
        args.seconds.is_finite() && args.seconds > 0.0,
        "--seconds must be a positive number"
    );
    let duration =
        Duration::try_from_secs_f32(args.seconds).context("--seconds is out of range")?;

    let mut game = config::load(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        game.seed = seed;
    }

    let options = Options {
        tick: Duration::from_millis(args.tick_ms),
        duration,
        auto_activate: !args.no_auto_activate,
        auto_advance: !args.no_auto_advance,
    };
    let mut simulation = Simulation::new(game, options)?;
    println!("{}", simulation.welcome_banner());
    let summary = simulation.run();
    println!("{summary}");
    Ok(())
}

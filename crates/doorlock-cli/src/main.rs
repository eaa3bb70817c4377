//! Door lock simulator.
//!
//! Runs the full lock core on mock hardware and drives it from the console.
//!
//! # Usage
//!
//! ```bash
//! # Defaults
//! doorlock-sim
//!
//! # With a JSON configuration file
//! doorlock-sim --config doorlock.json
//!
//! # Verbose
//! RUST_LOG=debug doorlock-sim
//! ```

mod command;
mod sim;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use doorlock_core::DoorLockConfig;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::command::SimCommand;
use crate::sim::Simulator;

/// BLE door lock core simulator
#[derive(Parser, Debug)]
#[command(name = "doorlock-sim")]
#[command(about = "Door lock core running on simulated hardware")]
#[command(version)]
struct Args {
    /// Path to a JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config = match &args.config {
        Some(path) => DoorLockConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => DoorLockConfig::default(),
    };
    info!("Door lock simulator {} starting", doorlock_core::VERSION);

    let simulator = Simulator::start(config)?;
    println!("{}", command::HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<SimCommand>() {
                    Ok(command) => {
                        if !simulator.apply(command) {
                            break;
                        }
                    }
                    Err(e) => println!("{e}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    simulator.shutdown().await;
    Ok(())
}

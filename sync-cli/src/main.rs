//! # syncwatch
//!
//! Replays recorded daemon event logs through the syncwatch model.
//!
//! ## Commands
//!
//! - `replay`: Apply one or more event batches and print the resulting model
//! - `config`: Show the effective model configuration
//!
//! ## Example
//!
//! ```bash
//! # Capture a batch from the daemon's event endpoint
//! curl -s -H "X-API-Key: $KEY" http://127.0.0.1:8384/rest/events > batch-1.json
//!
//! # Rebuild the model from it
//! syncwatch replay batch-1.json
//!
//! # Treat any skipped event id as a missed event
//! syncwatch replay --contiguous batch-1.json batch-2.json --json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use syncwatch_core::OrderingPolicy;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{replay, show_config};
use config::CliConfig;

/// Replay daemon event logs through the syncwatch model.
#[derive(Parser, Debug)]
#[command(name = "syncwatch")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: syncwatch.toml in the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply event batches in order and print the resulting model
    Replay {
        /// Event batch files (JSON arrays from the daemon's event endpoint)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,

        /// Require consecutive event ids (a skipped id invalidates the model)
        #[arg(long)]
        contiguous: bool,
    },

    /// Show the effective model configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level);

    let mut config =
        CliConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Replay {
            files,
            json,
            contiguous,
        } => {
            if contiguous {
                config.model.ordering = OrderingPolicy::Contiguous;
            }
            replay::run(&files, config.model, json).await?;
        }
        Commands::Config => {
            show_config::run(&config)?;
        }
    }

    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `--log-level`.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

//! # msg-consumer
//!
//! Command-line entry point.
//!
//! Provides:
//! - Configuration loading and validation
//! - Consumer startup, envelope intake and shutdown
//! - Run summaries

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_pipeline, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Metrics are enabled later by `run`, once the configuration is known
    observability::init_with_config(
        ObservabilityConfig {
            log_format: cli.log_format.into(),
            ..Default::default()
        }
        .with_verbosity(cli.verbose, cli.quiet),
    )?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "msg-consumer starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => run_pipeline(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

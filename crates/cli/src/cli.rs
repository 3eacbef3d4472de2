//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// msg-consumer - subject-routed message normalization
#[derive(Parser, Debug)]
#[command(
    name = "msg-consumer",
    author,
    version,
    about = "Subject-routed message consumer",
    long_about = "Subscribes to the SenML and JSON subjects, normalizes every message \n\
                  into measurement records and hands them to the configured sink.\n\n\
                  Messages are read as JSON envelopes, one per line, from a file or stdin."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "MSG_CONSUMER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "MSG_CONSUMER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Subscribe, consume envelopes until EOF or a shutdown signal
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration and subscription information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "consumer.toml",
        env = "MSG_CONSUMER_CONFIG"
    )]
    pub config: PathBuf,

    /// JSON-lines envelope file (stdin when omitted)
    #[arg(short, long, env = "MSG_CONSUMER_INPUT")]
    pub input: Option<PathBuf>,

    /// Override the metrics port from configuration (0 = disabled)
    #[arg(long, env = "MSG_CONSUMER_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Override the consumer id from configuration
    #[arg(long, env = "MSG_CONSUMER_ID")]
    pub consumer_id: Option<String>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "consumer.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "consumer.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

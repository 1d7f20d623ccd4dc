//! CLI module
//!
//! This module defines the command-line interface using clap and implements
//! the command execution logic.

use crate::{Config, Error, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;
pub mod output;

/// Machine Timeline CLI
#[derive(Parser, Debug)]
#[command(name = "machine-timeline")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Which machine, where from, and which window
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Machine identifier (overrides config)
    #[arg(short, long)]
    pub machine: Option<String>,

    /// Data source type (overrides config)
    #[arg(short, long, value_enum)]
    pub source: Option<DataSourceType>,

    /// Window start (RFC 3339 or YYYY-MM-DD HH:MM[:SS], UTC)
    #[arg(long)]
    pub start: Option<String>,

    /// Window end; defaults to now when a start is given
    #[arg(long)]
    pub end: Option<String>,

    /// Enable response caching
    #[arg(long)]
    pub cache: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the interactive timeline
    View {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Open the timeline and refresh it periodically
    Watch {
        #[command(flatten)]
        target: TargetArgs,

        /// Refresh interval in seconds (overrides config)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Export the normalized events of a window
    Export {
        #[command(flatten)]
        target: TargetArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the state in effect at an instant
    StateAt {
        /// Instant to resolve
        instant: String,

        #[command(flatten)]
        target: TargetArgs,
    },
}

/// Data source types
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DataSourceType {
    /// Events endpoint over HTTP
    Http,
    /// Synthetic data for testing
    Mock,
}

impl DataSourceType {
    /// Command-line choice, falling back to the configured default
    pub fn resolve(choice: Option<DataSourceType>, config: &Config) -> Result<Self> {
        if let Some(choice) = choice {
            return Ok(choice);
        }
        <DataSourceType as ValueEnum>::from_str(&config.default.source, true).map_err(|_| {
            Error::Config(format!(
                "unknown data source '{}' (expected http or mock)",
                config.default.source
            ))
        })
    }
}

/// Export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// `state,timestamp` rows
    Csv,
    /// Events, step series and summary
    Json,
    /// Plain text table
    Table,
}

/// Execute the CLI command
pub async fn execute(args: Cli, config: Config) -> Result<()> {
    match args.command {
        Commands::View { target } => commands::view::execute(target, config, None).await,
        Commands::Watch { target, interval } => {
            let interval = interval.unwrap_or(config.chart.refresh_interval_secs);
            commands::view::execute(target, config, Some(interval)).await
        }
        Commands::Export {
            target,
            format,
            output,
        } => commands::export::execute(target, config, format, output).await,
        Commands::StateAt { instant, target } => {
            commands::state_at::execute(&instant, target, config).await
        }
    }
}

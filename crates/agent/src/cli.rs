use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use domain::alert::entity::{AlertState, SuppressedReason};
use infrastructure::config::{LogFormat, LogLevel};
use infrastructure::constants::DEFAULT_QUERY_LIMIT;

#[derive(Parser, Debug)]
#[command(
    name = "alerttrail",
    about = "Durable audit trail of alert state transitions",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to the YAML configuration file
    /// (default: /etc/alerttrail/config.yaml, optional)
    #[arg(short, long, env = "ALERTTRAIL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level override (takes precedence over config file)
    #[arg(short, long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Log format: json (default, production) or text (development)
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// Output format
    #[arg(short, long, default_value = "table", global = true)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table (default)
    Table,
    /// JSON
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Display version and build information
    Version,

    /// Compute the fingerprint of a label set
    Fingerprint {
        /// Labels as name=value pairs
        #[arg(required = true, num_args = 1..)]
        labels: Vec<String>,
    },

    /// Replay recorded marker operations (JSON lines) through the state log
    Replay {
        /// File with one JSON operation per line
        file: PathBuf,
        /// Print the Prometheus metrics exposition after the replay
        #[arg(long)]
        metrics: bool,
    },

    /// Show the persisted state history of one alert
    History {
        /// Alert fingerprint (16 hex digits)
        fingerprint: String,
        /// Maximum number of results
        #[arg(long, default_value_t = DEFAULT_QUERY_LIMIT)]
        limit: usize,
    },

    /// List persisted state events
    Events {
        /// Filter by state
        #[arg(long)]
        state: Option<AlertState>,
        /// Filter by suppression reason
        #[arg(long)]
        reason: Option<SuppressedReason>,
        /// Maximum number of results
        #[arg(long, default_value_t = DEFAULT_QUERY_LIMIT)]
        limit: usize,
        /// Offset for pagination
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Row counts per state in the state store
    Stats,
}

pub fn parse() -> Cli {
    Cli::parse()
}

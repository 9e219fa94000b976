//! CLI argument parsing for the tally binary

use clap::Parser;
use std::path::PathBuf;

/// Tally replicated ledger node
#[derive(Parser, Debug, Clone)]
#[command(name = "tally")]
#[command(about = "Paxos-replicated money-transfer ledger node")]
#[command(version)]
pub struct Cli {
    /// This peer's id (must appear in the roster file)
    #[arg(long)]
    pub id: u32,

    /// Roster file mapping peer ids to addresses
    #[arg(long, default_value = "config.json")]
    pub config: PathBuf,

    /// Directory for the persisted state file
    #[arg(long, default_value = "./data")]
    pub state_dir: PathBuf,

    /// Simulated one-way network delay in milliseconds
    #[arg(long, default_value = "3000")]
    pub net_delay_ms: u64,

    /// Paxos proposal retry timeout in milliseconds
    #[arg(long, default_value = "20000")]
    pub retry_timeout_ms: u64,

    /// Recovery sync collection window in milliseconds
    #[arg(long, default_value = "8000")]
    pub sync_window_ms: u64,

    /// Settle pause before the recovery sync request, in milliseconds
    #[arg(long, default_value = "1000")]
    pub sync_settle_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

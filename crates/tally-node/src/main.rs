//! Tally node binary
//!
//! Runs one roster peer: binds the configured listen address, starts the
//! driver, and serves commands from stdin.

mod cli;

use anyhow::{Context, Result};
use cli::Cli;
use std::time::Duration;
use tally_node::{bind_and_spawn, config::NodeConfig, repl, Timing};
use tally_types::NodeId;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let timing = Timing {
        net_delay: Duration::from_millis(cli.net_delay_ms),
        retry_timeout: Duration::from_millis(cli.retry_timeout_ms),
        sync_window: Duration::from_millis(cli.sync_window_ms),
        sync_settle: Duration::from_millis(cli.sync_settle_ms),
    };
    let config = NodeConfig::from_roster_file(
        NodeId::new(cli.id),
        &cli.config,
        cli.state_dir.clone(),
        timing,
    )
    .with_context(|| format!("loading roster from {}", cli.config.display()))?;

    let listen = config.listen_addr()?;
    let handle = bind_and_spawn(config)
        .await
        .with_context(|| format!("binding {}", listen))?;

    tokio::select! {
        result = repl::run(handle.clone()) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received, shutting down");
            let _ = handle.shutdown().await;
        }
    }

    tracing::info!("node stopped");
    Ok(())
}

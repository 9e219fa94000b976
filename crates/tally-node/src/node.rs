//! Node wiring and the public handle

use crate::config::NodeConfig;
use crate::driver::{Command, Driver, Snapshot};
use crate::error::{NodeError, NodeResult};
use parking_lot::RwLock;
use std::sync::Arc;
use tally_chain::Ledger;
use tally_network::{spawn_listener, Messenger};
use tally_types::NodeId;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{info, warn};

/// Handle to a running node. Cloneable; used by the REPL and by tests.
#[derive(Clone)]
pub struct NodeHandle {
    id: NodeId,
    commands: mpsc::Sender<Command>,
}

impl NodeHandle {
    /// This node's peer id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Build a transfer block and start Paxos on it.
    pub async fn transfer(&self, dest: NodeId, amount: u64) -> NodeResult<()> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Transfer {
                dest,
                amount,
                reply,
            })
            .await
            .map_err(|_| NodeError::Stopped)?;
        response.await.map_err(|_| NodeError::Stopped)?
    }

    /// Mark the peer failed.
    pub async fn fail(&self) -> NodeResult<()> {
        self.commands
            .send(Command::Fail)
            .await
            .map_err(|_| NodeError::Stopped)
    }

    /// Mark the peer live again and trigger recovery.
    pub async fn fix(&self) -> NodeResult<()> {
        self.commands
            .send(Command::Fix)
            .await
            .map_err(|_| NodeError::Stopped)
    }

    /// Read the current chain and balances.
    pub async fn snapshot(&self) -> NodeResult<Snapshot> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Snapshot { reply })
            .await
            .map_err(|_| NodeError::Stopped)?;
        response.await.map_err(|_| NodeError::Stopped)
    }

    /// Stop the listener and the driver.
    pub async fn shutdown(&self) -> NodeResult<()> {
        self.commands
            .send(Command::Shutdown)
            .await
            .map_err(|_| NodeError::Stopped)
    }
}

/// Start a node on an already-bound listener.
///
/// Binding first lets callers (the harness in particular) use ephemeral
/// ports: bind everything, collect the real addresses into the roster,
/// then spawn.
pub async fn spawn(config: NodeConfig, listener: TcpListener) -> NodeResult<NodeHandle> {
    std::fs::create_dir_all(&config.state_dir)?;

    let failed = Arc::new(RwLock::new(false));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (inbound_tx, inbound_rx) = mpsc::channel(256);
    let (commands_tx, commands_rx) = mpsc::channel(64);

    let ledger = match Ledger::restore(config.id, &config.state_dir) {
        Ok(ledger) => ledger,
        Err(e) => {
            warn!(node = %config.id, error = %e, "state file rejected, starting from genesis");
            Ledger::new(config.id)
        }
    };
    info!(
        node = %config.id,
        depth = ledger.depth(),
        addr = %listener.local_addr()?,
        "node starting"
    );

    let messenger = Messenger::new(
        config.id,
        Arc::new(config.roster.clone()),
        config.timing.net_delay,
        failed.clone(),
    );

    spawn_listener(listener, failed.clone(), inbound_tx, shutdown_rx);

    let id = config.id;
    let (driver, ticks_rx) = Driver::new(config, ledger, messenger, failed, shutdown_tx);
    tokio::spawn(driver.run(inbound_rx, commands_rx, ticks_rx));

    Ok(NodeHandle {
        id,
        commands: commands_tx,
    })
}

/// Bind this peer's configured address and start the node.
pub async fn bind_and_spawn(config: NodeConfig) -> NodeResult<NodeHandle> {
    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr).await?;
    spawn(config, listener).await
}

//! Configuration types for tally-node

use crate::error::{NodeError, NodeResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tally_types::NodeId;

/// One peer's entry in the roster file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerEntry {
    /// Listen IP
    pub ip: String,
    /// Listen port
    pub port: u16,
}

/// Timing constants. The defaults mirror the simulated WAN: a 3 s one-way
/// delay gives a ~12 s two-phase round trip, so the 20 s retry sits above
/// 2x RTT; the 8 s sync window covers request + response plus margin.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    /// One-way send delay
    pub net_delay: Duration,
    /// Paxos proposal retry timeout
    pub retry_timeout: Duration,
    /// Recovery response collection window
    pub sync_window: Duration,
    /// Pause between recovery and the sync request
    pub sync_settle: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            net_delay: Duration::from_secs(3),
            retry_timeout: Duration::from_secs(20),
            sync_window: Duration::from_secs(8),
            sync_settle: Duration::from_secs(1),
        }
    }
}

/// Node configuration
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// This peer's id
    pub id: NodeId,
    /// Directory holding the persisted state file
    pub state_dir: PathBuf,
    /// Resolved roster addresses, this peer included
    pub roster: BTreeMap<NodeId, SocketAddr>,
    /// Timing constants
    pub timing: Timing,
}

impl NodeConfig {
    /// Build a config from a roster file (`config.json`).
    pub fn from_roster_file(
        id: NodeId,
        path: &Path,
        state_dir: PathBuf,
        timing: Timing,
    ) -> NodeResult<Self> {
        let body = std::fs::read_to_string(path).map_err(|e| {
            NodeError::Config(format!("cannot read roster {}: {}", path.display(), e))
        })?;
        let entries: BTreeMap<NodeId, PeerEntry> = serde_json::from_str(&body)
            .map_err(|e| NodeError::Config(format!("invalid roster: {}", e)))?;
        let roster = resolve_roster(&entries)?;

        let config = Self {
            id,
            state_dir,
            roster,
            timing,
        };
        config.listen_addr()?;
        Ok(config)
    }

    /// This peer's own listen address.
    pub fn listen_addr(&self) -> NodeResult<SocketAddr> {
        self.roster
            .get(&self.id)
            .copied()
            .ok_or_else(|| NodeError::Config(format!("peer {} not in roster", self.id)))
    }
}

/// Resolve roster entries into socket addresses.
pub fn resolve_roster(
    entries: &BTreeMap<NodeId, PeerEntry>,
) -> NodeResult<BTreeMap<NodeId, SocketAddr>> {
    entries
        .iter()
        .map(|(id, entry)| {
            let ip: IpAddr = entry.ip.parse().map_err(|_| {
                NodeError::Config(format!("peer {}: invalid ip {:?}", id, entry.ip))
            })?;
            Ok((*id, SocketAddr::new(ip, entry.port)))
        })
        .collect()
}

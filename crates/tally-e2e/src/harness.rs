//! In-process cluster harness

use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tally_chain::Ledger;
use tally_node::{config::NodeConfig, spawn, NodeHandle, Snapshot, Timing};
use tally_types::NodeId;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Timers scaled for loopback, keeping the production delay/retry/window
/// proportions: the retry sits above 2x the two-phase round trip and the
/// sync window above a request/response round trip.
pub fn fast_timing() -> Timing {
    Timing {
        net_delay: Duration::from_millis(25),
        retry_timeout: Duration::from_millis(400),
        sync_window: Duration::from_millis(250),
        sync_settle: Duration::from_millis(40),
    }
}

/// A full roster of in-process nodes on ephemeral loopback ports.
pub struct Cluster {
    nodes: Vec<NodeHandle>,
    _dirs: Vec<TempDir>,
}

impl Cluster {
    /// Launch `count` fresh peers with [`fast_timing`].
    pub async fn launch(count: usize) -> Result<Self> {
        Self::launch_with(count, fast_timing()).await
    }

    /// Launch `count` fresh peers with explicit timers.
    pub async fn launch_with(count: usize, timing: Timing) -> Result<Self> {
        // Bind everything first so the shared roster carries real ports.
        let mut listeners = Vec::with_capacity(count);
        let mut roster = BTreeMap::new();
        for i in 0..count {
            let listener = TcpListener::bind("127.0.0.1:0").await?;
            roster.insert(NodeId::new(i as u32 + 1), listener.local_addr()?);
            listeners.push(listener);
        }

        let mut nodes = Vec::with_capacity(count);
        let mut dirs = Vec::with_capacity(count);
        for (i, listener) in listeners.into_iter().enumerate() {
            let dir = TempDir::new()?;
            let config = NodeConfig {
                id: NodeId::new(i as u32 + 1),
                state_dir: dir.path().to_path_buf(),
                roster: roster.clone(),
                timing,
            };
            nodes.push(spawn(config, listener).await?);
            dirs.push(dir);
        }

        Ok(Self {
            nodes,
            _dirs: dirs,
        })
    }

    /// Handle of peer `id` (1-based).
    pub fn node(&self, id: u32) -> &NodeHandle {
        &self.nodes[(id - 1) as usize]
    }

    /// All peer ids.
    pub fn ids(&self) -> Vec<u32> {
        (1..=self.nodes.len() as u32).collect()
    }

    /// `moneyTransfer` on peer `from`.
    pub async fn transfer(&self, from: u32, to: u32, amount: u64) -> Result<(), tally_node::NodeError> {
        self.node(from).transfer(NodeId::new(to), amount).await
    }

    /// Snapshot of peer `id`.
    pub async fn snapshot(&self, id: u32) -> Result<Snapshot> {
        Ok(self.node(id).snapshot().await?)
    }

    /// Chain length at peer `id`.
    pub async fn depth(&self, id: u32) -> Result<u64> {
        Ok(self.snapshot(id).await?.depth())
    }

    /// Poll until every listed peer reaches at least `depth`.
    pub async fn wait_for_depth(&self, ids: &[u32], depth: u64, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            let mut lagging = None;
            for &id in ids {
                let current = self.depth(id).await?;
                if current < depth {
                    lagging = Some((id, current));
                    break;
                }
            }
            match lagging {
                None => return Ok(()),
                Some((id, current)) if Instant::now() >= deadline => {
                    return Err(anyhow!(
                        "peer {} stuck at depth {} (wanted {})",
                        id,
                        current,
                        depth
                    ));
                }
                Some(_) => tokio::time::sleep(Duration::from_millis(25)).await,
            }
        }
    }

    /// The convergence audit: every listed peer holds the same chain
    /// (hash-for-hash), the same balances, conservation holds, and the
    /// chain revalidates from genesis.
    pub async fn assert_converged(&self, ids: &[u32]) -> Result<()> {
        let mut reference: Option<(u32, Snapshot)> = None;
        for &id in ids {
            let snap = self.snapshot(id).await?;

            // Structural invariants first.
            let derived = Ledger::validate_candidate(&snap.chain)
                .map_err(|e| anyhow!("peer {} holds an invalid chain: {}", id, e))?;
            for (peer, balance) in &derived {
                let held = snap.balances.get(peer).copied().unwrap_or(0);
                if held != *balance {
                    return Err(anyhow!(
                        "peer {} balance table disagrees with replay for {}: {} vs {}",
                        id,
                        peer,
                        held,
                        balance
                    ));
                }
            }
            let total: i64 = snap.balances.values().sum();
            if total != 500 {
                return Err(anyhow!("peer {} total is {}, expected 500", id, total));
            }

            // Then agreement with the first peer.
            match &reference {
                None => reference = Some((id, snap)),
                Some((ref_id, ref_snap)) => {
                    if ref_snap.depth() != snap.depth() {
                        return Err(anyhow!(
                            "depth mismatch: peer {} has {}, peer {} has {}",
                            ref_id,
                            ref_snap.depth(),
                            id,
                            snap.depth()
                        ));
                    }
                    for (height, (a, b)) in
                        ref_snap.chain.iter().zip(snap.chain.iter()).enumerate()
                    {
                        if a.hash != b.hash {
                            return Err(anyhow!(
                                "block {} differs between peers {} and {}",
                                height,
                                ref_id,
                                id
                            ));
                        }
                    }
                    if ref_snap.balances != snap.balances {
                        return Err(anyhow!(
                            "balance tables differ between peers {} and {}",
                            ref_id,
                            id
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Balance of `peer` as seen by `observer`.
    pub async fn balance(&self, observer: u32, peer: u32) -> Result<i64> {
        let snap = self.snapshot(observer).await?;
        Ok(snap.balances.get(&NodeId::new(peer)).copied().unwrap_or(0))
    }
}

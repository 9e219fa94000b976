//! The driver task: owns all mutable node state
//!
//! Every inbound message, REPL command and timer expiry is funneled into
//! one task that owns the ledger, the Paxos instance and the sync buffer,
//! so handlers execute atomically with respect to each other and to the
//! commit pipeline. Only the failed flag is shared outside: the messenger
//! and the listener consult it without going through the driver.

use crate::config::NodeConfig;
use crate::error::NodeError;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tally_chain::{Commit, Ledger};
use tally_consensus::{Effect, PaxosInstance};
use tally_network::Messenger;
use tally_types::{Block, Message, NodeId};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

/// A request from the REPL or the test harness.
#[derive(Debug)]
pub enum Command {
    /// Start Paxos on a transfer from this peer.
    Transfer {
        /// Receiving peer
        dest: NodeId,
        /// Amount to move
        amount: u64,
        /// Accepted locally, or why not
        reply: oneshot::Sender<Result<(), NodeError>>,
    },
    /// Simulate a crash.
    Fail,
    /// Recover from a simulated crash and trigger sync.
    Fix,
    /// Read the current chain and balances.
    Snapshot {
        /// Receives the state copy
        reply: oneshot::Sender<Snapshot>,
    },
    /// Stop the listener and the driver.
    Shutdown,
}

/// A copy of the node's externally observable state.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Committed chain
    pub chain: Vec<Block>,
    /// Balance table
    pub balances: BTreeMap<NodeId, i64>,
    /// Whether the peer is simulating a crash
    pub failed: bool,
}

impl Snapshot {
    /// Chain length.
    pub fn depth(&self) -> u64 {
        self.chain.len() as u64
    }
}

/// One-shot timer expiries, tagged with the generation that armed them so
/// cancelled timers land harmlessly.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Tick {
    Retry(u64),
    SyncBegin(u64),
    SyncWindow(u64),
}

pub(crate) struct Driver {
    config: NodeConfig,
    ledger: Ledger,
    paxos: PaxosInstance,
    messenger: Messenger,
    failed: Arc<RwLock<bool>>,
    shutdown: watch::Sender<bool>,

    ticks_tx: mpsc::Sender<Tick>,
    retry_gen: u64,
    sync_gen: u64,

    syncing: bool,
    sync_buf: Vec<(NodeId, Vec<Block>)>,
}

impl Driver {
    pub(crate) fn new(
        config: NodeConfig,
        ledger: Ledger,
        messenger: Messenger,
        failed: Arc<RwLock<bool>>,
        shutdown: watch::Sender<bool>,
    ) -> (Self, mpsc::Receiver<Tick>) {
        let paxos = PaxosInstance::new(config.id, config.roster.len());
        let (ticks_tx, ticks_rx) = mpsc::channel(64);
        let driver = Self {
            config,
            ledger,
            paxos,
            messenger,
            failed,
            shutdown,
            ticks_tx,
            retry_gen: 0,
            sync_gen: 0,
            syncing: false,
            sync_buf: Vec::new(),
        };
        (driver, ticks_rx)
    }

    fn node(&self) -> NodeId {
        self.config.id
    }

    fn is_failed(&self) -> bool {
        *self.failed.read()
    }

    /// Main event loop. Runs until `Shutdown` or all inputs close.
    pub(crate) async fn run(
        mut self,
        mut inbound: mpsc::Receiver<Message>,
        mut commands: mpsc::Receiver<Command>,
        mut ticks: mpsc::Receiver<Tick>,
    ) {
        loop {
            tokio::select! {
                Some(msg) = inbound.recv() => self.on_message(msg),
                Some(cmd) = commands.recv() => {
                    if self.on_command(cmd) {
                        break;
                    }
                }
                Some(tick) = ticks.recv() => self.on_tick(tick),
                else => break,
            }
        }
        let _ = self.shutdown.send(true);
        info!(node = %self.node(), "driver stopped");
    }

    // ── Inbound messages ────────────────────────────────────────────────

    fn on_message(&mut self, msg: Message) {
        if self.is_failed() {
            // Queued before the crash flag flipped; a failed peer
            // processes nothing.
            return;
        }
        debug!(node = %self.node(), kind = msg.kind(), sender = %msg.sender(), "handling");
        self.dispatch(msg);
        self.drain_effects();
    }

    fn dispatch(&mut self, msg: Message) {
        match msg {
            Message::Prepare { sender, ballot } => self.paxos.on_prepare(sender, ballot),
            Message::Promise {
                sender,
                ballot,
                accepted_ballot,
                accepted_val,
            } => self
                .paxos
                .on_promise(sender, ballot, accepted_ballot, accepted_val),
            Message::Accept { sender, ballot, val } => {
                self.paxos.on_accept(sender, ballot, val)
            }
            Message::Accepted { sender, ballot, val } => {
                self.paxos.on_accepted(sender, ballot, val)
            }
            Message::Decide { val, .. } => self.paxos.on_decide(val),
            Message::RequestBlockchain { sender, my_depth } => {
                self.on_chain_request(sender, my_depth)
            }
            Message::BlockchainResponse { sender, chain, .. } => {
                // The attached balance table is a hint only; adoption
                // recomputes balances from genesis.
                self.on_chain_response(sender, chain)
            }
        }
    }

    // ── Paxos effect execution ──────────────────────────────────────────

    fn drain_effects(&mut self) {
        // Loop: executing one batch (e.g. a self-addressed PROMISE) can
        // queue the next.
        loop {
            let effects = self.paxos.take_effects();
            if effects.is_empty() {
                break;
            }
            for effect in effects {
                match effect {
                    Effect::Broadcast(msg) => self.messenger.broadcast(&msg),
                    Effect::Send(target, msg) => {
                        if target == self.node() {
                            // The proposer answers itself without touching
                            // the simulated network.
                            self.dispatch(msg);
                        } else {
                            self.messenger.send(target, &msg);
                        }
                    }
                    Effect::Commit(block) => self.commit_block(block),
                    Effect::Repropose(block) => self.repropose(block),
                    Effect::ArmRetry => {
                        self.retry_gen += 1;
                        self.schedule(
                            self.config.timing.retry_timeout,
                            Tick::Retry(self.retry_gen),
                        );
                    }
                    Effect::CancelRetry => {
                        self.retry_gen += 1;
                    }
                }
            }
        }
    }

    fn commit_block(&mut self, block: Block) {
        match self.ledger.commit(block) {
            Ok(Commit::Appended) => {
                self.persist();
                info!(node = %self.node(), depth = self.ledger.depth(), "chain advanced");
            }
            Ok(Commit::Duplicate) => {
                debug!(node = %self.node(), "decided block already committed");
            }
            Err(e) => {
                // The block stays learned; this peer is behind and will
                // catch up via sync.
                warn!(node = %self.node(), error = %e, "decided block failed validation");
            }
        }
    }

    fn repropose(&mut self, block: Block) {
        match self.ledger.rebase(&block) {
            Ok(rebased) => {
                info!(
                    node = %self.node(),
                    receiver = %rebased.receiver,
                    amount = rebased.amount,
                    depth = self.ledger.depth(),
                    "reproposing transfer"
                );
                self.paxos.propose(rebased, self.ledger.depth());
            }
            Err(e) => {
                warn!(node = %self.node(), error = %e, "abandoning pending transfer");
                self.paxos.cancel_proposal();
            }
        }
    }

    fn persist(&self) {
        if let Err(e) = self.ledger.persist(&self.config.state_dir) {
            // Non-fatal: the chain is still replicated on the other peers.
            warn!(node = %self.node(), error = %e, "persist failed");
        }
    }

    // ── Commands ────────────────────────────────────────────────────────

    /// Returns true when the driver should stop.
    fn on_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Transfer {
                dest,
                amount,
                reply,
            } => {
                let result = self.start_transfer(dest, amount);
                let _ = reply.send(result);
            }
            Command::Fail => self.fail(),
            Command::Fix => self.fix(),
            Command::Snapshot { reply } => {
                let _ = reply.send(Snapshot {
                    chain: self.ledger.chain().to_vec(),
                    balances: self.ledger.balances().clone(),
                    failed: self.is_failed(),
                });
            }
            Command::Shutdown => return true,
        }
        false
    }

    fn start_transfer(&mut self, dest: NodeId, amount: u64) -> Result<(), NodeError> {
        if self.is_failed() {
            return Err(NodeError::NodeFailed);
        }
        let block = self.ledger.create_block(dest, amount).map_err(|e| match e {
            tally_chain::LedgerError::InsufficientFunds { have, need } => {
                NodeError::InsufficientFunds { have, need }
            }
            other => NodeError::Internal(other.to_string()),
        })?;

        info!(
            node = %self.node(),
            %dest,
            amount,
            hash = %block.hash,
            "starting consensus on transfer"
        );
        self.paxos.propose(block, self.ledger.depth());
        self.drain_effects();
        Ok(())
    }

    fn fail(&mut self) {
        info!(node = %self.node(), "simulating crash");
        *self.failed.write() = true;
        self.paxos.cancel_proposal();
        self.drain_effects();
        // Abort any sync in flight.
        self.sync_gen += 1;
        self.syncing = false;
        self.sync_buf.clear();
    }

    fn fix(&mut self) {
        info!(node = %self.node(), "simulating recovery");
        *self.failed.write() = false;

        self.ledger = match Ledger::restore(self.node(), &self.config.state_dir) {
            Ok(ledger) => ledger,
            Err(e) => {
                warn!(node = %self.node(), error = %e, "state file rejected, starting from genesis");
                Ledger::new(self.node())
            }
        };

        // Let the network settle, then solicit chains.
        self.sync_gen += 1;
        self.schedule(
            self.config.timing.sync_settle,
            Tick::SyncBegin(self.sync_gen),
        );
    }

    // ── Timers ──────────────────────────────────────────────────────────

    fn schedule(&self, delay: Duration, tick: Tick) {
        let tx = self.ticks_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(tick).await;
        });
    }

    fn on_tick(&mut self, tick: Tick) {
        match tick {
            Tick::Retry(gen) => {
                if gen != self.retry_gen || self.is_failed() {
                    return;
                }
                self.paxos.on_retry_elapsed();
                self.drain_effects();
            }
            Tick::SyncBegin(gen) => {
                if gen != self.sync_gen || self.is_failed() {
                    return;
                }
                self.syncing = true;
                self.sync_buf.clear();
                info!(node = %self.node(), depth = self.ledger.depth(), "requesting chains from peers");
                self.messenger.broadcast(&Message::RequestBlockchain {
                    sender: self.node(),
                    my_depth: self.ledger.depth(),
                });
                self.schedule(
                    self.config.timing.sync_window,
                    Tick::SyncWindow(gen),
                );
            }
            Tick::SyncWindow(gen) => {
                if gen != self.sync_gen || self.is_failed() {
                    return;
                }
                self.finish_sync();
            }
        }
    }

    // ── Recovery / longest-chain sync ───────────────────────────────────

    fn on_chain_request(&mut self, requester: NodeId, their_depth: u64) {
        debug!(
            node = %self.node(),
            %requester,
            their_depth,
            my_depth = self.ledger.depth(),
            "answering chain request"
        );
        self.messenger.send(
            requester,
            &Message::BlockchainResponse {
                sender: self.node(),
                chain: self.ledger.chain().to_vec(),
                balance_table: self.ledger.balances().clone(),
            },
        );
    }

    fn on_chain_response(&mut self, sender: NodeId, chain: Vec<Block>) {
        if self.syncing {
            self.sync_buf.push((sender, chain));
            return;
        }
        // Opportunistic catch-up outside a sync window.
        self.try_adopt(sender, chain);
    }

    fn finish_sync(&mut self) {
        self.syncing = false;
        let responses = std::mem::take(&mut self.sync_buf);
        if responses.is_empty() {
            info!(node = %self.node(), "no chain responses during sync window");
            return;
        }
        info!(node = %self.node(), count = responses.len(), "processing chain responses");

        let mut best: Option<(NodeId, Vec<Block>, BTreeMap<NodeId, i64>)> = None;
        let mut best_len = self.ledger.depth() as usize;
        for (sender, chain) in responses {
            // Strictly longer than both the local chain and the best so
            // far: ties keep what we already have.
            if chain.len() <= best_len {
                continue;
            }
            match Ledger::validate_candidate(&chain) {
                Ok(balances) => {
                    best_len = chain.len();
                    best = Some((sender, chain, balances));
                }
                Err(e) => {
                    warn!(node = %self.node(), %sender, error = %e, "candidate chain rejected");
                }
            }
        }

        match best {
            Some((sender, chain, balances)) => {
                info!(
                    node = %self.node(),
                    %sender,
                    new_depth = chain.len(),
                    "adopting longest valid chain"
                );
                self.ledger.adopt(chain, balances);
                self.persist();
            }
            None => {
                info!(node = %self.node(), depth = self.ledger.depth(), "already up to date");
            }
        }
    }

    fn try_adopt(&mut self, sender: NodeId, chain: Vec<Block>) {
        if chain.len() as u64 <= self.ledger.depth() {
            debug!(node = %self.node(), %sender, "chain response not longer, keeping ours");
            return;
        }
        match Ledger::validate_candidate(&chain) {
            Ok(balances) => {
                info!(node = %self.node(), %sender, new_depth = chain.len(), "late chain response, adopting");
                self.ledger.adopt(chain, balances);
                self.persist();
            }
            Err(e) => {
                warn!(node = %self.node(), %sender, error = %e, "late chain response rejected");
            }
        }
    }
}

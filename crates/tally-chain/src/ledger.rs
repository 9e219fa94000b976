//! The ledger: committed chain plus derived balance table

use crate::error::{LedgerError, LedgerResult};
use std::collections::BTreeMap;
use tally_types::{Block, NodeId, GENESIS_PARENT};
use tracing::{debug, info};

/// Peer ids funded at genesis.
pub const ROSTER_IDS: [u32; 5] = [1, 2, 3, 4, 5];

/// Starting balance of every roster peer.
pub const INITIAL_BALANCE: i64 = 100;

/// The genesis balance table: roster peers at [`INITIAL_BALANCE`], every
/// other account implicitly 0.
pub fn initial_balances() -> BTreeMap<NodeId, i64> {
    ROSTER_IDS
        .iter()
        .map(|id| (NodeId::new(*id), INITIAL_BALANCE))
        .collect()
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// The block was appended to the chain.
    Appended,
    /// The block was already in the chain; treated as success so that
    /// re-delivered DECIDEs stay idempotent.
    Duplicate,
}

/// A peer's copy of the replicated chain and the balances derived from it.
pub struct Ledger {
    node: NodeId,
    chain: Vec<Block>,
    balances: BTreeMap<NodeId, i64>,
}

impl Ledger {
    /// Fresh ledger at genesis.
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            chain: Vec::new(),
            balances: initial_balances(),
        }
    }

    /// The owning peer.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Number of committed blocks.
    pub fn depth(&self) -> u64 {
        self.chain.len() as u64
    }

    /// Hash of the last committed block, or the genesis parent pointer.
    pub fn tip_hash(&self) -> String {
        self.chain
            .last()
            .map(|b| b.hash.clone())
            .unwrap_or_else(|| GENESIS_PARENT.to_string())
    }

    /// Current balance of a peer (0 if never seen).
    pub fn balance(&self, id: NodeId) -> i64 {
        self.balances.get(&id).copied().unwrap_or(0)
    }

    /// The full balance table.
    pub fn balances(&self) -> &BTreeMap<NodeId, i64> {
        &self.balances
    }

    /// The committed chain.
    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    /// Mine a candidate block transferring `amount` from this peer,
    /// anchored at the current tip.
    pub fn create_block(&self, receiver: NodeId, amount: u64) -> LedgerResult<Block> {
        let have = self.balance(self.node);
        if have < amount as i64 {
            return Err(LedgerError::InsufficientFunds { have, need: amount });
        }
        Ok(Block::mint(self.node, receiver, amount, self.tip_hash()))
    }

    /// Re-anchor a pending transfer on the current tip, re-checking that
    /// the sender can still fund it. The mined nonce is reused; the
    /// proof-of-work digest does not cover the parent pointer.
    pub fn rebase(&self, block: &Block) -> LedgerResult<Block> {
        let have = self.balance(block.sender);
        if have < block.amount as i64 {
            return Err(LedgerError::InsufficientFunds {
                have,
                need: block.amount,
            });
        }
        Ok(block.reanchored(self.tip_hash()))
    }

    /// Validate and append a decided block, updating balances.
    ///
    /// A block whose hash is already in the chain is a successful no-op.
    /// Validation is strict: the parent pointer must equal the current
    /// tip, the stored hash must recompute, the proof-of-work must hold,
    /// and the sender's current balance must cover the amount.
    pub fn commit(&mut self, block: Block) -> LedgerResult<Commit> {
        if self.chain.iter().any(|b| b.hash == block.hash) {
            debug!(node = %self.node, hash = %block.hash, "block already in chain, skipping");
            return Ok(Commit::Duplicate);
        }

        let tip = self.tip_hash();
        if block.prev_hash != tip {
            return Err(LedgerError::BadPrevHash {
                expected: tip,
                got: block.prev_hash,
            });
        }
        if !block.hash_valid() {
            return Err(LedgerError::HashMismatch);
        }
        if !block.pow_valid() {
            return Err(LedgerError::BadProofOfWork);
        }

        let have = self.balance(block.sender);
        if have < block.amount as i64 {
            return Err(LedgerError::InsufficientFunds {
                have,
                need: block.amount,
            });
        }

        *self.balances.entry(block.sender).or_insert(0) -= block.amount as i64;
        *self.balances.entry(block.receiver).or_insert(0) += block.amount as i64;
        info!(
            node = %self.node,
            sender = %block.sender,
            receiver = %block.receiver,
            amount = block.amount,
            height = self.chain.len(),
            "block committed"
        );
        self.chain.push(block);
        Ok(Commit::Appended)
    }

    /// Validate a candidate chain from genesis and return the balance
    /// table it derives.
    ///
    /// Checks parent linkage starting at the genesis pointer, the stored
    /// hash of every block, proof-of-work, and that no sender ever goes
    /// negative starting from a freshly seeded table. Any balance table
    /// carried alongside the candidate is deliberately ignored.
    pub fn validate_candidate(blocks: &[Block]) -> LedgerResult<BTreeMap<NodeId, i64>> {
        let mut balances = initial_balances();
        let mut prev = GENESIS_PARENT.to_string();

        for block in blocks {
            if block.prev_hash != prev {
                return Err(LedgerError::BadPrevHash {
                    expected: prev,
                    got: block.prev_hash.clone(),
                });
            }
            if !block.hash_valid() {
                return Err(LedgerError::HashMismatch);
            }
            if !block.pow_valid() {
                return Err(LedgerError::BadProofOfWork);
            }
            let have = balances.get(&block.sender).copied().unwrap_or(0);
            if have < block.amount as i64 {
                return Err(LedgerError::InsufficientFunds {
                    have,
                    need: block.amount,
                });
            }
            *balances.entry(block.sender).or_insert(0) -= block.amount as i64;
            *balances.entry(block.receiver).or_insert(0) += block.amount as i64;
            prev = block.hash.clone();
        }

        Ok(balances)
    }

    /// Replace chain and balances wholesale with an already-validated
    /// candidate.
    pub fn adopt(&mut self, chain: Vec<Block>, balances: BTreeMap<NodeId, i64>) {
        info!(
            node = %self.node,
            old_depth = self.chain.len(),
            new_depth = chain.len(),
            "adopting chain"
        );
        self.chain = chain;
        self.balances = balances;
    }
}

//! Block type

use crate::peer::NodeId;
use serde::{Deserialize, Serialize};
use tally_crypto::{mine, pow_ok, sha256_hex};

/// Parent pointer of the first block in a chain.
pub const GENESIS_PARENT: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// A single committed (or candidate) money transfer.
///
/// `hash` seals the whole block including `prev_hash`; the proof-of-work
/// digest covers only the transfer fields and the nonce, so a block can be
/// re-anchored onto a new tip without re-mining.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Paying peer
    pub sender: NodeId,
    /// Receiving peer
    pub receiver: NodeId,
    /// Amount transferred
    pub amount: u64,
    /// Mined proof-of-work nonce (8 alphanumeric chars)
    pub nonce: String,
    /// Hash of the preceding block, or [`GENESIS_PARENT`]
    pub prev_hash: String,
    /// SHA-256 over sender, receiver, amount, nonce and prev_hash
    pub hash: String,
}

impl Block {
    /// Mine a fresh block for the given transfer, anchored at `prev_hash`.
    pub fn mint(sender: NodeId, receiver: NodeId, amount: u64, prev_hash: String) -> Self {
        let payload = transfer_payload(sender, receiver, amount);
        let nonce = mine(&payload);
        let hash = sha256_hex(&format!("{}{}{}", payload, nonce, prev_hash));
        Self {
            sender,
            receiver,
            amount,
            nonce,
            prev_hash,
            hash,
        }
    }

    /// The same transfer and nonce, re-anchored at a new parent.
    pub fn reanchored(&self, prev_hash: String) -> Self {
        let payload = transfer_payload(self.sender, self.receiver, self.amount);
        let hash = sha256_hex(&format!("{}{}{}", payload, self.nonce, prev_hash));
        Self {
            sender: self.sender,
            receiver: self.receiver,
            amount: self.amount,
            nonce: self.nonce.clone(),
            prev_hash,
            hash,
        }
    }

    /// Recompute the block hash from the other fields.
    pub fn compute_hash(&self) -> String {
        sha256_hex(&format!(
            "{}{}{}",
            transfer_payload(self.sender, self.receiver, self.amount),
            self.nonce,
            self.prev_hash
        ))
    }

    /// True iff the stored hash matches a recomputation.
    pub fn hash_valid(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// The proof-of-work digest: transfer fields plus nonce, no parent.
    pub fn pow_digest(&self) -> String {
        sha256_hex(&format!(
            "{}{}",
            transfer_payload(self.sender, self.receiver, self.amount),
            self.nonce
        ))
    }

    /// True iff the nonce satisfies the proof-of-work predicate.
    pub fn pow_valid(&self) -> bool {
        pow_ok(&self.pow_digest())
    }
}

fn transfer_payload(sender: NodeId, receiver: NodeId, amount: u64) -> String {
    format!("{}{}{}", sender, receiver, amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(id: u32) -> NodeId {
        NodeId::new(id)
    }

    #[test]
    fn test_mint_is_self_consistent() {
        let block = Block::mint(n(1), n(2), 30, GENESIS_PARENT.to_string());
        assert!(block.hash_valid());
        assert!(block.pow_valid());
        assert_eq!(block.nonce.len(), tally_crypto::NONCE_LEN);
        assert_eq!(block.prev_hash, GENESIS_PARENT);
    }

    #[test]
    fn test_tampered_amount_detected() {
        let mut block = Block::mint(n(1), n(2), 30, GENESIS_PARENT.to_string());
        block.amount = 31;
        assert!(!block.hash_valid());
    }

    #[test]
    fn test_tampered_parent_detected() {
        let mut block = Block::mint(n(1), n(2), 30, GENESIS_PARENT.to_string());
        block.prev_hash = "f".repeat(64);
        assert!(!block.hash_valid());
        // PoW excludes the parent pointer, so it still passes
        assert!(block.pow_valid());
    }

    #[test]
    fn test_reanchor_keeps_nonce_and_pow() {
        let block = Block::mint(n(3), n(4), 15, GENESIS_PARENT.to_string());
        let tip = Block::mint(n(1), n(2), 10, GENESIS_PARENT.to_string());
        let moved = block.reanchored(tip.hash.clone());
        assert_eq!(moved.nonce, block.nonce);
        assert_eq!(moved.prev_hash, tip.hash);
        assert_ne!(moved.hash, block.hash);
        assert!(moved.hash_valid());
        assert!(moved.pow_valid());
    }

    #[test]
    fn test_serde_field_names() {
        let block = Block::mint(n(1), n(2), 30, GENESIS_PARENT.to_string());
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["sender"], "1");
        assert_eq!(json["receiver"], "2");
        assert_eq!(json["amount"], 30);
        assert_eq!(json["prev_hash"], GENESIS_PARENT);
        assert_eq!(json["hash"].as_str().unwrap().len(), 64);

        let back: Block = serde_json::from_value(json).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn test_genesis_parent_shape() {
        assert_eq!(GENESIS_PARENT.len(), 64);
        assert!(GENESIS_PARENT.chars().all(|c| c == '0'));
    }
}

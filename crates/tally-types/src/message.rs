//! Wire message schemas
//!
//! Every TCP connection carries exactly one of these as a UTF-8 JSON
//! object, externally tagged by a `"type"` field.

use crate::{Ballot, Block, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A peer-to-peer message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Paxos phase 1a: solicit promises for a ballot.
    Prepare {
        /// Proposing peer
        sender: NodeId,
        /// Ballot being prepared
        ballot: Ballot,
    },
    /// Paxos phase 1b: promise not to accept lower ballots.
    Promise {
        /// Promising acceptor
        sender: NodeId,
        /// Ballot the promise answers
        ballot: Ballot,
        /// Highest ballot this acceptor has accepted, or the sentinel
        accepted_ballot: Ballot,
        /// Value accepted at `accepted_ballot`, if any
        accepted_val: Option<Block>,
    },
    /// Paxos phase 2a: ask acceptors to accept a value.
    Accept {
        /// Leading proposer
        sender: NodeId,
        /// Ballot of the round
        ballot: Ballot,
        /// Proposed block
        val: Block,
    },
    /// Paxos phase 2b: acknowledge an accepted value.
    Accepted {
        /// Accepting peer
        sender: NodeId,
        /// Ballot that was accepted
        ballot: Ballot,
        /// Accepted block
        val: Block,
    },
    /// Learner broadcast: the slot's value is chosen.
    Decide {
        /// Peer that observed the quorum
        sender: NodeId,
        /// Chosen block
        val: Block,
    },
    /// Recovery: ask peers for their chains.
    RequestBlockchain {
        /// Recovering peer
        sender: NodeId,
        /// Requester's current chain length
        my_depth: u64,
    },
    /// Recovery: a peer's full chain and balance table.
    BlockchainResponse {
        /// Responding peer
        sender: NodeId,
        /// Full chain from genesis
        chain: Vec<Block>,
        /// Responder's balance table (hint only; receivers revalidate)
        balance_table: BTreeMap<NodeId, i64>,
    },
}

impl Message {
    /// The peer that sent this message.
    pub fn sender(&self) -> NodeId {
        match self {
            Message::Prepare { sender, .. }
            | Message::Promise { sender, .. }
            | Message::Accept { sender, .. }
            | Message::Accepted { sender, .. }
            | Message::Decide { sender, .. }
            | Message::RequestBlockchain { sender, .. }
            | Message::BlockchainResponse { sender, .. } => *sender,
        }
    }

    /// Wire tag of this message, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Prepare { .. } => "PREPARE",
            Message::Promise { .. } => "PROMISE",
            Message::Accept { .. } => "ACCEPT",
            Message::Accepted { .. } => "ACCEPTED",
            Message::Decide { .. } => "DECIDE",
            Message::RequestBlockchain { .. } => "REQUEST_BLOCKCHAIN",
            Message::BlockchainResponse { .. } => "BLOCKCHAIN_RESPONSE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GENESIS_PARENT;

    fn n(id: u32) -> NodeId {
        NodeId::new(id)
    }

    #[test]
    fn test_prepare_wire_shape() {
        let msg = Message::Prepare {
            sender: n(1),
            ballot: Ballot::new(1, n(1), 0),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "PREPARE");
        assert_eq!(json["sender"], "1");
        assert_eq!(json["ballot"], serde_json::json!([1, 1, 0]));
    }

    #[test]
    fn test_promise_carries_null_val() {
        let msg = Message::Promise {
            sender: n(2),
            ballot: Ballot::new(1, n(1), 0),
            accepted_ballot: Ballot::NONE,
            accepted_val: None,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "PROMISE");
        assert_eq!(json["accepted_ballot"], serde_json::json!([-1, -1, -1]));
        assert!(json["accepted_val"].is_null());
    }

    #[test]
    fn test_decide_round_trip() {
        let block = Block::mint(n(1), n(2), 30, GENESIS_PARENT.to_string());
        let msg = Message::Decide {
            sender: n(1),
            val: block.clone(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        match back {
            Message::Decide { sender, val } => {
                assert_eq!(sender, n(1));
                assert_eq!(val, block);
            }
            other => panic!("expected DECIDE, got {}", other.kind()),
        }
    }

    #[test]
    fn test_request_blockchain_tag() {
        let msg = Message::RequestBlockchain {
            sender: n(4),
            my_depth: 2,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "REQUEST_BLOCKCHAIN");
        assert_eq!(json["my_depth"], 2);
    }

    #[test]
    fn test_blockchain_response_balance_keys_are_strings() {
        let mut table = BTreeMap::new();
        table.insert(n(1), 70i64);
        table.insert(n(2), 130i64);
        let msg = Message::BlockchainResponse {
            sender: n(3),
            chain: vec![],
            balance_table: table,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "BLOCKCHAIN_RESPONSE");
        assert_eq!(json["balance_table"]["1"], 70);
        assert_eq!(json["balance_table"]["2"], 130);

        let back: Message = serde_json::from_value(json).unwrap();
        assert_eq!(back.sender(), n(3));
    }

    #[test]
    fn test_sender_accessor() {
        let msg = Message::RequestBlockchain {
            sender: n(5),
            my_depth: 0,
        };
        assert_eq!(msg.sender(), n(5));
        assert_eq!(msg.kind(), "REQUEST_BLOCKCHAIN");
    }
}

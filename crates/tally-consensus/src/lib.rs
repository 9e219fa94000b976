//! # tally-consensus
//!
//! Single-decree Paxos for the current chain slot.
//!
//! This crate provides:
//! - `PaxosInstance`: proposer, acceptor and learner logic for one slot
//! - `Effect`: the outbound actions a driver executes on its behalf
//!
//! The state machine performs no IO. Handlers mutate state and queue
//! effects; the node driver drains the queue with [`PaxosInstance::take_effects`]
//! and performs the sends, commits and timer changes, feeding any
//! self-addressed replies straight back into the instance.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod paxos;

pub use paxos::{Effect, PaxosInstance};

//! # tally-types
//!
//! Core types for Tally.
//!
//! This crate provides:
//! - `NodeId`: roster peer identifier
//! - `Block`: a single money transfer, proof-of-work sealed
//! - `Ballot`: Paxos round identifier, totally ordered
//! - `Message`: the wire message schemas

#![warn(missing_docs)]
#![warn(clippy::all)]

mod ballot;
mod block;
mod message;
mod peer;

pub use ballot::Ballot;
pub use block::{Block, GENESIS_PARENT};
pub use message::Message;
pub use peer::NodeId;

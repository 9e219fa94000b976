//! # tally-network
//!
//! Point-to-point messaging for Tally.
//!
//! This crate provides:
//! - `Messenger`: fire-and-forget sends with a simulated one-way delay
//! - The inbound listener loop feeding parsed messages to the node driver
//!
//! Each message travels on a fresh TCP connection carrying exactly one
//! UTF-8 JSON object; the receiver reads until EOF. A peer marked failed
//! drops all outgoing traffic and closes inbound connections unread.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod listener;
mod messenger;

pub use listener::spawn_listener;
pub use messenger::Messenger;

//! # tally-e2e
//!
//! End-to-end testing for Tally.
//!
//! Launches a full in-process roster on loopback ports with
//! millisecond-scale timers and drives it through the same handles the
//! REPL uses. Scenario tests live in `tests/`.
//!
//! ```ignore
//! cargo test -p tally-e2e
//! ```

#![warn(clippy::all)]

mod harness;

pub use harness::{fast_timing, Cluster};

//! # tally-chain
//!
//! Chain store for Tally.
//!
//! This crate provides:
//! - `Ledger`: committed block sequence plus derived balance table
//! - Strict block validation (parent linkage, proof-of-work, funds)
//! - Atomic JSON persistence and tamper-checked restore
//! - Full from-genesis validation of candidate chains for sync

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ledger;
mod store;

pub use error::{LedgerError, LedgerResult};
pub use ledger::{initial_balances, Commit, Ledger, INITIAL_BALANCE, ROSTER_IDS};
pub use store::state_path;

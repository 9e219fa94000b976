//! Chain store error types

use thiserror::Error;

/// Chain store errors
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Sender cannot cover the transfer
    #[error("insufficient funds: balance {have} < amount {need}")]
    InsufficientFunds {
        /// Sender's current balance
        have: i64,
        /// Amount the transfer needs
        need: u64,
    },

    /// Block does not extend the current tip
    #[error("prev_hash mismatch: expected {expected}, got {got}")]
    BadPrevHash {
        /// The current tip hash
        expected: String,
        /// The block's parent pointer
        got: String,
    },

    /// Proof-of-work digest does not end in 0-4
    #[error("invalid proof-of-work")]
    BadProofOfWork,

    /// Stored block hash does not match its contents
    #[error("block hash does not match its contents")]
    HashMismatch,

    /// Persisted state failed validation on load
    #[error("corrupted state: {0}")]
    CorruptedState(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for chain store operations
pub type LedgerResult<T> = Result<T, LedgerError>;

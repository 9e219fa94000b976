//! Node error types

use thiserror::Error;

/// Node errors
#[derive(Debug, Error)]
pub enum NodeError {
    /// Command refused because the peer is simulating a crash
    #[error("node is failed")]
    NodeFailed,

    /// Transfer refused: the local balance cannot cover it
    #[error("insufficient funds: balance {have} < amount {need}")]
    InsufficientFunds {
        /// Current local balance
        have: i64,
        /// Requested amount
        need: u64,
    },

    /// Roster/config problem
    #[error("config error: {0}")]
    Config(String),

    /// The node's driver task is gone
    #[error("node stopped")]
    Stopped,

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for node operations
pub type NodeResult<T> = Result<T, NodeError>;

//! SHA-256 hashing

use sha2::{Digest, Sha256};

/// Compute the lowercase hex SHA-256 digest of a string's UTF-8 bytes.
pub fn sha256_hex(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    hex::encode(hasher.finalize())
}

//! Proof-of-work predicate and nonce mining

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::hash::sha256_hex;

/// Length of a mined nonce.
pub const NONCE_LEN: usize = 8;

/// Check whether a hex digest satisfies the proof-of-work predicate:
/// its final character is one of `0`-`4` (~5/16 acceptance rate).
pub fn pow_ok(digest: &str) -> bool {
    matches!(digest.as_bytes().last(), Some(b'0'..=b'4'))
}

/// Mine a nonce for the given payload prefix.
///
/// Draws uniform 8-character `[A-Za-z0-9]` nonces until
/// `sha256_hex(prefix + nonce)` passes [`pow_ok`]. Expected trials ~3.2.
pub fn mine(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let nonce: String = (&mut rng)
            .sample_iter(Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();
        if pow_ok(&sha256_hex(&format!("{}{}", prefix, nonce))) {
            return nonce;
        }
    }
}

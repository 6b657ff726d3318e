//! Admin password hashing
//!
//! The admin password is never stored; only its hex-encoded SHA-256 digest
//! is configured. Verification hashes the candidate and compares digests.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of `password`
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Check `password` against a configured hex digest (case-insensitive)
pub fn verify_password(password: &str, expected_hash: &str) -> bool {
    let calculated = hash_password(password);
    let expected = expected_hash.trim().to_ascii_lowercase();

    // Constant-time over equal-length digests
    calculated.len() == expected.len()
        && calculated
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

//! Hashing - SHA-256 digests of rendered documents
//!
//! Lets a review pipeline tell whether a template run changed anything
//! without diffing the full text.

use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

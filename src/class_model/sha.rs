//! Content hashing for change detection

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of `content` (64 characters)
pub fn compute_sha256(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

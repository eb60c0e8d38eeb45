//! Hashing used to derive partition keys from feed URLs.

use sha2::{Digest, Sha256};

/// Stable string hashing capability.
pub trait Hasher: Send + Sync {
    /// Hash a string into a stable digest string.
    fn hash_string(&self, text: &str) -> String;
}

/// SHA-256 hasher producing lower-case hex digests.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Hasher;

impl Sha256Hasher {
    /// Create a new hasher.
    pub fn new() -> Self {
        Self
    }
}

impl Hasher for Sha256Hasher {
    fn hash_string(&self, text: &str) -> String {
        let digest = Sha256::digest(text.as_bytes());
        format!("{digest:x}")
    }
}

/// Derive the partition key for a feed URL.
///
/// The same URL always yields the same key, across restarts.
pub fn partition_key(hasher: &dyn Hasher, feed_url: &str) -> String {
    hasher.hash_string(feed_url)
}

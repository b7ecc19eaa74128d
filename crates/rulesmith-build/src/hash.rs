//! Content hashing for change detection.

use sha2::{Digest, Sha256};

/// Algorithm prefix of every stored hash.
pub const HASH_PREFIX: &str = "sha256:";

/// `sha256:<hex>` of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{HASH_PREFIX}{:x}", hasher.finalize())
}

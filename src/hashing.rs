use sha2::{Digest, Sha256};

/// Computes the SHA-256 fingerprint of `content` as lowercase hex.
///
/// A missing file is fingerprinted as the empty slice.
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

//! Value digests for the exact-match index family.
//!
//! Hash buckets are keyed by a SHA-256 digest of the normalized value rather
//! than the value itself. That bounds key length and keeps raw values (emails,
//! phone numbers) out of the index files; the first four hex characters give
//! the two nested bucket directories.

use sha2::{Digest, Sha256};

/// Lowercase-hex SHA-256 of a value. Deterministic and fixed-length (64
/// chars), so the leading characters partition evenly across buckets.
pub fn value_digest(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    format!("{:x}", hasher.finalize())
}

//! Shared SHA-256 hex digest utility.
//!
//! Used by `reset_token` to store verifier digests instead of raw secrets.

use sha2::{Digest, Sha256};

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Compare two strings in constant time with respect to their contents.
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    constant_time_eq::constant_time_eq(a.as_bytes(), b.as_bytes())
}

//! Selector/verifier password-reset tokens.
//!
//! The selector (public, indexed) identifies the row; the verifier is only
//! ever sent to the user and stored as a SHA-256 digest, so a read of the
//! `password_resets` table cannot be replayed as a reset link.

use validator::ValidateEmail;

use crate::hashing::{constant_time_str_eq, sha256_hex};
use crate::tokens::{b64url_decode, b64url_encode, random_bytes, random_hex};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Random bytes in a selector (rendered as 16 hex characters).
pub const SELECTOR_BYTES: usize = 8;

/// Random bytes in a verifier (rendered as base64url).
pub const VERIFIER_BYTES: usize = 32;

/// Lifetime of a reset link.
pub const TOKEN_TTL_MINUTES: i64 = 15;

/// Maximum reset requests per email inside [`RATE_LIMIT_WINDOW_MINUTES`].
pub const RATE_LIMIT_MAX_REQUESTS: i64 = 5;

/// Rolling window used for the per-email rate limit.
pub const RATE_LIMIT_WINDOW_MINUTES: i64 = 60;

// ---------------------------------------------------------------------------
// Generation / verification
// ---------------------------------------------------------------------------

/// A freshly generated reset token.
pub struct GeneratedResetToken {
    /// Row identifier, stored in clear and sent in the link.
    pub selector: String,
    /// Secret half, sent in the link only. Never stored.
    pub verifier: String,
    /// SHA-256 hex digest of the raw verifier bytes (stored).
    pub verifier_hash: String,
}

/// Generate a new selector/verifier pair.
pub fn generate() -> GeneratedResetToken {
    let raw_verifier = random_bytes(VERIFIER_BYTES);
    GeneratedResetToken {
        selector: random_hex(SELECTOR_BYTES),
        verifier: b64url_encode(&raw_verifier),
        verifier_hash: sha256_hex(&raw_verifier),
    }
}

/// Decode a verifier from a link. Returns `None` when it is not base64url.
pub fn decode_verifier(token: &str) -> Option<Vec<u8>> {
    b64url_decode(token.trim()).filter(|bytes| !bytes.is_empty())
}

/// Check a decoded verifier against the stored digest in constant time.
pub fn verify(raw_verifier: &[u8], stored_hash: &str) -> bool {
    constant_time_str_eq(&sha256_hex(raw_verifier), stored_hash)
}

/// Whether another request for the same email should be refused.
pub fn is_rate_limited(recent_requests: i64) -> bool {
    recent_requests >= RATE_LIMIT_MAX_REQUESTS
}

// ---------------------------------------------------------------------------
// Email helpers
// ---------------------------------------------------------------------------

/// Trim and lowercase an email address for lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Syntactic email check.
pub fn is_valid_email(email: &str) -> bool {
    email.to_string().validate_email()
}

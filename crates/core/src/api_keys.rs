//! Application API key generation and hashing.
//!
//! Keys are random alphanumeric strings. Only the SHA-256 hash is stored,
//! so lookup is a single indexed equality match on `api_key_hash`; the
//! plaintext is shown to the operator exactly once, at creation or rotation.

use chrono::Duration;

use crate::hashing::{random_alphanumeric, sha256_hex};
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Length of the generated API key string (alphanumeric characters).
pub const KEY_LENGTH: usize = 48;

/// Number of leading characters stored as a human-visible prefix.
pub const KEY_PREFIX_LENGTH: usize = 8;

/// Default key lifetime: ten years.
pub const DEFAULT_KEY_TTL_DAYS: i64 = 365 * 10;

/// What listings show instead of the key.
pub const MASKED_KEY: &str = "•••••••• (Hidden for security)";

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// The result of generating a new API key.
pub struct GeneratedApiKey {
    /// The plaintext key (shown to the operator exactly once, never stored).
    pub plaintext: String,
    /// The first [`KEY_PREFIX_LENGTH`] characters of the key for display.
    pub prefix: String,
    /// The SHA-256 hex digest of the plaintext key (stored in the database).
    pub hash: String,
}

/// Generate a new random API key.
pub fn generate_api_key() -> GeneratedApiKey {
    let key = random_alphanumeric(KEY_LENGTH);
    let prefix = extract_prefix(&key).to_string();
    let hash = hash_api_key(&key);

    GeneratedApiKey {
        plaintext: key,
        prefix,
        hash,
    }
}

/// Compute the SHA-256 hex digest of an API key.
pub fn hash_api_key(key: &str) -> String {
    sha256_hex(key.as_bytes())
}

/// Extract the prefix from a plaintext API key.
pub fn extract_prefix(key: &str) -> &str {
    let end = key
        .char_indices()
        .nth(KEY_PREFIX_LENGTH)
        .map_or(key.len(), |(i, _)| i);
    &key[..end]
}

/// Display string used in place of a key in listings.
pub fn mask_key() -> &'static str {
    MASKED_KEY
}

/// Expiry of a key issued at `issued_at` with a lifetime of `ttl_days`.
///
/// Saturates at the latest representable instant instead of overflowing.
pub fn key_expiry(issued_at: Timestamp, ttl_days: i64) -> Timestamp {
    Duration::try_days(ttl_days)
        .and_then(|ttl| issued_at.checked_add_signed(ttl))
        .unwrap_or(Timestamp::MAX_UTC)
}

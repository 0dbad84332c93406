//! Session token generation and hashing.
//!
//! Tokens are opaque random strings handed to the client once. Only their
//! SHA-256 digest is stored, so a leaked `user_sessions` table cannot be
//! replayed.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Prefix that marks a string as a session token.
pub const SESSION_TOKEN_PREFIX: &str = "sess_";

/// Number of random alphanumeric characters after the prefix.
pub const TOKEN_LENGTH: usize = 48;

/// Default session lifetime.
pub const DEFAULT_SESSION_TTL_MINS: i64 = 120;

/// A freshly generated session token.
pub struct GeneratedSessionToken {
    /// Returned to the client, never stored.
    pub plaintext: String,
    /// SHA-256 hex digest of `plaintext`, stored in `user_sessions.token_hash`.
    pub hash: String,
}

pub fn generate_session_token() -> GeneratedSessionToken {
    let random: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect();
    let plaintext = format!("{SESSION_TOKEN_PREFIX}{random}");
    let hash = hash_session_token(&plaintext);
    GeneratedSessionToken { plaintext, hash }
}

/// SHA-256 hex digest of a token, used for storage and lookup.
pub fn hash_session_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{digest:x}")
}

/// Cheap shape check before touching the database.
pub fn looks_like_session_token(token: &str) -> bool {
    token
        .strip_prefix(SESSION_TOKEN_PREFIX)
        .is_some_and(|rest| rest.len() == TOKEN_LENGTH && rest.chars().all(|c| c.is_ascii_alphanumeric()))
}

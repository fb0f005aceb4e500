//! User token material and `Authorization` header parsing.
//!
//! User tokens are opaque random strings issued at login. As with API keys,
//! only the SHA-256 hash is stored, together with a short prefix that makes
//! tokens identifiable in logs.
//!
//! Three header parsers exist because three callers disagree on strictness:
//! the validate endpoint demands exactly `Token <t>`, the permission check
//! takes the last word of whatever it gets, and resource services accept a
//! case-insensitive `token` scheme and otherwise treat the request as
//! unauthenticated.

use chrono::Duration;

use crate::error::CoreError;
use crate::hashing::{random_alphanumeric, sha256_hex};
use crate::types::Timestamp;

/// Length of a generated user token.
pub const TOKEN_LENGTH: usize = 48;

/// Number of leading characters kept as the token key.
pub const TOKEN_PREFIX_LENGTH: usize = 8;

/// Default token lifetime in hours.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 10;

/// The scheme every client uses: `Authorization: Token <t>`.
pub const TOKEN_SCHEME: &str = "Token";

/// A freshly issued token.
pub struct GeneratedToken {
    pub plaintext: String,
    pub prefix: String,
    pub hash: String,
}

/// Generate a new user token.
pub fn generate_token() -> GeneratedToken {
    let plaintext = random_alphanumeric(TOKEN_LENGTH);
    let prefix = plaintext[..TOKEN_PREFIX_LENGTH].to_string();
    let hash = hash_token(&plaintext);
    GeneratedToken {
        plaintext,
        prefix,
        hash,
    }
}

/// Compute the SHA-256 hex digest of a token.
pub fn hash_token(token: &str) -> String {
    sha256_hex(token.as_bytes())
}

/// Expiry of a token issued at `issued_at`.
pub fn token_expiry(issued_at: Timestamp, ttl_hours: i64) -> Timestamp {
    Duration::try_hours(ttl_hours)
        .and_then(|ttl| issued_at.checked_add_signed(ttl))
        .unwrap_or(Timestamp::MAX_UTC)
}

/// Strict parser used by the token validation endpoint.
///
/// The header must be exactly two space-separated parts with the scheme
/// `Token`.
pub fn parse_token_header(header: &str) -> Result<&str, CoreError> {
    let mut parts = header.split(' ');
    let (Some(scheme), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(CoreError::Unauthorized(
            "Invalid authorization header format".into(),
        ));
    };
    if scheme != TOKEN_SCHEME {
        return Err(CoreError::Unauthorized("Invalid authorization type".into()));
    }
    Ok(token)
}

/// Lenient parser used by the permission check: the token is the last
/// space-separated word, so both `Token <t>` and a bare `<t>` work.
pub fn last_word_token(header: &str) -> Option<&str> {
    header.split(' ').next_back().filter(|t| !t.is_empty())
}

/// Parser used by resource services.
///
/// Returns `None` unless the header is `<scheme> <token>` with a
/// case-insensitive `token` scheme.
pub fn extract_user_token(header: &str) -> Option<&str> {
    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case(TOKEN_SCHEME) => {
            Some(token)
        }
        _ => None,
    }
}

/// Render the header value for a token.
pub fn authorization_value(token: &str) -> String {
    format!("{TOKEN_SCHEME} {token}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn generated_token_shape() {
        let t = generate_token();
        assert_eq!(t.plaintext.len(), TOKEN_LENGTH);
        assert!(t.plaintext.starts_with(&t.prefix));
        assert_eq!(t.hash, hash_token(&t.plaintext));
    }

    #[test]
    fn token_expiry_never_overflows() {
        let now = chrono::Utc::now();
        assert_eq!((token_expiry(now, 10) - now).num_hours(), 10);
        assert_eq!(token_expiry(now, i64::MAX), Timestamp::MAX_UTC);
    }

    #[test]
    fn strict_parser() {
        assert_eq!(parse_token_header("Token abc").unwrap(), "abc");
        assert_matches!(
            parse_token_header("Bearer abc"),
            Err(CoreError::Unauthorized(m)) if m == "Invalid authorization type"
        );
        assert_matches!(
            parse_token_header("abc"),
            Err(CoreError::Unauthorized(m)) if m == "Invalid authorization header format"
        );
        assert_matches!(
            parse_token_header("Token a b"),
            Err(CoreError::Unauthorized(m)) if m == "Invalid authorization header format"
        );
    }

    #[test]
    fn lenient_parser_takes_last_word() {
        assert_eq!(last_word_token("Token abc"), Some("abc"));
        assert_eq!(last_word_token("abc"), Some("abc"));
        assert_eq!(last_word_token("Token "), None);
    }

    #[test]
    fn resource_service_parser() {
        assert_eq!(extract_user_token("token abc"), Some("abc"));
        assert_eq!(extract_user_token("TOKEN   abc"), Some("abc"));
        assert_eq!(extract_user_token("Bearer abc"), None);
        assert_eq!(extract_user_token("abc"), None);
        assert_eq!(extract_user_token(""), None);
    }

    #[test]
    fn expiry_uses_hours() {
        let now = chrono::Utc::now();
        assert_eq!((token_expiry(now, 10) - now).num_hours(), 10);
    }
}

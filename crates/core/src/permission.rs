//! Permission levels and the HTTP-method mapping.
//!
//! Grants are stored as lists of levels (`["read", "write"]`). The effective
//! permission of a grant is its highest level, and a request is allowed when
//! that level is at least the level its HTTP method requires.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Default method assumed when a caller does not send `X-METHOD`.
pub const DEFAULT_METHOD: &str = "GET";

/// An access level. Ordering follows the hierarchy `Read < Write < Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    Read,
    Write,
    Admin,
}

impl PermissionLevel {
    pub const ALL: [PermissionLevel; 3] = [
        PermissionLevel::Read,
        PermissionLevel::Write,
        PermissionLevel::Admin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PermissionLevel::Read => "read",
            PermissionLevel::Write => "write",
            PermissionLevel::Admin => "admin",
        }
    }

    /// Whether holding `self` is enough for an operation needing `required`.
    pub fn satisfies(self, required: PermissionLevel) -> bool {
        self >= required
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" => Ok(PermissionLevel::Read),
            "write" => Ok(PermissionLevel::Write),
            "admin" => Ok(PermissionLevel::Admin),
            other => Err(CoreError::Validation(format!(
                "Unknown permission level '{other}'. Expected one of: read, write, admin"
            ))),
        }
    }
}

/// Parse a list of stored level strings, rejecting unknown values.
pub fn parse_levels<S: AsRef<str>>(raw: &[S]) -> Result<Vec<PermissionLevel>, CoreError> {
    raw.iter().map(|s| s.as_ref().parse()).collect()
}

/// Render levels back into their stored string form.
pub fn level_names(levels: &[PermissionLevel]) -> Vec<String> {
    levels.iter().map(|l| l.as_str().to_string()).collect()
}

/// Normalise a raw method header: trim, upper-case, default to `GET`.
pub fn normalize_method(method: Option<&str>) -> String {
    match method.map(str::trim) {
        Some(m) if !m.is_empty() => m.to_ascii_uppercase(),
        _ => DEFAULT_METHOD.to_string(),
    }
}

/// The level an HTTP method requires.
///
/// Unknown methods (HEAD, OPTIONS, anything custom) only need `read`.
pub fn required_level(method: &str) -> PermissionLevel {
    match method.trim().to_ascii_uppercase().as_str() {
        "POST" | "PUT" | "PATCH" => PermissionLevel::Write,
        "DELETE" => PermissionLevel::Admin,
        _ => PermissionLevel::Read,
    }
}

/// The highest level in a grant, or `None` for an empty grant.
pub fn highest(levels: &[PermissionLevel]) -> Option<PermissionLevel> {
    levels.iter().copied().max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn hierarchy_is_ordered() {
        assert!(PermissionLevel::Read < PermissionLevel::Write);
        assert!(PermissionLevel::Write < PermissionLevel::Admin);
        assert!(PermissionLevel::Admin.satisfies(PermissionLevel::Read));
        assert!(!PermissionLevel::Read.satisfies(PermissionLevel::Write));
        assert!(PermissionLevel::Write.satisfies(PermissionLevel::Write));
    }

    #[test]
    fn method_mapping() {
        assert_eq!(required_level("GET"), PermissionLevel::Read);
        assert_eq!(required_level("post"), PermissionLevel::Write);
        assert_eq!(required_level("PUT"), PermissionLevel::Write);
        assert_eq!(required_level("Patch"), PermissionLevel::Write);
        assert_eq!(required_level("DELETE"), PermissionLevel::Admin);
        assert_eq!(required_level("OPTIONS"), PermissionLevel::Read);
        assert_eq!(required_level("BREW"), PermissionLevel::Read);
    }

    #[test]
    fn normalize_defaults_to_get() {
        assert_eq!(normalize_method(None), "GET");
        assert_eq!(normalize_method(Some("  ")), "GET");
        assert_eq!(normalize_method(Some(" delete ")), "DELETE");
    }

    #[test]
    fn highest_of_grant() {
        assert_eq!(highest(&[]), None);
        assert_eq!(
            highest(&[PermissionLevel::Write, PermissionLevel::Read]),
            Some(PermissionLevel::Write)
        );
        assert_eq!(
            highest(&[PermissionLevel::Read, PermissionLevel::Admin, PermissionLevel::Write]),
            Some(PermissionLevel::Admin)
        );
    }

    #[test]
    fn parse_is_case_insensitive_and_strict() {
        assert_eq!(
            parse_levels(&["READ", "write"]).unwrap(),
            vec![PermissionLevel::Read, PermissionLevel::Write]
        );
        assert_matches!(parse_levels(&["read", "owner"]), Err(CoreError::Validation(_)));
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&PermissionLevel::Admin).unwrap();
        assert_eq!(json, "\"admin\"");
        let back: PermissionLevel = serde_json::from_str("\"write\"").unwrap();
        assert_eq!(back, PermissionLevel::Write);
    }
}

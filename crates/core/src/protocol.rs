//! Wire types of the permission check protocol.
//!
//! The auth service serializes these and resource services (through
//! `civic-guard`) deserialize them, so both sides share one definition.

use serde::{Deserialize, Serialize};

use crate::permission::PermissionLevel;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Header names
// ---------------------------------------------------------------------------

pub const HEADER_API_KEY: &str = "x-api-key";
pub const HEADER_AUTHORIZATION: &str = "authorization";
pub const HEADER_RESOURCE: &str = "x-resource";
pub const HEADER_SUB_RESOURCE: &str = "x-sub-resource";
pub const HEADER_METHOD: &str = "x-method";

pub const STATUS_AUTHORISED: &str = "authorised";
pub const STATUS_VALID: &str = "valid";

pub const ANONYMOUS_READ_MESSAGE: &str = "Anonymous read access granted";

// ---------------------------------------------------------------------------
// Permission check responses
// ---------------------------------------------------------------------------

/// Successful application permission check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationAuthorization {
    pub status: String,
    /// Application name.
    pub application: String,
    pub resource: String,
    /// Highest level the application holds on the resource.
    pub permission: PermissionLevel,
}

/// Identity of an authenticated user inside a permission check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: DbId,
    pub email: String,
}

/// Successful user permission check, either through a token or anonymously.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserAuthorization {
    Authenticated {
        status: String,
        user: AuthenticatedUser,
        permission: PermissionLevel,
        user_types: Vec<String>,
    },
    Anonymous {
        status: String,
        anonymous: bool,
        permission: PermissionLevel,
        message: String,
    },
}

impl UserAuthorization {
    pub fn authenticated(
        user: AuthenticatedUser,
        permission: PermissionLevel,
        user_types: Vec<String>,
    ) -> Self {
        UserAuthorization::Authenticated {
            status: STATUS_AUTHORISED.to_string(),
            user,
            permission,
            user_types,
        }
    }

    pub fn anonymous_read() -> Self {
        UserAuthorization::Anonymous {
            status: STATUS_AUTHORISED.to_string(),
            anonymous: true,
            permission: PermissionLevel::Read,
            message: ANONYMOUS_READ_MESSAGE.to_string(),
        }
    }

    pub fn status(&self) -> &str {
        match self {
            UserAuthorization::Authenticated { status, .. }
            | UserAuthorization::Anonymous { status, .. } => status,
        }
    }

    pub fn permission(&self) -> PermissionLevel {
        match self {
            UserAuthorization::Authenticated { permission, .. }
            | UserAuthorization::Anonymous { permission, .. } => *permission,
        }
    }

    /// The authenticated user, or `None` for anonymous access.
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            UserAuthorization::Authenticated { user, .. } => Some(user),
            UserAuthorization::Anonymous { .. } => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, UserAuthorization::Anonymous { .. })
    }
}

// ---------------------------------------------------------------------------
// Validation responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationInfo {
    pub id: DbId,
    pub name: String,
}

/// Response of `POST /api/auth/application/validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedApplication {
    pub status: String,
    pub application: ApplicationInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUserInfo {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub user_types: Vec<String>,
}

/// Response of `POST /api/auth/user/validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedToken {
    pub status: String,
    pub user: TokenUserInfo,
    pub token_expiry: Option<Timestamp>,
}

/// JSON error body used by every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_shape() {
        let json = serde_json::to_value(UserAuthorization::anonymous_read()).unwrap();
        assert_eq!(json["status"], "authorised");
        assert_eq!(json["anonymous"], true);
        assert_eq!(json["permission"], "read");
        assert_eq!(json["message"], "Anonymous read access granted");
        assert!(json.get("user").is_none());
    }

    #[test]
    fn untagged_round_trip_picks_the_right_variant() {
        let body = serde_json::json!({
            "status": "authorised",
            "user": { "id": 7, "email": "a@b.org" },
            "permission": "write",
            "user_types": ["resident"],
        });
        let parsed: UserAuthorization = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.user().map(|u| u.id), Some(7));
        assert_eq!(parsed.permission(), PermissionLevel::Write);

        let anon: UserAuthorization =
            serde_json::from_value(serde_json::to_value(UserAuthorization::anonymous_read()).unwrap())
                .unwrap();
        assert!(anon.is_anonymous());
    }

    #[test]
    fn error_body_without_code() {
        let parsed: ErrorBody = serde_json::from_str(r#"{"error":"nope"}"#).unwrap();
        assert_eq!(parsed.error, "nope");
        assert!(parsed.code.is_none());
    }
}

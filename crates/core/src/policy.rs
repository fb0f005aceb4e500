//! The permission resolution policy.
//!
//! Two checks exist. The application check answers "may this API key touch
//! this resource with this method", using one grant row per
//! `(application, resource)`. The user check answers the same for a user
//! token and a `(resource, sub-resource)` pair, merging the grants of every
//! user type the user holds. Sub-resources flagged `allow_anonymous` can be
//! read without any credentials.
//!
//! The checks are split into stages so callers can fetch data lazily: the
//! token is only looked up once the anonymous carve-out has been ruled out.
//! Every stage is a pure function over already-fetched data.

use crate::error::CoreError;
use crate::permission::{highest, required_level, PermissionLevel};
use crate::protocol::{ApplicationAuthorization, AuthenticatedUser, UserAuthorization, STATUS_AUTHORISED};
use crate::types::Timestamp;

pub const MSG_MISSING_API_KEY: &str = "Missing API key";
pub const MSG_INVALID_API_KEY: &str = "Invalid API Key";
pub const MSG_EXPIRED_API_KEY: &str = "API Key has expired";
pub const MSG_RESOURCE_PERMISSION_NOT_FOUND: &str =
    "Permission denied, resource permission not found";
pub const MSG_INSUFFICIENT_PERMISSIONS: &str = "Permission denied, insufficient permissions";

pub const MSG_TARGET_REQUIRED: &str = "x-resource and x-sub-resource headers are required";
pub const MSG_ANONYMOUS_GET_ONLY: &str = "Anonymous access only allows GET requests";
pub const MSG_AUTHENTICATION_REQUIRED: &str = "Authentication required for this resource";
pub const MSG_INVALID_TOKEN: &str = "Invalid authentication token";
pub const MSG_NO_USER_TYPES: &str = "User has no assigned types";
pub const MSG_NO_TYPE_PERMISSIONS: &str = "No permissions found for user types";
pub const MSG_NO_VALID_PERMISSIONS: &str = "No valid permissions found";

// ---------------------------------------------------------------------------
// Application check
// ---------------------------------------------------------------------------

/// The facts about an application that the policy looks at.
#[derive(Debug, Clone, Copy)]
pub struct ApplicationStanding<'a> {
    pub name: &'a str,
    pub is_active: bool,
    pub api_key_expires_at: Timestamp,
}

/// Stage 1: an API key must be present and non-empty.
pub fn require_api_key(raw: Option<&str>) -> Result<&str, CoreError> {
    match raw.map(str::trim) {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(CoreError::Validation(MSG_MISSING_API_KEY.into())),
    }
}

/// Stage 2: the key must belong to an active application whose key has not
/// expired.
pub fn check_application_standing<'a>(
    application: Option<ApplicationStanding<'a>>,
    now: Timestamp,
) -> Result<ApplicationStanding<'a>, CoreError> {
    let app = application
        .filter(|a| a.is_active)
        .ok_or_else(|| CoreError::Forbidden(MSG_INVALID_API_KEY.into()))?;

    if app.api_key_expires_at < now {
        return Err(CoreError::Forbidden(MSG_EXPIRED_API_KEY.into()));
    }
    Ok(app)
}

/// Stage 3: the application's grant on the resource must cover the method.
///
/// `grant` is `None` when no grant row exists for `(application, resource)`.
pub fn evaluate_application_grant(
    application_name: &str,
    resource: &str,
    method: &str,
    grant: Option<&[PermissionLevel]>,
) -> Result<ApplicationAuthorization, CoreError> {
    let held = grant
        .and_then(highest)
        .ok_or_else(|| CoreError::Forbidden(MSG_RESOURCE_PERMISSION_NOT_FOUND.into()))?;

    if !held.satisfies(required_level(method)) {
        return Err(CoreError::Forbidden(MSG_INSUFFICIENT_PERMISSIONS.into()));
    }

    Ok(ApplicationAuthorization {
        status: STATUS_AUTHORISED.to_string(),
        application: application_name.to_string(),
        resource: resource.to_string(),
        permission: held,
    })
}

// ---------------------------------------------------------------------------
// User check
// ---------------------------------------------------------------------------

/// Stage 1: both the resource and the sub-resource must be named.
pub fn require_target<'a>(
    resource: Option<&'a str>,
    sub_resource: Option<&'a str>,
) -> Result<(&'a str, &'a str), CoreError> {
    let resource = resource.map(str::trim).filter(|s| !s.is_empty());
    let sub_resource = sub_resource.map(str::trim).filter(|s| !s.is_empty());
    match (resource, sub_resource) {
        (Some(r), Some(s)) => Ok((r, s)),
        _ => Err(CoreError::Validation(MSG_TARGET_REQUIRED.into())),
    }
}

/// Stage 2: the anonymous carve-out.
///
/// Returns `Some(decision)` when the carve-out settles the request and `None`
/// when the caller must continue with token authentication. A `GET` on an
/// anonymous sub-resource is always granted read access. Any other method is
/// refused unless the caller brought credentials, in which case the regular
/// grants decide.
pub fn anonymous_decision(
    allow_anonymous: bool,
    method: &str,
    has_credentials: bool,
) -> Option<Result<UserAuthorization, CoreError>> {
    if !allow_anonymous {
        return None;
    }
    if method.eq_ignore_ascii_case("GET") {
        return Some(Ok(UserAuthorization::anonymous_read()));
    }
    if has_credentials {
        return None;
    }
    Some(Err(CoreError::Forbidden(MSG_ANONYMOUS_GET_ONLY.into())))
}

/// Stage 3: an `Authorization` header must be present.
pub fn require_credentials(authorization: Option<&str>) -> Result<&str, CoreError> {
    match authorization.map(str::trim) {
        Some(h) if !h.is_empty() => Ok(h),
        _ => Err(CoreError::Unauthorized(MSG_AUTHENTICATION_REQUIRED.into())),
    }
}

/// The error for any token that is malformed, unknown, expired or belongs to
/// an inactive user.
pub fn invalid_token() -> CoreError {
    CoreError::Unauthorized(MSG_INVALID_TOKEN.into())
}

/// Stage 4: merge the grants of every user type and compare with the method.
///
/// `type_names` are the user's types; `grants` holds the level list of every
/// grant row matching one of those types on the requested sub-resource.
pub fn evaluate_user_grants(
    user: AuthenticatedUser,
    type_names: Vec<String>,
    grants: &[Vec<PermissionLevel>],
    method: &str,
) -> Result<UserAuthorization, CoreError> {
    if type_names.is_empty() {
        return Err(CoreError::Forbidden(MSG_NO_USER_TYPES.into()));
    }
    if grants.is_empty() {
        return Err(CoreError::Forbidden(MSG_NO_TYPE_PERMISSIONS.into()));
    }

    let merged: Vec<PermissionLevel> = grants.iter().flatten().copied().collect();
    let held = highest(&merged)
        .ok_or_else(|| CoreError::Forbidden(MSG_NO_VALID_PERMISSIONS.into()))?;

    let required = required_level(method);
    if !held.satisfies(required) {
        return Err(CoreError::Forbidden(format!(
            "Requires {required} permission but only has {held}"
        )));
    }

    Ok(UserAuthorization::authenticated(user, held, type_names))
}

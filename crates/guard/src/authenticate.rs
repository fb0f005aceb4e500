//! Merging the application and user checks into one decision.

use axum::http::HeaderMap;
use civic_core::protocol::{
    ApplicationAuthorization, AuthenticatedUser, UserAuthorization, HEADER_API_KEY,
    HEADER_AUTHORIZATION, STATUS_AUTHORISED,
};
use civic_core::tokens::extract_user_token;

use crate::checker::{PermissionChecker, UserPermissionRequest};
use crate::error::GuardError;

pub const MSG_AUTHENTICATION_FAILED: &str = "Authentication failed";
pub const MSG_USER_REQUIRED: &str = "User authentication required";

/// What the caller presented.
#[derive(Debug, Clone, Copy, Default)]
pub struct Credentials<'a> {
    pub api_key: Option<&'a str>,
    /// Plaintext token from `Authorization: Token <t>`.
    pub user_token: Option<&'a str>,
}

impl<'a> Credentials<'a> {
    /// Read `X-API-KEY` and a `Token` authorization header. Empty values
    /// count as absent, and other schemes are ignored.
    pub fn from_headers(headers: &'a HeaderMap) -> Self {
        let text = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };
        Self {
            api_key: text(HEADER_API_KEY),
            user_token: text(HEADER_AUTHORIZATION).and_then(extract_user_token),
        }
    }
}

/// What the caller wants to do.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub resource: &'a str,
    pub sub_resource: &'a str,
    /// Upper-case HTTP method.
    pub method: &'a str,
}

/// The merged outcome. At least one side is `Some`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub app: Option<ApplicationAuthorization>,
    pub user: Option<UserAuthorization>,
}

/// Run the application and user checks and merge them.
///
/// 1. With an API key, the application check runs. A failure is final only
///    when no user token was presented.
/// 2. With a user token, the user check runs. A failure is final only when
///    the application check did not succeed.
/// 3. When neither succeeded the request is refused.
pub async fn authenticate_request(
    checker: &dyn PermissionChecker,
    credentials: Credentials<'_>,
    target: Target<'_>,
) -> Result<AuthContext, GuardError> {
    let mut ctx = AuthContext::default();

    if let Some(api_key) = credentials.api_key.filter(|_| !target.resource.is_empty()) {
        match checker
            .check_application(api_key, target.resource, target.method)
            .await
        {
            Ok(app) => ctx.app = Some(app),
            Err(e) if credentials.user_token.is_none() => return Err(e),
            Err(e) => {
                tracing::debug!(reason = %e.message(), "Application check failed, trying user token");
            }
        }
    }

    if let Some(token) = credentials
        .user_token
        .filter(|_| !target.resource.is_empty() && !target.sub_resource.is_empty())
    {
        let request = UserPermissionRequest {
            token,
            api_key: credentials.api_key,
            resource: target.resource,
            sub_resource: target.sub_resource,
            method: target.method,
        };
        match checker.check_user(request).await {
            Ok(user) => ctx.user = Some(user),
            Err(e) if ctx.app.is_none() => return Err(e),
            Err(e) => {
                tracing::debug!(reason = %e.message(), "User check failed, application check stands");
            }
        }
    }

    if ctx.app.is_none() && ctx.user.is_none() {
        return Err(GuardError::Unauthorized(MSG_AUTHENTICATION_FAILED.into()));
    }
    Ok(ctx)
}

/// The authenticated user behind `ctx`, refusing anonymous or application-only
/// access.
pub fn require_user(ctx: &AuthContext) -> Result<&AuthenticatedUser, GuardError> {
    ctx.user
        .as_ref()
        .filter(|u| u.status() == STATUS_AUTHORISED)
        .and_then(UserAuthorization::user)
        .filter(|u| u.id != 0)
        .ok_or_else(|| GuardError::Unauthorized(MSG_USER_REQUIRED.into()))
}

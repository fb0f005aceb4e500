//! Axum integration: a `from_fn_with_state` middleware that guards a route
//! group for one `(resource, sub-resource)` pair, and an extractor for the
//! authenticated user.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use civic_core::permission::normalize_method;
use civic_core::protocol::AuthenticatedUser;

use crate::authenticate::{authenticate_request, require_user, AuthContext, Credentials, Target};
use crate::checker::PermissionChecker;
use crate::error::GuardError;

/// State for [`guard`]: the checker plus the pair the routes belong to.
#[derive(Clone)]
pub struct GuardState {
    checker: Arc<dyn PermissionChecker>,
    resource: Arc<str>,
    sub_resource: Arc<str>,
}

impl GuardState {
    pub fn new(checker: Arc<dyn PermissionChecker>, resource: &str, sub_resource: &str) -> Self {
        Self {
            checker,
            resource: resource.into(),
            sub_resource: sub_resource.into(),
        }
    }
}

/// Authenticate the request and store the [`AuthContext`] in its extensions.
///
/// The required level follows the request's own method.
pub async fn guard(
    State(guard): State<GuardState>,
    mut request: Request,
    next: Next,
) -> Result<Response, GuardError> {
    let method = normalize_method(Some(request.method().as_str()));
    let ctx = authenticate_request(
        guard.checker.as_ref(),
        Credentials::from_headers(request.headers()),
        Target {
            resource: &guard.resource,
            sub_resource: &guard.sub_resource,
            method: &method,
        },
    )
    .await?;

    tracing::debug!(
        resource = %guard.resource,
        sub_resource = %guard.sub_resource,
        method = %method,
        application = ctx.app.as_ref().map(|a| a.application.as_str()),
        user_id = ctx.user.as_ref().and_then(|u| u.user()).map(|u| u.id),
        "Request authenticated"
    );
    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

/// The authenticated user of a guarded request.
///
/// Rejects application-only and anonymous access with 401.
#[derive(Debug, Clone)]
pub struct RequireUser(pub AuthenticatedUser);

impl<S: Send + Sync> FromRequestParts<S> for RequireUser {
    type Rejection = GuardError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .extensions
            .get::<AuthContext>()
            .ok_or_else(|| GuardError::Unauthorized(crate::authenticate::MSG_USER_REQUIRED.into()))?;
        require_user(ctx).cloned().map(RequireUser)
    }
}

//! Runs the permission policy against a store.
//!
//! [`PermissionResolver`] is the only place where the pure stages in
//! `civic_core::policy` meet I/O. Both the auth service's HTTP handlers and
//! `civic-guard`'s local checker go through it, so the two deployments give
//! identical answers.

use std::sync::Arc;

use chrono::Utc;
use civic_core::api_keys::hash_api_key;
use civic_core::error::CoreError;
use civic_core::policy;
use civic_core::protocol::{
    ApplicationAuthorization, ApplicationInfo, AuthenticatedUser, TokenUserInfo,
    UserAuthorization, ValidatedApplication, ValidatedToken, STATUS_AUTHORISED, STATUS_VALID,
};
use civic_core::tokens::{hash_token, last_word_token, parse_token_header};

use crate::models::application::Application;
use crate::models::token::UserToken;
use crate::models::user::User;
use crate::store::{AuthStore, StoreError};

pub const MSG_INVALID_API_KEY_FORMAT: &str = "Invalid API key";
pub const MSG_AUTHORIZATION_REQUIRED: &str = "Authorization header is required";
pub const MSG_INVALID_TOKEN_SHORT: &str = "Invalid token";

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The policy refused the request.
    #[error(transparent)]
    Denied(#[from] CoreError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Inputs of the user permission check, straight from the request headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserCheck<'a> {
    pub resource: Option<&'a str>,
    pub sub_resource: Option<&'a str>,
    /// Already normalised (see `civic_core::permission::normalize_method`).
    pub method: &'a str,
    pub authorization: Option<&'a str>,
}

#[derive(Clone)]
pub struct PermissionResolver {
    store: Arc<dyn AuthStore>,
}

impl PermissionResolver {
    pub fn new(store: Arc<dyn AuthStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn AuthStore> {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Applications
    // -----------------------------------------------------------------------

    /// May the application holding `api_key` call `method` on `resource`?
    pub async fn check_application(
        &self,
        api_key: Option<&str>,
        resource: &str,
        method: &str,
    ) -> Result<ApplicationAuthorization, ResolveError> {
        let app = self.live_application(api_key).await?;

        let grant = self.store.find_application_grant(app.id, resource).await?;
        let levels = grant.map(|g| g.levels());
        let decision =
            policy::evaluate_application_grant(&app.name, resource, method, levels.as_deref());

        match &decision {
            Ok(ok) => tracing::debug!(
                application_id = app.id,
                resource,
                method,
                permission = %ok.permission,
                "Application authorised"
            ),
            Err(e) => tracing::debug!(
                application_id = app.id,
                resource,
                method,
                reason = %e.message(),
                "Application denied"
            ),
        }
        Ok(decision?)
    }

    /// Is `api_key` a live key of an active application?
    pub async fn validate_api_key(
        &self,
        api_key: Option<&str>,
    ) -> Result<ValidatedApplication, ResolveError> {
        if api_key.map(str::trim).filter(|k| !k.is_empty()).is_none() {
            return Err(CoreError::Validation(MSG_INVALID_API_KEY_FORMAT.into()).into());
        }
        let app = self.live_application(api_key).await?;
        Ok(ValidatedApplication {
            status: STATUS_VALID.to_string(),
            application: ApplicationInfo {
                id: app.id,
                name: app.name,
            },
        })
    }

    async fn live_application(&self, api_key: Option<&str>) -> Result<Application, ResolveError> {
        let key = policy::require_api_key(api_key)?;
        let app = self
            .store
            .find_application_by_key_hash(&hash_api_key(key))
            .await?;
        policy::check_application_standing(app.as_ref().map(Application::standing), Utc::now())?;
        app.ok_or_else(|| CoreError::Forbidden(policy::MSG_INVALID_API_KEY.into()).into())
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// May the request's user (or an anonymous caller) use `method` on the
    /// sub-resource?
    pub async fn check_user(
        &self,
        check: UserCheck<'_>,
    ) -> Result<UserAuthorization, ResolveError> {
        let (resource, sub_resource) = policy::require_target(check.resource, check.sub_resource)?;

        let allow_anonymous = self
            .store
            .find_sub_resource(resource, sub_resource)
            .await?
            .is_some_and(|s| s.allow_anonymous);
        let has_credentials = check
            .authorization
            .is_some_and(|h| !h.trim().is_empty());

        if let Some(decision) =
            policy::anonymous_decision(allow_anonymous, check.method, has_credentials)
        {
            tracing::debug!(resource, sub_resource, method = check.method, "Anonymous carve-out applied");
            return Ok(decision?);
        }

        let header = policy::require_credentials(check.authorization)?;
        let token = last_word_token(header).ok_or_else(policy::invalid_token)?;
        let (user, _) = self
            .authenticate_token(token)
            .await
            .map_err(|e| match e {
                ResolveError::Denied(_) => ResolveError::Denied(policy::invalid_token()),
                other => other,
            })?;

        let types = self.store.user_types_of(user.id).await?;
        let type_names: Vec<String> = types.iter().map(|t| t.name.clone()).collect();
        let grants = if types.is_empty() {
            Vec::new()
        } else {
            let ids: Vec<_> = types.iter().map(|t| t.id).collect();
            self.store
                .find_user_type_grants(&ids, resource, sub_resource)
                .await?
        };
        let levels: Vec<_> = grants.iter().map(|g| g.levels()).collect();

        let decision = policy::evaluate_user_grants(
            AuthenticatedUser {
                id: user.id,
                email: user.email.clone(),
            },
            type_names,
            &levels,
            check.method,
        );
        match &decision {
            Ok(ok) => tracing::debug!(
                user_id = user.id,
                resource,
                sub_resource,
                method = check.method,
                permission = %ok.permission(),
                "User authorised"
            ),
            Err(e) => tracing::debug!(
                user_id = user.id,
                resource,
                sub_resource,
                method = check.method,
                reason = %e.message(),
                "User denied"
            ),
        }
        Ok(decision?)
    }

    /// Strict token validation for `POST /api/auth/user/validate`.
    pub async fn validate_token(
        &self,
        authorization: Option<&str>,
    ) -> Result<ValidatedToken, ResolveError> {
        let header = authorization
            .filter(|h| !h.is_empty())
            .ok_or_else(|| CoreError::Unauthorized(MSG_AUTHORIZATION_REQUIRED.into()))?;
        let token = parse_token_header(header)?;

        let (user, user_token) = self.authenticate_token(token).await.map_err(|e| match e {
            ResolveError::Denied(_) => {
                ResolveError::Denied(CoreError::Unauthorized(MSG_INVALID_TOKEN_SHORT.into()))
            }
            other => other,
        })?;
        let user_types = self
            .store
            .user_types_of(user.id)
            .await?
            .into_iter()
            .map(|t| t.name)
            .collect();

        Ok(ValidatedToken {
            status: STATUS_AUTHORISED.to_string(),
            user: TokenUserInfo {
                email: user.email,
                first_name: user.first_name,
                last_name: user.last_name,
                user_types,
            },
            token_expiry: Some(user_token.expires_at),
        })
    }

    /// Resolve a plaintext token to its live token row and active user.
    pub async fn authenticate_token(&self, token: &str) -> Result<(User, UserToken), ResolveError> {
        let user_token = self
            .store
            .find_live_token(&hash_token(token), Utc::now())
            .await?
            .ok_or_else(policy::invalid_token)?;
        let user = self
            .store
            .find_user(user_token.user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(policy::invalid_token)?;
        Ok((user, user_token))
    }
}

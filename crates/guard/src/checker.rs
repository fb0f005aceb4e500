use async_trait::async_trait;
use civic_core::protocol::{ApplicationAuthorization, UserAuthorization};

use crate::error::GuardError;

/// Inputs of one user permission check.
#[derive(Debug, Clone, Copy)]
pub struct UserPermissionRequest<'a> {
    /// Plaintext user token, without scheme.
    pub token: &'a str,
    /// Forwarded for the auth service's logs; it does not affect the decision.
    pub api_key: Option<&'a str>,
    pub resource: &'a str,
    pub sub_resource: &'a str,
    pub method: &'a str,
}

/// Answers the two permission questions of the protocol.
///
/// [`crate::AuthServiceClient`] asks the auth service over HTTP;
/// [`crate::LocalChecker`] evaluates the same policy in-process.
#[async_trait]
pub trait PermissionChecker: Send + Sync {
    async fn check_application(
        &self,
        api_key: &str,
        resource: &str,
        method: &str,
    ) -> Result<ApplicationAuthorization, GuardError>;

    async fn check_user(
        &self,
        request: UserPermissionRequest<'_>,
    ) -> Result<UserAuthorization, GuardError>;
}

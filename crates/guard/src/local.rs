//! In-process permission checks.
//!
//! For services that share the auth database: the same
//! [`PermissionResolver`] the auth service uses, without the HTTP hop.

use async_trait::async_trait;
use civic_core::protocol::{ApplicationAuthorization, UserAuthorization};
use civic_core::tokens::authorization_value;
use civic_db::{PermissionResolver, UserCheck};

use crate::checker::{PermissionChecker, UserPermissionRequest};
use crate::error::GuardError;

#[derive(Clone)]
pub struct LocalChecker {
    resolver: PermissionResolver,
}

impl LocalChecker {
    pub fn new(resolver: PermissionResolver) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl PermissionChecker for LocalChecker {
    async fn check_application(
        &self,
        api_key: &str,
        resource: &str,
        method: &str,
    ) -> Result<ApplicationAuthorization, GuardError> {
        Ok(self
            .resolver
            .check_application(Some(api_key), resource, method)
            .await?)
    }

    async fn check_user(
        &self,
        request: UserPermissionRequest<'_>,
    ) -> Result<UserAuthorization, GuardError> {
        let authorization = authorization_value(request.token);
        Ok(self
            .resolver
            .check_user(UserCheck {
                resource: Some(request.resource),
                sub_resource: Some(request.sub_resource),
                method: request.method,
                authorization: Some(&authorization),
            })
            .await?)
    }
}

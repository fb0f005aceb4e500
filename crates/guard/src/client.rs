//! HTTP client for the auth service's permission check endpoints.

use async_trait::async_trait;
use civic_core::protocol::{
    ApplicationAuthorization, ErrorBody, UserAuthorization, HEADER_API_KEY, HEADER_AUTHORIZATION,
    HEADER_METHOD, HEADER_RESOURCE, HEADER_SUB_RESOURCE,
};
use civic_core::tokens::authorization_value;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::checker::{PermissionChecker, UserPermissionRequest};
use crate::config::GuardConfig;
use crate::error::GuardError;

const APPLICATION_CHECK_PATH: &str = "/api/auth/application/check_application_permission/";
const USER_CHECK_PATH: &str = "/api/auth/user/check-user-permission/";

/// Fallback messages when the auth service answers without an error body.
struct Fallback {
    denied: &'static str,
    failed: &'static str,
}

const APPLICATION_FALLBACK: Fallback = Fallback {
    denied: "Application permission denied",
    failed: "Application authentication failed",
};

const USER_FALLBACK: Fallback = Fallback {
    denied: "Permission denied",
    failed: "Authentication failed",
};

/// Asks a remote auth service for permission decisions.
#[derive(Debug, Clone)]
pub struct AuthServiceClient {
    client: reqwest::Client,
    base_url: String,
}

impl AuthServiceClient {
    /// Build a client with the configured timeout applied to every request.
    pub fn new(config: &GuardConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(client, config.auth_service_url.clone()))
    }

    /// Reuse an existing [`reqwest::Client`] (and its connection pool).
    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        headers: &[(&str, &str)],
        fallback: &Fallback,
    ) -> Result<T, GuardError> {
        let mut request = self.client.post(format!("{}{path}", self.base_url));
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status == StatusCode::OK {
            return response.json::<T>().await.map_err(transport_error);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.error)
            .ok();
        tracing::debug!(%status, path, reason = ?message, "Auth service refused request");
        if status == StatusCode::FORBIDDEN {
            Err(GuardError::Forbidden(
                message.unwrap_or_else(|| fallback.denied.to_string()),
            ))
        } else {
            Err(GuardError::Unauthorized(
                message.unwrap_or_else(|| fallback.failed.to_string()),
            ))
        }
    }
}

fn transport_error(err: reqwest::Error) -> GuardError {
    if err.is_timeout() {
        tracing::warn!("Auth service timed out");
        GuardError::Unauthorized("Auth service timeout".into())
    } else {
        tracing::warn!(error = %err, "Auth service request failed");
        GuardError::Unauthorized(format!("Auth service error: {err}"))
    }
}

#[async_trait]
impl PermissionChecker for AuthServiceClient {
    async fn check_application(
        &self,
        api_key: &str,
        resource: &str,
        method: &str,
    ) -> Result<ApplicationAuthorization, GuardError> {
        let headers = [
            (HEADER_API_KEY, api_key),
            (HEADER_RESOURCE, resource),
            (HEADER_METHOD, method),
        ];
        self.post(APPLICATION_CHECK_PATH, &headers, &APPLICATION_FALLBACK)
            .await
    }

    async fn check_user(
        &self,
        request: UserPermissionRequest<'_>,
    ) -> Result<UserAuthorization, GuardError> {
        let authorization = authorization_value(request.token);
        let mut headers = vec![
            (HEADER_AUTHORIZATION, authorization.as_str()),
            (HEADER_RESOURCE, request.resource),
            (HEADER_SUB_RESOURCE, request.sub_resource),
            (HEADER_METHOD, request.method),
        ];
        if let Some(key) = request.api_key {
            headers.push((HEADER_API_KEY, key));
        }
        self.post(USER_CHECK_PATH, &headers, &USER_FALLBACK).await
    }
}

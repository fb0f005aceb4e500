use std::time::Duration;

/// Default per-request timeout for calls to the auth service.
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;

/// Where the auth service lives and how long to wait for it.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Base URL without a trailing slash, e.g. `http://authentication:9080`.
    pub auth_service_url: String,
    pub timeout: Duration,
}

impl GuardConfig {
    pub fn new(auth_service_url: impl Into<String>) -> Self {
        Self {
            auth_service_url: auth_service_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// | Env Var                   | Default    |
    /// |---------------------------|------------|
    /// | `AUTH_SERVICE_URL`        | (required) |
    /// | `AUTH_SERVICE_TIMEOUT_MS` | `3000`     |
    pub fn from_env() -> Self {
        let url = std::env::var("AUTH_SERVICE_URL").expect("AUTH_SERVICE_URL must be set");

        let timeout_ms: u64 = std::env::var("AUTH_SERVICE_TIMEOUT_MS")
            .ok()
            .map(|v| {
                v.trim()
                    .parse()
                    .expect("AUTH_SERVICE_TIMEOUT_MS must be a valid u64")
            })
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        Self {
            timeout: Duration::from_millis(timeout_ms),
            ..Self::new(url)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = GuardConfig::new("http://auth:9080/");
        assert_eq!(config.auth_service_url, "http://auth:9080");
        assert_eq!(config.timeout, Duration::from_millis(3000));
    }
}

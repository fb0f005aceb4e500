use civic_core::api_keys::DEFAULT_KEY_TTL_DAYS;
use civic_core::tokens::DEFAULT_TOKEN_TTL_HOURS;

/// Upper bound for `API_KEY_TTL_DAYS`: one hundred years.
pub const MAX_API_KEY_TTL_DAYS: i64 = 365 * 100;

/// Upper bound for `USER_TOKEN_TTL_HOURS`: one year.
pub const MAX_USER_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Credentials for the first administrator, created at startup when absent.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `9080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// PostgreSQL URL. `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Seed the built-in catalogue at startup (default: `true`).
    pub seed_catalog: bool,
    pub user_token_ttl_hours: i64,
    pub api_key_ttl_days: i64,
    pub min_password_length: usize,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 9080,
            cors_origins: vec!["http://localhost:5173".into()],
            request_timeout_secs: 30,
            database_url: None,
            seed_catalog: true,
            user_token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            api_key_ttl_days: DEFAULT_KEY_TTL_DAYS,
            min_password_length: 8,
            bootstrap_admin: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                 |
    /// |----------------------------|-------------------------|
    /// | `HOST`                     | `0.0.0.0`               |
    /// | `PORT`                     | `9080`                  |
    /// | `CORS_ORIGINS`             | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                    |
    /// | `DATABASE_URL`             | unset (in-memory store) |
    /// | `SEED_CATALOG`             | `true`                  |
    /// | `USER_TOKEN_TTL_HOURS`     | `10` (1..=8760)         |
    /// | `API_KEY_TTL_DAYS`         | `3650` (1..=36500)      |
    /// | `MIN_PASSWORD_LENGTH`      | `8`                     |
    /// | `BOOTSTRAP_ADMIN_EMAIL`    | unset                   |
    /// | `BOOTSTRAP_ADMIN_PASSWORD` | unset                   |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var("HOST").unwrap_or(defaults.host);

        let port: u16 = parsed("PORT", defaults.port);

        let cors_origins: Vec<String> = match std::env::var("CORS_ORIGINS") {
            Ok(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(_) => defaults.cors_origins,
        };

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let seed_catalog = std::env::var("SEED_CATALOG")
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
            .unwrap_or(defaults.seed_catalog);

        let bootstrap_admin = match (
            std::env::var("BOOTSTRAP_ADMIN_EMAIL"),
            std::env::var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) if !email.is_empty() && !password.is_empty() => {
                Some(BootstrapAdmin { email, password })
            }
            _ => None,
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs: parsed("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            database_url,
            seed_catalog,
            user_token_ttl_hours: ttl(
                "USER_TOKEN_TTL_HOURS",
                defaults.user_token_ttl_hours,
                MAX_USER_TOKEN_TTL_HOURS,
            ),
            api_key_ttl_days: ttl("API_KEY_TTL_DAYS", defaults.api_key_ttl_days, MAX_API_KEY_TTL_DAYS),
            min_password_length: parsed("MIN_PASSWORD_LENGTH", defaults.min_password_length),
            bootstrap_admin,
        }
    }
}

/// Read and parse an env var, falling back to `default` when unset.
///
/// Panics on an unparsable value: misconfiguration should fail at startup.
fn parsed<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{name} must be a valid number: {e}")),
        Err(_) => default,
    }
}

/// Parse a lifetime env var and check it against `1..=max`.
///
/// Panics when out of range, like [`parsed`].
fn ttl(name: &str, default: i64, max: i64) -> i64 {
    check_ttl(name, parsed(name, default), max).unwrap_or_else(|e| panic!("{e}"))
}

fn check_ttl(name: &str, value: i64, max: i64) -> Result<i64, String> {
    if (1..=max).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{name} must be between 1 and {max}, got {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_within_bounds() {
        let config = ServerConfig::default();
        assert!(check_ttl("USER_TOKEN_TTL_HOURS", config.user_token_ttl_hours, MAX_USER_TOKEN_TTL_HOURS).is_ok());
        assert!(check_ttl("API_KEY_TTL_DAYS", config.api_key_ttl_days, MAX_API_KEY_TTL_DAYS).is_ok());
    }

    #[test]
    fn lifetimes_outside_bounds_are_rejected() {
        assert_eq!(check_ttl("API_KEY_TTL_DAYS", 36_500, MAX_API_KEY_TTL_DAYS), Ok(36_500));
        assert_eq!(
            check_ttl("API_KEY_TTL_DAYS", 10_000_000_000, MAX_API_KEY_TTL_DAYS),
            Err("API_KEY_TTL_DAYS must be between 1 and 36500, got 10000000000".to_string())
        );
        assert!(check_ttl("USER_TOKEN_TTL_HOURS", 0, MAX_USER_TOKEN_TTL_HOURS).is_err());
        assert!(check_ttl("USER_TOKEN_TTL_HOURS", -5, MAX_USER_TOKEN_TTL_HOURS).is_err());
    }
}

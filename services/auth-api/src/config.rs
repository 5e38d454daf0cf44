//! Configuration for the Auth API service.

use latch_auth_core::AuthConfig;
use std::time::Duration;

/// Auth API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,

    /// Database URL
    pub database_url: String,

    /// Auth core configuration
    pub auth: AuthConfig,

    /// Whether the renewal cookie carries the `Secure` attribute
    pub refresh_cookie_secure: bool,

    /// Request timeout
    pub request_timeout: Duration,

    /// Metrics enabled
    pub metrics_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Database
        let database_url = var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        // Server port
        let http_port = parse_or(&var, "HTTP_PORT", 8080)?;

        // Token signing and fingerprint secrets (validated by AuthConfig)
        let signing_secret = var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let hashing_secret =
            var("REFRESH_HMAC_SECRET").ok_or(ConfigError::Missing("REFRESH_HMAC_SECRET"))?;
        let issuer = var("JWT_ISSUER").unwrap_or_else(|| "latch".to_string());

        // Token lifetimes (default 15 minutes / 14 days)
        let access_ttl_secs: u64 = parse_or(&var, "ACCESS_TOKEN_TTL_SECS", 900)?;
        let refresh_ttl_secs: u64 = parse_or(&var, "REFRESH_TOKEN_TTL_SECS", 1_209_600)?;

        let refresh_cookie_secure = parse_or(&var, "REFRESH_COOKIE_SECURE", true)?;

        // Request timeout (default 30 seconds)
        let request_timeout_secs: u64 = parse_or(&var, "REQUEST_TIMEOUT_SECS", 30)?;

        // Metrics
        let metrics_enabled = parse_or(&var, "METRICS_ENABLED", true)?;

        // Build auth config
        let auth = AuthConfig::try_new(issuer, signing_secret, hashing_secret)
            .map_err(|e| ConfigError::AuthConfig(e.to_string()))?
            .with_access_token_ttl(Duration::from_secs(access_ttl_secs))
            .with_renewal_token_ttl(Duration::from_secs(refresh_ttl_secs));
        auth.validate()
            .map_err(|e| ConfigError::AuthConfig(e.to_string()))?;

        Ok(Self {
            http_port,
            database_url,
            auth,
            refresh_cookie_secure,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match var(name) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        None => Ok(default),
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Auth config error: {0}")]
    AuthConfig(String),
}

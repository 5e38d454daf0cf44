//! Configuration types for the auth core

use std::time::Duration;

/// Minimum secret length in bytes for both HMAC keys (256 bits)
pub const MIN_SECRET_LENGTH: usize = 32;

/// Auth core configuration
///
/// Built once at startup and handed to the codec, hasher and service. Nothing reads
/// secrets from the environment after construction.
#[derive(Clone)]
pub struct AuthConfig {
    /// `iss` claim written into and required on every token
    pub issuer: String,
    /// HS256 signing secret for bearer tokens
    pub signing_secret: String,
    /// HMAC secret for renewal token fingerprints (distinct from the signing secret)
    pub hashing_secret: String,
    /// Access token lifetime
    pub access_token_ttl: Duration,
    /// Renewal token lifetime
    pub renewal_token_ttl: Duration,
}

impl AuthConfig {
    /// Create a validated auth config with default lifetimes
    /// (15 minutes for access tokens, 14 days for renewal tokens)
    pub fn try_new(
        issuer: impl Into<String>,
        signing_secret: impl Into<String>,
        hashing_secret: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            issuer: issuer.into(),
            signing_secret: signing_secret.into(),
            hashing_secret: hashing_secret.into(),
            access_token_ttl: Duration::from_secs(15 * 60),
            renewal_token_ttl: Duration::from_secs(14 * 24 * 60 * 60),
        };
        config.validate()?;
        Ok(config)
    }

    /// Set access token lifetime
    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    /// Set renewal token lifetime
    pub fn with_renewal_token_ttl(mut self, ttl: Duration) -> Self {
        self.renewal_token_ttl = ttl;
        self
    }

    /// Check every field. Called by `try_new` and again by the service constructor,
    /// since the builder setters and public fields can bypass `try_new`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::MissingIssuer);
        }
        check_secret("signing secret", self.signing_secret.as_bytes())?;
        check_secret("hashing secret", self.hashing_secret.as_bytes())?;
        if self.signing_secret == self.hashing_secret {
            return Err(ConfigError::SharedSecret);
        }
        if self.access_token_ttl.as_secs() == 0 {
            return Err(ConfigError::InvalidTtl("access token TTL"));
        }
        if self.renewal_token_ttl.as_secs() == 0 {
            return Err(ConfigError::InvalidTtl("renewal token TTL"));
        }
        Ok(())
    }
}

/// Reject blank and short secrets
pub(crate) fn check_secret(name: &'static str, secret: &[u8]) -> Result<(), ConfigError> {
    if secret.iter().all(u8::is_ascii_whitespace) {
        return Err(ConfigError::MissingSecret(name));
    }
    if secret.len() < MIN_SECRET_LENGTH {
        return Err(ConfigError::WeakSecret {
            name,
            actual: secret.len(),
            minimum: MIN_SECRET_LENGTH,
        });
    }
    Ok(())
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("issuer", &self.issuer)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("renewal_token_ttl", &self.renewal_token_ttl)
            .finish_non_exhaustive()
    }
}

/// Startup configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required secret: {0}")]
    MissingSecret(&'static str),

    #[error("{name} too short: got {actual} bytes, need at least {minimum}")]
    WeakSecret {
        name: &'static str,
        actual: usize,
        minimum: usize,
    },

    #[error("signing secret and hashing secret must differ")]
    SharedSecret,

    #[error("invalid {0}: must be at least one second")]
    InvalidTtl(&'static str),

    #[error("token issuer must not be blank")]
    MissingIssuer,
}

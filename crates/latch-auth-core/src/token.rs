//! Bearer token issuance and verification
//!
//! Tokens are compact HS256 JWS strings. The algorithm is fixed by the codec and never
//! taken from the token header. Expiry is judged against the injected [`Clock`] with
//! zero leeway.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use latch_types::{PrincipalId, TokenType};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::{check_secret, AuthConfig, ConfigError};

/// Claims as they travel inside the signed payload
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireClaims {
    iss: String,
    /// Principal ID, decimal
    sub: String,
    iat: i64,
    exp: i64,
    /// Rotation ID
    jti: String,
    /// Token type; optional on the wire so an absent value is reported as
    /// [`TokenError::UnknownTokenType`] rather than a parse failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// Verified claims of a bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerClaims {
    pub principal_id: PrincipalId,
    pub token_type: TokenType,
    /// Unique per issuance; carried in the `jti` claim
    pub rotation_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A freshly signed token together with the claims it carries
#[derive(Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: BearerClaims,
}

impl std::fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedToken")
            .field("claims", &self.claims)
            .finish_non_exhaustive()
    }
}

/// Token-level failures
///
/// These are precise on purpose; the session service collapses them before they
/// reach a client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Not a token, bad signature, wrong algorithm or issuer, or missing claims
    #[error("malformed token")]
    Malformed,

    /// Signature is valid but the clock has passed `exp`
    #[error("token expired")]
    Expired,

    /// `typ` claim absent or not a known token type
    #[error("unknown token type")]
    UnknownTokenType,

    /// Signing failed (only on issuance)
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Stateless signer/verifier for access and renewal tokens
#[derive(Clone)]
pub struct TokenCodec {
    issuer: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// The only algorithm this codec signs with or accepts
    pub const ALGORITHM: Algorithm = Algorithm::HS256;

    /// Create a codec from the issuer and signing secret in `config`
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        if config.issuer.trim().is_empty() {
            return Err(ConfigError::MissingIssuer);
        }
        check_secret("signing secret", config.signing_secret.as_bytes())?;

        let secret = config.signing_secret.as_bytes();

        let mut validation = Validation::new(Self::ALGORITHM);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        // Expiry is checked against the injected clock below, not the system time.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Ok(Self {
            issuer: config.issuer.clone(),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            clock,
        })
    }

    /// Sign a new token of `token_type` for `principal_id`, valid for `ttl`
    /// (whole seconds) from the clock's current time.
    pub fn issue(
        &self,
        principal_id: PrincipalId,
        token_type: TokenType,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError> {
        let now = self.clock.now().timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs())
            .map_err(|_| TokenError::Encoding("ttl out of range".to_string()))?;
        let exp = now
            .checked_add(ttl_secs)
            .ok_or_else(|| TokenError::Encoding("ttl out of range".to_string()))?;

        let wire = WireClaims {
            iss: self.issuer.clone(),
            sub: principal_id.to_string(),
            iat: now,
            exp,
            jti: Uuid::new_v4().to_string(),
            typ: Some(token_type.as_str().to_string()),
        };

        let token = encode(&Header::new(Self::ALGORITHM), &wire, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to sign token: {}", e);
            TokenError::Encoding(e.to_string())
        })?;

        let claims = BearerClaims {
            principal_id,
            token_type,
            rotation_id: wire.jti,
            issued_at: timestamp(now).ok_or_else(|| TokenError::Encoding("iat".to_string()))?,
            expires_at: timestamp(exp).ok_or_else(|| TokenError::Encoding("exp".to_string()))?,
        };

        Ok(IssuedToken { token, claims })
    }

    /// Verify signature, structure, type field and expiry. All or nothing.
    pub fn verify(&self, raw: &str) -> Result<BearerClaims, TokenError> {
        let claims = self.verify_allow_expired(raw)?;

        if self.clock.now().timestamp() > claims.expires_at.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Like [`verify`](Self::verify) but accepts tokens whose `exp` has passed.
    ///
    /// The signature is still fully checked, so the claims are authentic. Only for
    /// callers that need to identify a principal from a stale token (logout).
    pub fn verify_allow_expired(&self, raw: &str) -> Result<BearerClaims, TokenError> {
        let data = decode::<WireClaims>(raw, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!(kind = ?e.kind(), "Token failed verification");
            TokenError::Malformed
        })?;
        let wire = data.claims;

        let token_type = wire
            .typ
            .as_deref()
            .and_then(|t| t.parse::<TokenType>().ok())
            .ok_or(TokenError::UnknownTokenType)?;

        let principal_id = PrincipalId::parse(&wire.sub).map_err(|_| TokenError::Malformed)?;

        if wire.jti.is_empty() {
            return Err(TokenError::Malformed);
        }

        Ok(BearerClaims {
            principal_id,
            token_type,
            rotation_id: wire.jti,
            issued_at: timestamp(wire.iat).ok_or(TokenError::Malformed)?,
            expires_at: timestamp(wire.exp).ok_or(TokenError::Malformed)?,
        })
    }

    /// Configured issuer
    pub fn issuer(&self) -> &str {
        &self.issuer
    }
}

fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.issuer)
            .field("algorithm", &Self::ALGORITHM)
            .finish_non_exhaustive()
    }
}

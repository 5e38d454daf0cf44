//! Login password hashing
//!
//! The session service only needs `encode` and `matches`; [`Argon2PasswordEncoder`]
//! is the production implementation.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::AuthError;

/// Password hashing capability
pub trait PasswordEncoder: Send + Sync {
    /// Hash a plaintext password for storage
    fn encode(&self, plain: &str) -> Result<String, AuthError>;

    /// Check a plaintext password against a stored hash
    fn matches(&self, plain: &str, hash: &str) -> bool;

    /// A valid hash of an unguessable value.
    ///
    /// Verified against when the principal does not exist, so a login for an unknown
    /// email costs the same as one with a wrong password.
    fn decoy_hash(&self) -> &str;
}

/// Argon2id password encoder
pub struct Argon2PasswordEncoder {
    argon2: Argon2<'static>,
    decoy: String,
}

impl Argon2PasswordEncoder {
    /// Encoder with the argon2 crate's default Argon2id parameters
    pub fn new() -> Result<Self, AuthError> {
        Self::with_argon2(Argon2::default())
    }

    /// Encoder with explicit cost parameters
    pub fn with_params(params: Params) -> Result<Self, AuthError> {
        Self::with_argon2(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    fn with_argon2(argon2: Argon2<'static>) -> Result<Self, AuthError> {
        let decoy_plain = hex::encode(rand::random::<[u8; 32]>());
        let decoy = hash_with(&argon2, &decoy_plain)?;
        Ok(Self { argon2, decoy })
    }
}

fn hash_with(argon2: &Argon2<'_>, plain: &str) -> Result<String, AuthError> {
    let salt_bytes: [u8; 16] = rand::random();
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AuthError::Internal(format!("failed to encode salt: {e}")))?;

    argon2
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            AuthError::Internal("failed to hash password".to_string())
        })
}

impl PasswordEncoder for Argon2PasswordEncoder {
    fn encode(&self, plain: &str) -> Result<String, AuthError> {
        hash_with(&self.argon2, plain)
    }

    fn matches(&self, plain: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!("Stored password hash is not a valid PHC string: {}", e);
                false
            }
        }
    }

    fn decoy_hash(&self) -> &str {
        &self.decoy
    }
}

impl std::fmt::Debug for Argon2PasswordEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2PasswordEncoder").finish_non_exhaustive()
    }
}

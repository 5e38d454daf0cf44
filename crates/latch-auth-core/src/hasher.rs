//! Renewal token fingerprints
//!
//! The store never sees a raw renewal token, only `HMAC-SHA256(hashing_secret, token)`
//! as lowercase hex. The digest is deterministic so it can be compared for equality,
//! and keyed so a leaked table cannot be checked against guessed tokens offline.

use crate::config::{check_secret, ConfigError};
use crate::crypto::HmacKey;

/// Keyed one-way transform of renewal tokens
#[derive(Clone)]
pub struct CredentialHasher {
    key: HmacKey,
}

impl CredentialHasher {
    /// Length of every fingerprint in hex characters
    pub const FINGERPRINT_LEN: usize = 64;

    /// Create a hasher. Fails at construction, never per call, if the secret is
    /// blank or too short.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, ConfigError> {
        let secret = secret.as_ref();
        check_secret("hashing secret", secret)?;
        let key = HmacKey::new(secret).map_err(|_| ConfigError::WeakSecret {
            name: "hashing secret",
            actual: secret.len(),
            minimum: HmacKey::MIN_KEY_LENGTH,
        })?;
        Ok(Self { key })
    }

    /// Fingerprint a raw renewal token
    pub fn fingerprint(&self, raw_token: &str) -> String {
        self.key.sign_hex(raw_token.as_bytes())
    }
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher").finish_non_exhaustive()
    }
}

//! Session lifecycle service - login, reissue, logout and the account operations that
//! must revoke renewal credentials

use chrono::{DateTime, Utc};
use latch_db::{CreatePrincipal, PrincipalRepository, PrincipalRow, RenewalCredentialRepository};
use latch_types::{PrincipalId, TokenType};
use metrics::counter;
use std::sync::Arc;

use crate::{
    clock::Clock,
    config::AuthConfig,
    hasher::CredentialHasher,
    password::PasswordEncoder,
    store::RenewalCredentialStore,
    token::{IssuedToken, TokenCodec},
    AuthError,
};

/// Attempts at the login upsert before a uniqueness conflict is surfaced
const LOGIN_UPSERT_ATTEMPTS: u32 = 3;

/// Access and renewal token issued together
#[derive(Clone)]
pub struct TokenPair {
    pub principal_id: PrincipalId,
    pub access_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub renewal_token: String,
    pub renewal_expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("principal_id", &self.principal_id)
            .field("access_expires_at", &self.access_expires_at)
            .field("renewal_expires_at", &self.renewal_expires_at)
            .finish_non_exhaustive()
    }
}

/// Both halves of a pair as issued, before the renewal half is persisted
struct IssuedPair {
    access: IssuedToken,
    renewal: IssuedToken,
}

impl IssuedPair {
    fn into_pair(self) -> TokenPair {
        TokenPair {
            principal_id: self.access.claims.principal_id,
            access_token: self.access.token,
            access_expires_at: self.access.claims.expires_at,
            renewal_token: self.renewal.token,
            renewal_expires_at: self.renewal.claims.expires_at,
        }
    }
}

/// Session lifecycle service
///
/// Owns the rotation protocol:
/// - login always rotates the principal's single renewal record
/// - reissue accepts only the most recently issued renewal token and rotates it
///   with one conditional write, so concurrent reissues have exactly one winner
/// - logout, credential change and withdrawal delete the record
///
/// Every renewal or access token failure leaves this type as [`AuthError::Unauthenticated`].
pub struct SessionLifecycleService<P: PrincipalRepository, R: RenewalCredentialRepository> {
    config: AuthConfig,
    codec: TokenCodec,
    store: RenewalCredentialStore<R>,
    principals: Arc<P>,
    passwords: Arc<dyn PasswordEncoder>,
}

impl<P: PrincipalRepository, R: RenewalCredentialRepository> SessionLifecycleService<P, R> {
    /// Create the service. Fails if `config` does not validate.
    pub fn new(
        config: AuthConfig,
        principals: Arc<P>,
        credentials: Arc<R>,
        passwords: Arc<dyn PasswordEncoder>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        config.validate()?;
        let codec = TokenCodec::new(&config, clock)?;
        let hasher = CredentialHasher::new(&config.hashing_secret)?;

        Ok(Self {
            store: RenewalCredentialStore::new(credentials, hasher),
            codec,
            principals,
            passwords,
            config,
        })
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Exchange an email and password for a fresh token pair.
    ///
    /// Replaces any renewal record the principal already had.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let principal = self.principals.find_by_email(email.trim()).await?;

        let verified = match &principal {
            Some(row) => self.passwords.matches(password, &row.password_hash),
            None => {
                // Same work as a wrong password
                let _ = self.passwords.matches(password, self.passwords.decoy_hash());
                false
            }
        };

        let principal = match principal {
            Some(row) if verified => row,
            _ => {
                tracing::debug!("Login rejected");
                counter!("latch_logins_total", "outcome" => "invalid_credentials").increment(1);
                return Err(AuthError::InvalidCredentials);
            }
        };
        let principal_id = principal.principal_id();

        let mut attempt = 1;
        loop {
            let issued = self.issue_pair(principal_id)?;
            let result = self
                .store
                .upsert(
                    principal_id,
                    &issued.renewal.token,
                    &issued.renewal.claims.rotation_id,
                    issued.renewal.claims.expires_at,
                )
                .await;

            match result {
                Ok(_) => {
                    tracing::info!(principal_id = %principal_id, "Login succeeded");
                    counter!("latch_logins_total", "outcome" => "success").increment(1);
                    return Ok(issued.into_pair());
                }
                Err(err) if err.is_conflict() && attempt < LOGIN_UPSERT_ATTEMPTS => {
                    tracing::warn!(
                        principal_id = %principal_id,
                        attempt,
                        "Renewal credential upsert conflicted, retrying"
                    );
                    attempt += 1;
                }
                Err(err) if err.is_conflict() => {
                    tracing::error!(principal_id = %principal_id, "Renewal credential upsert kept conflicting");
                    counter!("latch_logins_total", "outcome" => "error").increment(1);
                    return Err(AuthError::Internal(
                        "renewal credential write conflicted".to_string(),
                    ));
                }
                Err(err) => {
                    counter!("latch_logins_total", "outcome" => "error").increment(1);
                    return Err(err.into());
                }
            }
        }
    }

    /// Exchange the current renewal token for a fresh pair, rotating the stored record.
    ///
    /// A renewal token that was valid but has since been superseded is rejected and
    /// leaves the store untouched.
    pub async fn reissue(&self, presented: &str) -> Result<TokenPair, AuthError> {
        if presented.trim().is_empty() {
            return Err(reject("missing renewal token"));
        }

        let claims = match self.codec.verify(presented) {
            Ok(claims) => claims,
            Err(err) => {
                tracing::debug!(reason = %err, "Renewal token failed verification");
                return Err(reject("verification failed"));
            }
        };
        if claims.token_type != TokenType::Renewal {
            tracing::debug!(token_type = %claims.token_type, "Wrong token type presented for reissue");
            return Err(reject("wrong token type"));
        }
        let principal_id = claims.principal_id;

        let record = match self.store.find_by_principal(principal_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::debug!(principal_id = %principal_id, "No renewal credential on record");
                return Err(reject("no record"));
            }
            Err(err) => {
                tracing::error!(principal_id = %principal_id, "Renewal credential lookup failed: {}", err);
                return Err(reject("store error"));
            }
        };

        if !self.store.matches(&record, presented, &claims.rotation_id) {
            tracing::warn!(
                principal_id = %principal_id,
                "Superseded renewal token presented"
            );
            counter!("latch_reissues_total", "outcome" => "replay").increment(1);
            return Err(AuthError::Unauthenticated);
        }

        let issued = self.issue_pair(principal_id)?;
        let rotated = self
            .store
            .rotate_if_current(
                principal_id,
                presented,
                &claims.rotation_id,
                &issued.renewal.token,
                &issued.renewal.claims.rotation_id,
                issued.renewal.claims.expires_at,
            )
            .await;

        match rotated {
            Ok(true) => {
                tracing::debug!(principal_id = %principal_id, "Renewal credential rotated");
                counter!("latch_reissues_total", "outcome" => "success").increment(1);
                Ok(issued.into_pair())
            }
            Ok(false) => {
                tracing::warn!(principal_id = %principal_id, "Lost renewal rotation race");
                counter!("latch_reissues_total", "outcome" => "race_lost").increment(1);
                Err(AuthError::Unauthenticated)
            }
            Err(err) => {
                tracing::error!(principal_id = %principal_id, "Renewal credential rotation failed: {}", err);
                Err(reject("store error"))
            }
        }
    }

    /// End the session a renewal token belongs to. Never fails.
    ///
    /// An expired renewal token still identifies its principal since its signature is
    /// checked. Anything that does not verify as a renewal token is ignored.
    pub async fn logout(&self, presented: &str) {
        counter!("latch_logouts_total").increment(1);

        if presented.trim().is_empty() {
            return;
        }

        let claims = match self.codec.verify_allow_expired(presented) {
            Ok(claims) if claims.token_type == TokenType::Renewal => claims,
            Ok(claims) => {
                tracing::debug!(token_type = %claims.token_type, "Logout with non-renewal token ignored");
                return;
            }
            Err(err) => {
                tracing::debug!(reason = %err, "Logout with unverifiable token ignored");
                return;
            }
        };

        match self.store.delete_by_principal(claims.principal_id).await {
            Ok(existed) => {
                tracing::info!(principal_id = %claims.principal_id, existed, "Logged out");
            }
            Err(err) => {
                tracing::error!(
                    principal_id = %claims.principal_id,
                    "Failed to delete renewal credential on logout: {}",
                    err
                );
            }
        }
    }

    /// Resolve an access token to its principal
    pub fn authenticate(&self, access_token: &str) -> Result<PrincipalId, AuthError> {
        if access_token.trim().is_empty() {
            return Err(AuthError::Unauthenticated);
        }

        match self.codec.verify(access_token) {
            Ok(claims) if claims.token_type == TokenType::Access => Ok(claims.principal_id),
            Ok(claims) => {
                tracing::debug!(token_type = %claims.token_type, "Wrong token type presented as access token");
                Err(AuthError::Unauthenticated)
            }
            Err(err) => {
                tracing::debug!(reason = %err, "Access token failed verification");
                Err(AuthError::Unauthenticated)
            }
        }
    }

    /// Delete the principal's renewal record, killing every outstanding renewal token
    pub async fn revoke_sessions(&self, principal_id: PrincipalId) -> Result<bool, AuthError> {
        let existed = self.store.delete_by_principal(principal_id).await?;
        tracing::info!(principal_id = %principal_id, existed, "Renewal credential revoked");
        Ok(existed)
    }

    // =========================================================================
    // Principals
    // =========================================================================

    /// Register a principal
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<PrincipalRow, AuthError> {
        let email = email.trim();
        let name = name.trim();

        if email.is_empty() || !is_plausible_email(email) {
            return Err(AuthError::InvalidRequest("email is invalid".to_string()));
        }
        if password.trim().is_empty() {
            return Err(AuthError::InvalidRequest("password is required".to_string()));
        }
        if name.is_empty() {
            return Err(AuthError::InvalidRequest("name is required".to_string()));
        }

        let password_hash = self.passwords.encode(password)?;
        let principal = self
            .principals
            .create(CreatePrincipal {
                email: email.to_string(),
                password_hash,
                name: name.to_string(),
            })
            .await?;

        tracing::info!(principal_id = %principal.principal_id(), "Principal registered");
        Ok(principal)
    }

    /// Look up a principal by ID
    pub async fn principal(&self, principal_id: PrincipalId) -> Result<PrincipalRow, AuthError> {
        self.principals
            .find_by_id(principal_id.0)
            .await?
            .ok_or(AuthError::Unauthenticated)
    }

    /// Replace the principal's password and revoke their renewal credential.
    ///
    /// No tokens are returned; the client logs in again with the new password.
    pub async fn change_credential(
        &self,
        principal_id: PrincipalId,
        current: &str,
        new: &str,
        new_confirm: &str,
    ) -> Result<(), AuthError> {
        let principal = self.principal(principal_id).await?;

        if !self.passwords.matches(current, &principal.password_hash) {
            return Err(AuthError::InvalidRequest(
                "current password does not match".to_string(),
            ));
        }
        if new.trim().is_empty() {
            return Err(AuthError::InvalidRequest("new password is required".to_string()));
        }
        if new != new_confirm {
            return Err(AuthError::InvalidRequest(
                "new password confirmation does not match".to_string(),
            ));
        }
        if self.passwords.matches(new, &principal.password_hash) {
            return Err(AuthError::InvalidRequest(
                "new password must differ from the current one".to_string(),
            ));
        }

        let password_hash = self.passwords.encode(new)?;
        self.principals
            .update_password_and_revoke(principal_id.0, &password_hash)
            .await?;

        tracing::info!(principal_id = %principal_id, "Password changed, sessions revoked");
        Ok(())
    }

    /// Delete the principal after re-checking their password
    pub async fn withdraw(&self, principal_id: PrincipalId, password: &str) -> Result<(), AuthError> {
        let principal = match self.principals.find_by_id(principal_id.0).await? {
            Some(row) => row,
            None => return Err(AuthError::InvalidCredentials),
        };

        if !self.passwords.matches(password, &principal.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        // Removes the renewal credential in the same transaction
        self.principals.delete(principal_id.0).await?;

        tracing::info!(principal_id = %principal_id, "Principal withdrawn");
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Token codec
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Renewal credential store
    pub fn store(&self) -> &RenewalCredentialStore<R> {
        &self.store
    }

    /// Auth config
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    fn issue_pair(&self, principal_id: PrincipalId) -> Result<IssuedPair, AuthError> {
        let access = self
            .codec
            .issue(principal_id, TokenType::Access, self.config.access_token_ttl)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        let renewal = self
            .codec
            .issue(principal_id, TokenType::Renewal, self.config.renewal_token_ttl)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        Ok(IssuedPair { access, renewal })
    }
}

impl<P: PrincipalRepository, R: RenewalCredentialRepository> std::fmt::Debug
    for SessionLifecycleService<P, R>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLifecycleService")
            .field("config", &self.config)
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

/// Count a rejected reissue and produce the collapsed error
fn reject(reason: &'static str) -> AuthError {
    counter!("latch_reissues_total", "outcome" => "rejected").increment(1);
    tracing::debug!(reason, "Reissue rejected");
    AuthError::Unauthenticated
}

/// `local@domain` with both halves non-empty and no whitespace
fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

//! Renewal credential store
//!
//! One record per principal, holding the fingerprint and rotation ID of the renewal
//! token most recently handed out. Rotation overwrites the record; there is no history.

use chrono::{DateTime, Utc};
use latch_db::{
    DbError, RenewalCredentialRepository, RenewalCredentialRow, RotateRenewalCredential,
    UpsertRenewalCredential,
};
use latch_types::PrincipalId;
use std::sync::Arc;

use crate::crypto::constant_time_str_eq;
use crate::hasher::CredentialHasher;

/// Stored state of a principal's renewal credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewalCredentialRecord {
    pub principal_id: PrincipalId,
    pub fingerprint: String,
    pub rotation_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RenewalCredentialRow> for RenewalCredentialRecord {
    fn from(row: RenewalCredentialRow) -> Self {
        Self {
            principal_id: row.principal_id(),
            fingerprint: row.fingerprint,
            rotation_id: row.rotation_id,
            expires_at: row.expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Persisted renewal credentials keyed by principal
pub struct RenewalCredentialStore<R: RenewalCredentialRepository> {
    repo: Arc<R>,
    hasher: CredentialHasher,
}

impl<R: RenewalCredentialRepository> RenewalCredentialStore<R> {
    /// Create a store over `repo`, fingerprinting with `hasher`
    pub fn new(repo: Arc<R>, hasher: CredentialHasher) -> Self {
        Self { repo, hasher }
    }

    /// Create the principal's record, or overwrite it if one exists.
    ///
    /// A single atomic write; concurrent upserts for one principal leave exactly one row.
    pub async fn upsert(
        &self,
        principal_id: PrincipalId,
        raw_renewal_token: &str,
        rotation_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RenewalCredentialRecord, DbError> {
        let row = self
            .repo
            .upsert(UpsertRenewalCredential {
                principal_id: principal_id.0,
                fingerprint: self.hasher.fingerprint(raw_renewal_token),
                rotation_id: rotation_id.to_string(),
                expires_at,
            })
            .await?;

        Ok(row.into())
    }

    /// Replace the record only if it still matches the presented token.
    ///
    /// Returns `false` when another writer rotated or deleted the record first.
    pub async fn rotate_if_current(
        &self,
        principal_id: PrincipalId,
        presented_token: &str,
        presented_rotation_id: &str,
        new_token: &str,
        new_rotation_id: &str,
        new_expires_at: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        self.repo
            .rotate_if_current(RotateRenewalCredential {
                principal_id: principal_id.0,
                expected_fingerprint: self.hasher.fingerprint(presented_token),
                expected_rotation_id: presented_rotation_id.to_string(),
                fingerprint: self.hasher.fingerprint(new_token),
                rotation_id: new_rotation_id.to_string(),
                expires_at: new_expires_at,
            })
            .await
    }

    /// Look up the principal's record
    pub async fn find_by_principal(
        &self,
        principal_id: PrincipalId,
    ) -> Result<Option<RenewalCredentialRecord>, DbError> {
        let row = self.repo.find_by_principal_id(principal_id.0).await?;
        Ok(row.map(Into::into))
    }

    /// Delete the principal's record. Returns whether one existed.
    pub async fn delete_by_principal(&self, principal_id: PrincipalId) -> Result<bool, DbError> {
        self.repo.delete_by_principal_id(principal_id.0).await
    }

    /// Whether `record` was produced from exactly this token and rotation ID.
    ///
    /// Both comparisons always run, in constant time.
    pub fn matches(
        &self,
        record: &RenewalCredentialRecord,
        raw_renewal_token: &str,
        rotation_id: &str,
    ) -> bool {
        let fingerprint = self.hasher.fingerprint(raw_renewal_token);
        let fingerprint_ok = constant_time_str_eq(&fingerprint, &record.fingerprint);
        let rotation_ok = constant_time_str_eq(rotation_id, &record.rotation_id);
        fingerprint_ok & rotation_ok
    }

    /// Fingerprint a raw token with this store's hasher
    pub fn fingerprint(&self, raw_renewal_token: &str) -> String {
        self.hasher.fingerprint(raw_renewal_token)
    }
}

impl<R: RenewalCredentialRepository> std::fmt::Debug for RenewalCredentialStore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenewalCredentialStore")
            .finish_non_exhaustive()
    }
}

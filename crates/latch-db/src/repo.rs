//! Repository traits
//!
//! Define async repository interfaces for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DbResult;
use crate::models::*;

/// Principal repository trait
#[async_trait]
pub trait PrincipalRepository: Send + Sync {
    /// Find a principal by ID
    async fn find_by_id(&self, id: i64) -> DbResult<Option<PrincipalRow>>;

    /// Find a principal by login email
    async fn find_by_email(&self, email: &str) -> DbResult<Option<PrincipalRow>>;

    /// Create a new principal. Fails with `DbError::Conflict` on a duplicate email.
    async fn create(&self, principal: CreatePrincipal) -> DbResult<PrincipalRow>;

    /// Replace the stored password hash and delete the principal's renewal
    /// credential in one transaction. Neither write survives if the other fails.
    /// Fails with `DbError::NotFound` if the principal does not exist.
    async fn update_password_and_revoke(&self, id: i64, password_hash: &str) -> DbResult<()>;

    /// Delete a principal together with its renewal credential.
    /// Fails with `DbError::NotFound` if the principal does not exist.
    async fn delete(&self, id: i64) -> DbResult<()>;
}

/// Create principal input
#[derive(Debug, Clone)]
pub struct CreatePrincipal {
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

/// Renewal credential repository trait
///
/// Every write is a single atomic statement; callers never read-then-write.
#[async_trait]
pub trait RenewalCredentialRepository: Send + Sync {
    /// Find the renewal credential of a principal
    async fn find_by_principal_id(&self, principal_id: i64)
        -> DbResult<Option<RenewalCredentialRow>>;

    /// Create the principal's row or overwrite it in place
    async fn upsert(&self, credential: UpsertRenewalCredential) -> DbResult<RenewalCredentialRow>;

    /// Overwrite the principal's row only if it still holds the expected
    /// fingerprint and rotation id. Returns whether a row was rotated.
    async fn rotate_if_current(&self, rotation: RotateRenewalCredential) -> DbResult<bool>;

    /// Delete the principal's row. Returns whether a row existed.
    async fn delete_by_principal_id(&self, principal_id: i64) -> DbResult<bool>;
}

/// Upsert renewal credential input
#[derive(Debug, Clone)]
pub struct UpsertRenewalCredential {
    pub principal_id: i64,
    pub fingerprint: String,
    pub rotation_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Conditional rotation input
#[derive(Debug, Clone)]
pub struct RotateRenewalCredential {
    pub principal_id: i64,
    pub expected_fingerprint: String,
    pub expected_rotation_id: String,
    pub fingerprint: String,
    pub rotation_id: String,
    pub expires_at: DateTime<Utc>,
}

//! Mock repositories for testing

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use latch_db::{
    CreatePrincipal, DbError, DbResult, PrincipalRepository, PrincipalRow,
    RenewalCredentialRepository, RenewalCredentialRow, RotateRenewalCredential,
    UpsertRenewalCredential,
};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::sync::Arc;

/// In-memory renewal credential repository for testing
///
/// Writes go through a DashMap entry or `get_mut`, which hold the shard lock for the
/// whole compare-and-write, matching the row-level atomicity of the SQL statements.
#[derive(Default, Clone)]
pub struct MockRenewalCredentialRepository {
    rows: Arc<DashMap<i64, RenewalCredentialRow>>,
    next_id: Arc<AtomicI64>,
    conflicts_to_inject: Arc<AtomicU32>,
    fail_lookups: Arc<AtomicBool>,
    fail_rotations: Arc<AtomicBool>,
    lose_rotations: Arc<AtomicBool>,
    fail_deletes: Arc<AtomicBool>,
}

fn unavailable() -> DbError {
    DbError::Sqlx(sqlx::Error::PoolTimedOut)
}

impl MockRenewalCredentialRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Stored row for a principal, bypassing the trait
    pub fn row(&self, principal_id: i64) -> Option<RenewalCredentialRow> {
        self.rows.get(&principal_id).map(|r| r.value().clone())
    }

    /// Make the next `n` upserts fail as a uniqueness conflict
    pub fn inject_upsert_conflicts(&self, n: u32) {
        self.conflicts_to_inject.store(n, Ordering::SeqCst);
    }

    /// Make `find_by_principal_id` fail
    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    /// Make `rotate_if_current` fail without touching the row
    pub fn fail_rotations(&self, fail: bool) {
        self.fail_rotations.store(fail, Ordering::SeqCst);
    }

    /// Make `rotate_if_current` report a lost race without touching the row
    pub fn lose_rotations(&self, lose: bool) {
        self.lose_rotations.store(lose, Ordering::SeqCst);
    }

    /// Make `delete_by_principal_id` fail
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    fn take_injected_conflict(&self) -> bool {
        self.conflicts_to_inject
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl RenewalCredentialRepository for MockRenewalCredentialRepository {
    async fn find_by_principal_id(&self, principal_id: i64) -> DbResult<Option<RenewalCredentialRow>> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self.row(principal_id))
    }

    async fn upsert(&self, credential: UpsertRenewalCredential) -> DbResult<RenewalCredentialRow> {
        if self.take_injected_conflict() {
            return Err(DbError::Conflict("renewal credential".to_string()));
        }

        let now = Utc::now();
        let row = match self.rows.entry(credential.principal_id) {
            Entry::Occupied(mut occupied) => {
                let row = occupied.get_mut();
                row.fingerprint = credential.fingerprint;
                row.rotation_id = credential.rotation_id;
                row.expires_at = credential.expires_at;
                row.updated_at = now;
                row.clone()
            }
            Entry::Vacant(vacant) => {
                let row = RenewalCredentialRow {
                    id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
                    principal_id: credential.principal_id,
                    fingerprint: credential.fingerprint,
                    rotation_id: credential.rotation_id,
                    expires_at: credential.expires_at,
                    created_at: now,
                    updated_at: now,
                };
                vacant.insert(row.clone());
                row
            }
        };
        Ok(row)
    }

    async fn rotate_if_current(&self, rotation: RotateRenewalCredential) -> DbResult<bool> {
        if self.fail_rotations.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        if self.lose_rotations.load(Ordering::SeqCst) {
            return Ok(false);
        }

        let Some(mut row) = self.rows.get_mut(&rotation.principal_id) else {
            return Ok(false);
        };

        if row.fingerprint != rotation.expected_fingerprint
            || row.rotation_id != rotation.expected_rotation_id
        {
            return Ok(false);
        }

        row.fingerprint = rotation.fingerprint;
        row.rotation_id = rotation.rotation_id;
        row.expires_at = rotation.expires_at;
        row.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete_by_principal_id(&self, principal_id: i64) -> DbResult<bool> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self.rows.remove(&principal_id).is_some())
    }
}

/// In-memory principal repository for testing
///
/// Deleting a principal or changing its password also deletes its renewal credential.
/// The credential delete runs first so a failure leaves the principal untouched, as a
/// rolled-back transaction would.
#[derive(Default, Clone)]
pub struct MockPrincipalRepository {
    principals: Arc<DashMap<i64, PrincipalRow>>,
    by_email: Arc<DashMap<String, i64>>,
    next_id: Arc<AtomicI64>,
    credentials: MockRenewalCredentialRepository,
}

impl MockPrincipalRepository {
    /// Principal repository cascading deletes into `credentials`
    pub fn new(credentials: MockRenewalCredentialRepository) -> Self {
        Self {
            credentials,
            ..Self::default()
        }
    }

    /// Stored principal, bypassing the trait
    pub fn row(&self, id: i64) -> Option<PrincipalRow> {
        self.principals.get(&id).map(|r| r.value().clone())
    }
}

#[async_trait]
impl PrincipalRepository for MockPrincipalRepository {
    async fn find_by_id(&self, id: i64) -> DbResult<Option<PrincipalRow>> {
        Ok(self.row(id))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<PrincipalRow>> {
        Ok(self
            .by_email
            .get(email)
            .and_then(|id| self.principals.get(id.value()).map(|r| r.value().clone())))
    }

    async fn create(&self, principal: CreatePrincipal) -> DbResult<PrincipalRow> {
        let vacant = match self.by_email.entry(principal.email.clone()) {
            Entry::Occupied(_) => return Err(DbError::Conflict("principal email".to_string())),
            Entry::Vacant(vacant) => vacant,
        };

        let now = Utc::now();
        let row = PrincipalRow {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            email: principal.email,
            password_hash: principal.password_hash,
            name: principal.name,
            created_at: now,
            updated_at: now,
        };
        self.principals.insert(row.id, row.clone());
        vacant.insert(row.id);
        Ok(row)
    }

    async fn update_password_and_revoke(&self, id: i64, password_hash: &str) -> DbResult<()> {
        if !self.principals.contains_key(&id) {
            return Err(DbError::NotFound);
        }
        self.credentials.delete_by_principal_id(id).await?;

        let mut row = self.principals.get_mut(&id).ok_or(DbError::NotFound)?;
        row.password_hash = password_hash.to_string();
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: i64) -> DbResult<()> {
        if !self.principals.contains_key(&id) {
            return Err(DbError::NotFound);
        }
        self.credentials.delete_by_principal_id(id).await?;

        let (_, row) = self.principals.remove(&id).ok_or(DbError::NotFound)?;
        self.by_email.remove(&row.email);
        Ok(())
    }
}

//! PostgreSQL renewal credential repository implementation

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{DbError, DbResult};
use crate::models::RenewalCredentialRow;
use crate::repo::{RenewalCredentialRepository, RotateRenewalCredential, UpsertRenewalCredential};

/// PostgreSQL renewal credential repository
#[derive(Clone)]
pub struct PgRenewalCredentialRepository {
    pool: PgPool,
}

impl PgRenewalCredentialRepository {
    /// Create a new renewal credential repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RenewalCredentialRepository for PgRenewalCredentialRepository {
    async fn find_by_principal_id(
        &self,
        principal_id: i64,
    ) -> DbResult<Option<RenewalCredentialRow>> {
        let row = sqlx::query_as::<_, RenewalCredentialRow>(
            r#"
            SELECT id, principal_id, fingerprint, rotation_id,
                   expires_at, created_at, updated_at
            FROM renewal_credentials
            WHERE principal_id = $1
            "#,
        )
        .bind(principal_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn upsert(&self, credential: UpsertRenewalCredential) -> DbResult<RenewalCredentialRow> {
        sqlx::query_as::<_, RenewalCredentialRow>(
            r#"
            INSERT INTO renewal_credentials (principal_id, fingerprint, rotation_id, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (principal_id)
            DO UPDATE SET fingerprint = EXCLUDED.fingerprint,
                          rotation_id = EXCLUDED.rotation_id,
                          expires_at = EXCLUDED.expires_at,
                          updated_at = NOW()
            RETURNING id, principal_id, fingerprint, rotation_id,
                      expires_at, created_at, updated_at
            "#,
        )
        .bind(credential.principal_id)
        .bind(&credential.fingerprint)
        .bind(&credential.rotation_id)
        .bind(credential.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from_write(e, "renewal credential"))
    }

    async fn rotate_if_current(&self, rotation: RotateRenewalCredential) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE renewal_credentials
            SET fingerprint = $4, rotation_id = $5, expires_at = $6, updated_at = NOW()
            WHERE principal_id = $1 AND fingerprint = $2 AND rotation_id = $3
            "#,
        )
        .bind(rotation.principal_id)
        .bind(&rotation.expected_fingerprint)
        .bind(&rotation.expected_rotation_id)
        .bind(&rotation.fingerprint)
        .bind(&rotation.rotation_id)
        .bind(rotation.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_by_principal_id(&self, principal_id: i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM renewal_credentials WHERE principal_id = $1")
            .bind(principal_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

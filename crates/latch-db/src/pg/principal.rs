//! PostgreSQL principal repository implementation

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{DbError, DbResult};
use crate::models::PrincipalRow;
use crate::repo::{CreatePrincipal, PrincipalRepository};

/// PostgreSQL principal repository
#[derive(Clone)]
pub struct PgPrincipalRepository {
    pool: PgPool,
}

impl PgPrincipalRepository {
    /// Create a new principal repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PrincipalRepository for PgPrincipalRepository {
    async fn find_by_id(&self, id: i64) -> DbResult<Option<PrincipalRow>> {
        let principal = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT id, email, password_hash, name, created_at, updated_at
            FROM principals
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(principal)
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<PrincipalRow>> {
        let principal = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT id, email, password_hash, name, created_at, updated_at
            FROM principals
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(principal)
    }

    async fn create(&self, principal: CreatePrincipal) -> DbResult<PrincipalRow> {
        sqlx::query_as::<_, PrincipalRow>(
            r#"
            INSERT INTO principals (email, password_hash, name)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, name, created_at, updated_at
            "#,
        )
        .bind(&principal.email)
        .bind(&principal.password_hash)
        .bind(&principal.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from_write(e, "principal email"))
    }

    async fn update_password_and_revoke(&self, id: i64, password_hash: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE principals SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        sqlx::query("DELETE FROM renewal_credentials WHERE principal_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn delete(&self, id: i64) -> DbResult<()> {
        // The FK cascades too; deleting explicitly keeps both in one visible transaction.
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM renewal_credentials WHERE principal_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM principals WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls it back
            return Err(DbError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }
}

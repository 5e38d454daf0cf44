//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, Utc};
use latch_types::PrincipalId;
use sqlx::FromRow;

/// Principal row from the database
#[derive(Debug, Clone, FromRow)]
pub struct PrincipalRow {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Renewal credential row from the database
///
/// At most one row exists per principal. `fingerprint` is the keyed digest of the most
/// recently issued renewal token, never the token itself.
#[derive(Debug, Clone, FromRow)]
pub struct RenewalCredentialRow {
    pub id: i64,
    pub principal_id: i64,
    pub fingerprint: String,
    pub rotation_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PrincipalRow {
    /// Convert to domain PrincipalId
    pub fn principal_id(&self) -> PrincipalId {
        PrincipalId(self.id)
    }
}

impl RenewalCredentialRow {
    /// Convert to domain PrincipalId
    pub fn principal_id(&self) -> PrincipalId {
        PrincipalId(self.principal_id)
    }
}

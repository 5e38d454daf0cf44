//! Database errors

use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Record not found
    #[error("record not found")]
    NotFound,

    /// Unique constraint violated
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DbError {
    /// Map a write error, turning unique violations into [`DbError::Conflict`]
    pub fn from_write(err: sqlx::Error, what: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                tracing::debug!(constraint = ?db.constraint(), "Unique violation on {}", what);
                Self::Conflict(what.to_string())
            }
            _ => Self::Sqlx(err),
        }
    }

    /// Whether the error came from a uniqueness constraint
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Result alias for repository operations
pub type DbResult<T> = Result<T, DbError>;

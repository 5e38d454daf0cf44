//! Auth errors

use thiserror::Error;

use crate::config::ConfigError;

/// Authentication errors
///
/// This is the boundary type. `Unauthenticated` covers every renewal or access token
/// problem and `InvalidCredentials` every login failure; neither carries the reason.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Wrong password or unknown identity
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed, expired, mistyped, superseded or revoked token
    #[error("unauthenticated")]
    Unauthenticated,

    /// Request is well-formed but not acceptable (blank fields, password rules)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Resource already exists
    #[error("conflict: {0}")]
    Conflict(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidCredentials | Self::Unauthenticated => 401,
            Self::InvalidRequest(_) => 400,
            Self::Conflict(_) => 409,
            Self::Database(_) | Self::Configuration(_) | Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<latch_db::DbError> for AuthError {
    fn from(err: latch_db::DbError) -> Self {
        match err {
            latch_db::DbError::Conflict(what) => Self::Conflict(what),
            other => {
                tracing::error!("Database error: {}", other);
                Self::Database(other.to_string())
            }
        }
    }
}

impl From<ConfigError> for AuthError {
    fn from(err: ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_failures_share_one_shape() {
        let err = AuthError::Unauthenticated;
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.error_code(), "UNAUTHENTICATED");
        assert_eq!(err.to_string(), "unauthenticated");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::InvalidCredentials.status_code(), 401);
        assert_eq!(AuthError::InvalidRequest("x".into()).status_code(), 400);
        assert_eq!(AuthError::Conflict("x".into()).status_code(), 409);
        assert_eq!(AuthError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn test_db_conflict_maps_to_conflict() {
        let err: AuthError = latch_db::DbError::Conflict("principal email".into()).into();
        assert!(matches!(err, AuthError::Conflict(ref what) if what == "principal email"));
    }

    #[test]
    fn test_db_not_found_maps_to_database() {
        let err: AuthError = latch_db::DbError::NotFound.into();
        assert_eq!(err.error_code(), "DATABASE_ERROR");
    }

    #[test]
    fn test_config_error_maps_to_configuration() {
        let err: AuthError = ConfigError::MissingIssuer.into();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }
}

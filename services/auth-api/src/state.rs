//! Application state

use std::ops::Deref;
use std::sync::Arc;

use latch_auth_core::SessionLifecycleService;
use latch_db::pg::{PgPrincipalRepository, PgRenewalCredentialRepository};
use latch_db::DbPool;

use crate::config::Config;

/// Type alias for the session service with concrete repository types
pub type SessionServiceImpl =
    SessionLifecycleService<PgPrincipalRepository, PgRenewalCredentialRepository>;

/// Shared database pool wrapper for health checks
#[derive(Clone)]
pub struct SharedPool(Arc<DbPool>);

impl Deref for SharedPool {
    type Target = DbPool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Session lifecycle service
    pub sessions: Arc<SessionServiceImpl>,
    /// Database connection pool (shared reference for health checks)
    pub pool: SharedPool,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(sessions: SessionServiceImpl, pool: DbPool, config: Config) -> Self {
        Self {
            sessions: Arc::new(sessions),
            pool: SharedPool(Arc::new(pool)),
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

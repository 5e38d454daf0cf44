//! PostgreSQL repository implementations

mod principal;
mod renewal_credential;

pub use principal::PgPrincipalRepository;
pub use renewal_credential::PgRenewalCredentialRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub principals: PgPrincipalRepository,
    pub renewal_credentials: PgRenewalCredentialRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            principals: PgPrincipalRepository::new(pool.clone()),
            renewal_credentials: PgRenewalCredentialRepository::new(pool),
        }
    }
}

//! Common test utilities for latch-auth-core integration tests

#![allow(dead_code)]

pub mod mock_repos;

use chrono::{DateTime, Utc};
use latch_auth_core::{
    AuthConfig, AuthError, ManualClock, PasswordEncoder, SessionLifecycleService,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub use mock_repos::{MockPrincipalRepository, MockRenewalCredentialRepository};

pub const SIGNING_SECRET: &str = "0123456789abcdef0123456789abcdef";
pub const HASHING_SECRET: &str = "fedcba9876543210fedcba9876543210";

pub const ACCESS_TTL_SECS: u64 = 900;
pub const RENEWAL_TTL_SECS: u64 = 1_209_600;

pub type TestService = SessionLifecycleService<MockPrincipalRepository, MockRenewalCredentialRepository>;

/// Reversible password "hash" so tests do not pay for Argon2
#[derive(Debug, Default)]
pub struct PlainPasswordEncoder {
    checks: AtomicUsize,
}

impl PlainPasswordEncoder {
    /// How many times `matches` ran
    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

impl PasswordEncoder for PlainPasswordEncoder {
    fn encode(&self, plain: &str) -> Result<String, AuthError> {
        Ok(format!("plain${plain}"))
    }

    fn matches(&self, plain: &str, hash: &str) -> bool {
        self.checks.fetch_add(1, Ordering::SeqCst);
        hash.strip_prefix("plain$") == Some(plain)
    }

    fn decoy_hash(&self) -> &str {
        "plain$\u{0}decoy"
    }
}

/// Service wired to in-memory repositories and a frozen clock
pub struct Harness {
    pub service: TestService,
    pub principals: MockPrincipalRepository,
    pub credentials: MockRenewalCredentialRepository,
    pub passwords: Arc<PlainPasswordEncoder>,
    pub clock: Arc<ManualClock>,
}

pub fn start() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

pub fn config() -> AuthConfig {
    AuthConfig::try_new("latch", SIGNING_SECRET, HASHING_SECRET)
        .unwrap()
        .with_access_token_ttl(Duration::from_secs(ACCESS_TTL_SECS))
        .with_renewal_token_ttl(Duration::from_secs(RENEWAL_TTL_SECS))
}

impl Harness {
    pub fn new() -> Self {
        let credentials = MockRenewalCredentialRepository::new();
        let principals = MockPrincipalRepository::new(credentials.clone());
        let passwords = Arc::new(PlainPasswordEncoder::default());
        let clock = Arc::new(ManualClock::new(start()));

        let service = SessionLifecycleService::new(
            config(),
            Arc::new(principals.clone()),
            Arc::new(credentials.clone()),
            passwords.clone(),
            clock.clone(),
        )
        .unwrap();

        Self {
            service,
            principals,
            credentials,
            passwords,
            clock,
        }
    }

    /// Register `email` with password `password` and return its ID
    pub async fn register(&self, email: &str, password: &str) -> i64 {
        self.service
            .signup(email, password, "Test User")
            .await
            .unwrap()
            .id
    }
}

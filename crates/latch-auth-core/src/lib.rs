//! Latch Auth Core - Token lifecycle business logic
//!
//! Signed bearer tokens, keyed renewal token fingerprints, the one-per-principal
//! renewal credential store and the login/reissue/logout rotation protocol.
//!
//! # Example
//!
//! ```rust,ignore
//! use latch_auth_core::{Argon2PasswordEncoder, AuthConfig, SessionLifecycleService, SystemClock};
//!
//! let config = AuthConfig::try_new("latch", signing_secret, hashing_secret)?;
//! let service = SessionLifecycleService::new(
//!     config,
//!     principals,
//!     credentials,
//!     Arc::new(Argon2PasswordEncoder::new()?),
//!     Arc::new(SystemClock),
//! )?;
//!
//! let pair = service.login("user@example.com", "password").await?;
//! let rotated = service.reissue(&pair.renewal_token).await?;
//! ```

pub mod clock;
pub mod config;
pub mod crypto;
pub mod error;
pub mod hasher;
pub mod password;
pub mod service;
pub mod store;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AuthConfig, ConfigError, MIN_SECRET_LENGTH};
pub use crypto::{constant_time_eq, constant_time_str_eq, HmacKey, HmacKeyError};
pub use error::*;
pub use hasher::CredentialHasher;
pub use password::{Argon2PasswordEncoder, PasswordEncoder};
pub use service::*;
pub use store::{RenewalCredentialRecord, RenewalCredentialStore};
pub use token::{BearerClaims, IssuedToken, TokenCodec, TokenError};

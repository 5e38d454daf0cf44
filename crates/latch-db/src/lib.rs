//! Latch DB - Database abstractions
//!
//! SQLx-based persistence for principals and their renewal credentials.
//!
//! # Example
//!
//! ```rust,ignore
//! use latch_db::{create_pool, Repositories, MIGRATOR};
//!
//! let pool = create_pool("postgres://localhost/latch").await?;
//! MIGRATOR.run(&pool).await?;
//! let repos = Repositories::new(pool);
//!
//! let principal = repos.principals.find_by_email("user@example.com").await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, create_pool_with_options, DbPool, PoolOptions};
pub use repo::*;

/// Embedded schema migrations
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

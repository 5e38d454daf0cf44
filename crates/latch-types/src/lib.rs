//! Latch Types - Shared domain types
//!
//! Types shared between the persistence layer, the auth core and the HTTP service:
//! - Principal identity
//! - Bearer token kinds

pub mod principal;
pub mod token;

pub use principal::*;
pub use token::*;

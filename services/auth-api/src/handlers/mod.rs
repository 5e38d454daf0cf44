//! HTTP handlers

mod auth;
mod health;
mod users;

pub use auth::{login, logout, reissue, signup};
pub use health::{health, ready};
pub use users::{change_password, me, withdraw};

//! HTTP middleware for the Café Lagune server.
//!
//! - [`auth`] - Session-backed extractors for the current user
//! - [`guard`] - Route guard: who may reach which path
//! - [`session`] - `SQLite`-backed tower-sessions layer

pub mod auth;
pub mod guard;
pub mod session;

pub use auth::{OptionalAuth, RequireAdmin, RequireAuth};

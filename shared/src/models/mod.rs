//! Data models
//!
//! Shared between the server and clients (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod catalog;
pub mod order;
pub mod role;

// Re-exports
pub use catalog::*;
pub use order::*;
pub use role::*;

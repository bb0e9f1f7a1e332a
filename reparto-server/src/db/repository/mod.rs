//! Repository Module
//!
//! Free async functions over the SQLite pool, grouped per table. No
//! repository structs and no shared container: callers pass the pool in.
//! The orders repository owns the conditional-update primitives every
//! race-sensitive operation is built on.

pub mod addresses;
pub mod drivers;
pub mod menu_items;
pub mod orders;
pub mod restaurants;
pub mod settings;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound("row not found".into()),
            other => RepoError::Database(other.to_string()),
        }
    }
}

impl From<RepoError> for shared::AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => shared::AppError::not_found(msg),
            RepoError::Database(msg) => shared::AppError::database(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

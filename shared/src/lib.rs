//! Shared types for the Reparto platform
//!
//! Common types used across the server and tooling: error codes,
//! API response structures, domain models, and ID/time utilities.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};

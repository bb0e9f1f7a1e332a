//! Unified error codes for the Reparto platform
//!
//! This module defines all error codes used across the server and clients.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Order intake errors
//! - 4xxx: Order lifecycle errors
//! - 5xxx: Driver errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 4,
    /// Value out of range
    ValueOutOfRange = 5,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1002,
    /// Token is invalid
    TokenInvalid = 1003,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,
    /// Caller does not own the resource
    NotResourceOwner = 2003,

    // ==================== 3xxx: Order intake ====================
    /// Restaurant is closed, inactive or not approved
    RestaurantUnavailable = 3001,
    /// Menu item is missing or no longer available
    ItemUnavailable = 3002,
    /// Delivery address does not belong to the customer
    AddressNotOwned = 3003,
    /// Cart contains no items
    EmptyCart = 3004,
    /// Cart subtotal is below the platform minimum
    BelowMinimumOrder = 3005,

    // ==================== 4xxx: Order lifecycle ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Status transition is not allowed
    InvalidTransition = 4002,
    /// Order has already been claimed by another driver
    AlreadyClaimed = 4003,
    /// Order is not ready for pickup
    OrderNotReady = 4004,
    /// Order has been archived
    OrderNotActive = 4005,
    /// Concurrent update won the race; caller should refresh and retry
    TransitionConflict = 4006,

    // ==================== 5xxx: Driver ====================
    /// Driver profile not found
    DriverNotFound = 5001,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Specific role is required",
            ErrorCode::NotResourceOwner => "Caller does not own this resource",

            // Order intake
            ErrorCode::RestaurantUnavailable => "Restaurant is not currently accepting orders",
            ErrorCode::ItemUnavailable => "Menu item is not available",
            ErrorCode::AddressNotOwned => "Delivery address does not belong to this customer",
            ErrorCode::EmptyCart => "Order must contain at least one item",
            ErrorCode::BelowMinimumOrder => "Order subtotal is below the minimum order amount",

            // Order lifecycle
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::InvalidTransition => "Order status transition is not allowed",
            ErrorCode::AlreadyClaimed => "Order has already been claimed by another driver",
            ErrorCode::OrderNotReady => "Order is not ready for pickup",
            ErrorCode::OrderNotActive => "Order has been archived",
            ErrorCode::TransitionConflict => "Order was modified concurrently, refresh and retry",

            // Driver
            ErrorCode::DriverNotFound => "Driver profile not found",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::InvalidRequest),
            5 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::TokenExpired),
            1003 => Ok(ErrorCode::TokenInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),
            2003 => Ok(ErrorCode::NotResourceOwner),

            // Order intake
            3001 => Ok(ErrorCode::RestaurantUnavailable),
            3002 => Ok(ErrorCode::ItemUnavailable),
            3003 => Ok(ErrorCode::AddressNotOwned),
            3004 => Ok(ErrorCode::EmptyCart),
            3005 => Ok(ErrorCode::BelowMinimumOrder),

            // Order lifecycle
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::InvalidTransition),
            4003 => Ok(ErrorCode::AlreadyClaimed),
            4004 => Ok(ErrorCode::OrderNotReady),
            4005 => Ok(ErrorCode::OrderNotActive),
            4006 => Ok(ErrorCode::TransitionConflict),

            // Driver
            5001 => Ok(ErrorCode::DriverNotFound),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

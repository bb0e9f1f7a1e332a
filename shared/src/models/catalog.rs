//! Catalog Models
//!
//! Restaurants, menu items, customer addresses and driver profiles. These
//! are the records order intake validates against; orders themselves keep
//! snapshots, so edits here never rewrite placed orders.

use serde::{Deserialize, Serialize};

/// Restaurant entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Restaurant {
    pub id: i64,
    /// Vendor user that manages this restaurant
    pub owner_id: i64,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    /// Vendor-controlled open/closed switch
    pub is_active: bool,
    /// "pending" | "approved" | "rejected"
    pub approval_status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Restaurant {
    /// Whether the restaurant may receive new orders
    pub fn accepts_orders(&self) -> bool {
        self.is_active && self.approval_status == "approved"
    }
}

/// Menu item entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MenuItem {
    pub id: i64,
    pub restaurant_id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub is_available: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Customer delivery address
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CustomerAddress {
    pub id: i64,
    pub customer_id: i64,
    pub label: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub is_default: bool,
    pub created_at: i64,
}

/// Driver profile
///
/// `id` doubles as the driver's user id. `last_seen_at` is refreshed on
/// every driver API call and swept by the liveness job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Driver {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub is_available: bool,
    /// Epoch ms of the driver's last activity
    pub last_seen_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

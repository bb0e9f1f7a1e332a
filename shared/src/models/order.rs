//! Order Model (订单)
//!
//! Orders are append-only snapshots: item names, descriptions and prices are
//! captured at creation time and never re-read from the menu, so later
//! catalog edits do not rewrite history. Status only moves through the
//! transitions validated by the server's state machine.

use serde::{Deserialize, Serialize};

/// Order lifecycle status
///
/// Terminal states are `delivered` and `cancelled`; no transition leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    PickedUp,
    EnRoute,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// All states, in lifecycle order
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::PickedUp,
        OrderStatus::EnRoute,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Lowercase wire/database representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::PickedUp => "picked_up",
            OrderStatus::EnRoute => "en_route",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Whether no further transition is permitted from this status
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "preparing" => Ok(OrderStatus::Preparing),
            "ready" => Ok(OrderStatus::Ready),
            "picked_up" => Ok(OrderStatus::PickedUp),
            "en_route" => Ok(OrderStatus::EnRoute),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// A customization chosen for an order item, snapshotted at creation
///
/// `price_modifier` is the per-unit surcharge (or discount if negative)
/// applied on top of the item's unit price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCustomization {
    pub name: String,
    #[serde(default)]
    pub price_modifier: f64,
}

/// Order record
///
/// Monetary fields are computed once at creation and never recalculated.
/// `driver_id` stays null until a driver claims the order; `is_active` is
/// cleared by the archiver for old terminal orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub restaurant_id: i64,
    /// Ownership-validated at creation; address CRUD lives outside this service
    pub delivery_address_id: i64,
    pub driver_id: Option<i64>,
    /// Restaurant display name captured at creation time
    pub restaurant_name: String,
    pub status: OrderStatus,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub delivery_fee: f64,
    pub total_amount: f64,
    pub special_instructions: Option<String>,
    pub cancellation_reason: Option<String>,
    /// Vendor estimate supplied when confirming, in minutes
    pub estimated_preparation_minutes: Option<i64>,
    /// Epoch ms; set on confirmation as now + preparation + delivery window
    pub estimated_delivery_at: Option<i64>,
    pub is_active: bool,
    /// Epoch ms timestamps; the status-specific ones are set by the
    /// transition that enters the status
    pub placed_at: i64,
    pub confirmed_at: Option<i64>,
    pub ready_at: Option<i64>,
    pub delivered_at: Option<i64>,
    pub cancelled_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line item - immutable snapshot of a menu item at order time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub menu_item_name: String,
    pub menu_item_description: String,
    pub unit_price: f64,
    pub quantity: i64,
    /// JSON array of customization snapshots
    #[cfg_attr(feature = "db", sqlx(json))]
    pub customizations: Vec<ItemCustomization>,
    pub item_instructions: Option<String>,
    pub total_price: f64,
    pub created_at: i64,
}

/// Order plus its line items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// One audit-trail entry for an order status change
///
/// `actor_id` is null for system-triggered changes (reconciliation jobs);
/// `from_status` is null for the creation entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderStatusHistoryEntry {
    pub id: i64,
    pub order_id: i64,
    pub actor_id: Option<i64>,
    pub actor_role: String,
    pub from_status: Option<OrderStatus>,
    pub to_status: OrderStatus,
    pub notes: Option<String>,
    pub created_at: i64,
}

/// Platform-wide order statistics (admin reporting)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderStats {
    pub total_orders: i64,
    pub pending_orders: i64,
    pub confirmed_orders: i64,
    pub preparing_orders: i64,
    pub ready_orders: i64,
    pub picked_up_orders: i64,
    pub en_route_orders: i64,
    pub delivered_orders: i64,
    pub cancelled_orders: i64,
    /// Sum of total_amount over delivered orders
    pub total_revenue: f64,
    /// Average total_amount over delivered orders (0 when none)
    pub average_order_value: f64,
}

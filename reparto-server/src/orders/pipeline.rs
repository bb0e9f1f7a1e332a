//! Order creation pipeline (下单流程)
//!
//! Validation order matters: restaurant availability, address ownership,
//! per-item catalog resolution, then pricing. Prices and names are always
//! resolved from the catalog at creation time, never taken from the client,
//! so the stored order stays accurate even if the menu changes later.

use serde::Deserialize;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{ItemCustomization, OrderDetail};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;
use validator::Validate;

use crate::db::repository::{addresses, menu_items, orders, restaurants};
use crate::orders::pricing::{self, PricingRates};

/// One requested line of a new order.
///
/// Only ids and quantities come from the client; the price attached to a
/// customization is re-validated but the catalog price never is taken from
/// here.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderItem {
    pub menu_item_id: i64,
    #[validate(range(min = 1, max = 999, message = "quantity must be between 1 and 999"))]
    pub quantity: i64,
    #[serde(default)]
    pub customizations: Vec<ItemCustomization>,
    #[validate(length(max = 500))]
    pub item_instructions: Option<String>,
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub restaurant_id: i64,
    pub delivery_address_id: i64,
    #[validate(nested)]
    pub items: Vec<CreateOrderItem>,
    #[validate(length(max = 500))]
    pub special_instructions: Option<String>,
}

/// Create one order atomically: validate, snapshot the catalog, price, persist.
///
/// Failure before the final insert leaves no partial rows; the insert itself
/// runs in a transaction covering the order, its items, and the first
/// history entry.
pub async fn create_order(
    pool: &SqlitePool,
    customer_id: i64,
    req: CreateOrderRequest,
) -> AppResult<OrderDetail> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    if req.items.is_empty() {
        return Err(AppError::new(ErrorCode::EmptyCart));
    }

    let restaurant = restaurants::find_by_id(pool, req.restaurant_id)
        .await?
        .ok_or_else(|| AppError::restaurant_unavailable(req.restaurant_id))?;
    if !restaurant.accepts_orders() {
        return Err(AppError::restaurant_unavailable(req.restaurant_id));
    }

    if !addresses::verify_ownership(pool, req.delivery_address_id, customer_id).await? {
        return Err(AppError::with_message(
            ErrorCode::AddressNotOwned,
            "delivery address does not belong to this customer",
        ));
    }

    let mut new_items = Vec::with_capacity(req.items.len());
    let mut line_totals = Vec::with_capacity(req.items.len());
    for line in &req.items {
        let item = menu_items::find_by_id(pool, line.menu_item_id)
            .await?
            .ok_or_else(|| AppError::item_unavailable(line.menu_item_id))?;
        if item.restaurant_id != restaurant.id || !item.is_available {
            return Err(AppError::item_unavailable(line.menu_item_id));
        }

        pricing::validate_line(item.price, line.quantity, &line.customizations)?;
        let total = pricing::line_total(item.price, line.quantity, &line.customizations);
        line_totals.push(total);
        new_items.push(orders::NewOrderItem {
            menu_item_id: item.id,
            menu_item_name: item.name,
            menu_item_description: item.description,
            unit_price: item.price,
            quantity: line.quantity,
            customizations: line.customizations.clone(),
            item_instructions: line.item_instructions.clone(),
            total_price: total,
        });
    }

    let rates = PricingRates::load(pool).await?;
    let totals = pricing::order_totals(&line_totals, &rates);
    if pricing::to_decimal(totals.subtotal) < pricing::to_decimal(rates.minimum_order_amount) {
        return Err(AppError::with_message(
            ErrorCode::BelowMinimumOrder,
            format!(
                "order subtotal {:.2} is below the minimum of {:.2}",
                totals.subtotal, rates.minimum_order_amount
            ),
        )
        .with_detail("minimum_order_amount", rates.minimum_order_amount));
    }

    let now = now_millis();
    let new_order = orders::NewOrder {
        id: snowflake_id(),
        customer_id,
        restaurant_id: restaurant.id,
        delivery_address_id: req.delivery_address_id,
        restaurant_name: restaurant.name,
        subtotal: totals.subtotal,
        tax_amount: totals.tax_amount,
        delivery_fee: totals.delivery_fee,
        total_amount: totals.total_amount,
        special_instructions: req.special_instructions,
        placed_at: now,
    };

    let detail = orders::create_with_items(pool, &new_order, &new_items, now).await?;
    tracing::info!(
        order_id = new_order.id,
        customer_id,
        restaurant_id = new_order.restaurant_id,
        total = totals.total_amount,
        "order created"
    );
    Ok(detail)
}

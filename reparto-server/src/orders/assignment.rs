//! Driver claim coordination
//!
//! Claiming is the one place where two actors genuinely race: any number of
//! drivers may try to take the same `ready` order at once. The repository
//! CAS (`status = 'ready' AND driver_id IS NULL`) lets exactly one win and
//! moves the order to `picked_up` with the winner assigned. Losers are told
//! why they lost so the driver app can refresh instead of retrying blindly.

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Order, OrderStatus};
use shared::util::now_millis;
use sqlx::SqlitePool;

use crate::db::repository::orders;

/// Default page size for the available-orders feed.
pub const DEFAULT_AVAILABLE_LIMIT: i64 = 50;

/// Atomically claim an unassigned `ready` order for `driver_id`.
///
/// On success the returned order is `picked_up` with the driver assigned.
/// A lost race is classified by re-reading the row: someone else claimed it,
/// it never reached `ready`, or it was archived.
pub async fn claim(pool: &SqlitePool, order_id: i64, driver_id: i64) -> AppResult<Order> {
    let now = now_millis();

    let won = orders::claim(pool, order_id, driver_id, now).await?;
    if !won {
        let order = orders::find_by_id(pool, order_id)
            .await?
            .ok_or_else(|| AppError::order_not_found(order_id))?;
        if !order.is_active {
            return Err(AppError::new(ErrorCode::OrderNotActive));
        }
        if order.driver_id.is_some() {
            return Err(AppError::already_claimed(order_id));
        }
        return Err(AppError::order_not_ready(order.status.as_str()));
    }

    orders::append_history(
        pool,
        &orders::NewHistoryEntry {
            order_id,
            actor_id: Some(driver_id),
            actor_role: "driver".to_string(),
            from_status: Some(OrderStatus::Ready),
            to_status: OrderStatus::PickedUp,
            notes: Some("claimed for delivery".to_string()),
        },
        now,
    )
    .await?;

    tracing::info!(order_id, driver_id, "order claimed");

    orders::find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| AppError::order_not_found(order_id))
}

/// Unassigned `ready` orders, oldest first so the queue is fair.
pub async fn list_available(pool: &SqlitePool, limit: i64) -> AppResult<Vec<Order>> {
    let limit = if limit <= 0 { DEFAULT_AVAILABLE_LIMIT } else { limit };
    Ok(orders::list_available(pool, limit).await?)
}

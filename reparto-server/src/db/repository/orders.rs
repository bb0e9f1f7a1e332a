//! Order repository
//!
//! Owns the two conditional-update primitives the rest of the system is
//! built on: [`transition_status`] (status compare-and-set) and [`claim`]
//! (driver assignment). Everything else is plain reads and the atomic
//! create. No in-process locking; SQLite serializes the writes.

use sqlx::SqlitePool;

use shared::models::{
    ItemCustomization, Order, OrderDetail, OrderItem, OrderStats, OrderStatus,
    OrderStatusHistoryEntry,
};

use super::{RepoError, RepoResult};

const ORDER_COLUMNS: &str = "id, customer_id, restaurant_id, delivery_address_id, driver_id, \
     restaurant_name, status, subtotal, tax_amount, delivery_fee, total_amount, \
     special_instructions, cancellation_reason, estimated_preparation_minutes, \
     estimated_delivery_at, is_active, placed_at, confirmed_at, ready_at, delivered_at, \
     cancelled_at, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, menu_item_id, menu_item_name, menu_item_description, \
     unit_price, quantity, customizations, item_instructions, total_price, created_at";

const HISTORY_COLUMNS: &str =
    "id, order_id, actor_id, actor_role, from_status, to_status, notes, created_at";

/// Order row as the creation pipeline persists it (id is pre-generated)
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: i64,
    pub customer_id: i64,
    pub restaurant_id: i64,
    pub delivery_address_id: i64,
    pub restaurant_name: String,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub delivery_fee: f64,
    pub total_amount: f64,
    pub special_instructions: Option<String>,
    pub placed_at: i64,
}

/// Line-item snapshot for [`create_with_items`]
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub menu_item_id: i64,
    pub menu_item_name: String,
    pub menu_item_description: String,
    pub unit_price: f64,
    pub quantity: i64,
    pub customizations: Vec<ItemCustomization>,
    pub item_instructions: Option<String>,
    pub total_price: f64,
}

/// Audit-trail row for [`append_history`]
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub order_id: i64,
    pub actor_id: Option<i64>,
    pub actor_role: String,
    pub from_status: Option<OrderStatus>,
    pub to_status: OrderStatus,
    pub notes: Option<String>,
}

/// Extra columns applied together with a status transition
#[derive(Debug, Clone, Default)]
pub struct TransitionFields {
    pub cancellation_reason: Option<String>,
    pub estimated_preparation_minutes: Option<i64>,
    pub estimated_delivery_at: Option<i64>,
}

/// LIMIT/OFFSET window for list queries
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

/// Admin-side list filters; all optional, combined with AND
#[derive(Debug, Clone, Default)]
pub struct AdminOrderFilter {
    pub status: Option<OrderStatus>,
    pub customer_id: Option<i64>,
    pub restaurant_id: Option<i64>,
    pub driver_id: Option<i64>,
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(order)
}

/// Order plus its line items
pub async fn find_detail(pool: &SqlitePool, id: i64) -> RepoResult<Option<OrderDetail>> {
    let Some(order) = find_by_id(pool, id).await? else {
        return Ok(None);
    };
    let items = list_items(pool, id).await?;
    Ok(Some(OrderDetail { order, items }))
}

pub async fn list_items(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ? ORDER BY id"
    ))
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

pub async fn list_history(
    pool: &SqlitePool,
    order_id: i64,
) -> RepoResult<Vec<OrderStatusHistoryEntry>> {
    let entries = sqlx::query_as::<_, OrderStatusHistoryEntry>(&format!(
        "SELECT {HISTORY_COLUMNS} FROM order_status_history WHERE order_id = ? ORDER BY id"
    ))
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(entries)
}

/// Persist an order, all its items and the creation history row in one
/// transaction. Any failure rolls the whole order back; no partial order
/// can exist.
pub async fn create_with_items(
    pool: &SqlitePool,
    order: &NewOrder,
    items: &[NewOrderItem],
    now: i64,
) -> RepoResult<OrderDetail> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO orders (id, customer_id, restaurant_id, delivery_address_id, \
         restaurant_name, status, subtotal, tax_amount, delivery_fee, total_amount, \
         special_instructions, is_active, placed_at, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, 'pending', ?, ?, ?, ?, ?, 1, ?, ?, ?)",
    )
    .bind(order.id)
    .bind(order.customer_id)
    .bind(order.restaurant_id)
    .bind(order.delivery_address_id)
    .bind(&order.restaurant_name)
    .bind(order.subtotal)
    .bind(order.tax_amount)
    .bind(order.delivery_fee)
    .bind(order.total_amount)
    .bind(&order.special_instructions)
    .bind(order.placed_at)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    for item in items {
        sqlx::query(
            "INSERT INTO order_items (order_id, menu_item_id, menu_item_name, \
             menu_item_description, unit_price, quantity, customizations, \
             item_instructions, total_price, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(order.id)
        .bind(item.menu_item_id)
        .bind(&item.menu_item_name)
        .bind(&item.menu_item_description)
        .bind(item.unit_price)
        .bind(item.quantity)
        .bind(sqlx::types::Json(&item.customizations))
        .bind(&item.item_instructions)
        .bind(item.total_price)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        "INSERT INTO order_status_history (order_id, actor_id, actor_role, from_status, \
         to_status, notes, created_at) VALUES (?, ?, 'customer', NULL, 'pending', NULL, ?)",
    )
    .bind(order.id)
    .bind(order.customer_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    find_detail(pool, order.id)
        .await?
        .ok_or_else(|| RepoError::Database("order vanished after insert".into()))
}

/// Status compare-and-set: applies the transition iff the stored status
/// still equals `from` at the moment of the UPDATE. Returns whether a row
/// was changed. The caller decides what a `false` means (conflict vs
/// stale read).
pub async fn transition_status(
    pool: &SqlitePool,
    id: i64,
    from: OrderStatus,
    to: OrderStatus,
    fields: &TransitionFields,
    now: i64,
) -> RepoResult<bool> {
    let mut sets = vec!["status = ?", "updated_at = ?"];
    match to {
        OrderStatus::Confirmed => sets.push("confirmed_at = ?"),
        OrderStatus::Ready => sets.push("ready_at = ?"),
        OrderStatus::Delivered => sets.push("delivered_at = ?"),
        OrderStatus::Cancelled => sets.push("cancelled_at = ?"),
        _ => {}
    }
    if fields.cancellation_reason.is_some() {
        sets.push("cancellation_reason = ?");
    }
    if fields.estimated_preparation_minutes.is_some() {
        sets.push("estimated_preparation_minutes = ?");
    }
    if fields.estimated_delivery_at.is_some() {
        sets.push("estimated_delivery_at = ?");
    }

    let sql = format!(
        "UPDATE orders SET {} WHERE id = ? AND status = ?",
        sets.join(", ")
    );

    let mut query = sqlx::query(&sql).bind(to.as_str()).bind(now);
    if matches!(
        to,
        OrderStatus::Confirmed | OrderStatus::Ready | OrderStatus::Delivered | OrderStatus::Cancelled
    ) {
        query = query.bind(now);
    }
    if let Some(reason) = &fields.cancellation_reason {
        query = query.bind(reason);
    }
    if let Some(minutes) = fields.estimated_preparation_minutes {
        query = query.bind(minutes);
    }
    if let Some(at) = fields.estimated_delivery_at {
        query = query.bind(at);
    }

    let result = query.bind(id).bind(from.as_str()).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

/// Driver-assignment compare-and-set. Exactly one of N concurrent callers
/// can win: the UPDATE only matches while the order is `ready`, unclaimed
/// and still active. The winner takes the order straight to `picked_up`.
pub async fn claim(
    pool: &SqlitePool,
    order_id: i64,
    driver_id: i64,
    now: i64,
) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE orders SET status = 'picked_up', driver_id = ?, updated_at = ? \
         WHERE id = ? AND status = 'ready' AND driver_id IS NULL AND is_active = 1",
    )
    .bind(driver_id)
    .bind(now)
    .bind(order_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn append_history(
    pool: &SqlitePool,
    entry: &NewHistoryEntry,
    now: i64,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO order_status_history (order_id, actor_id, actor_role, from_status, \
         to_status, notes, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(entry.order_id)
    .bind(entry.actor_id)
    .bind(&entry.actor_role)
    .bind(entry.from_status.map(|s| s.as_str()))
    .bind(entry.to_status.as_str())
    .bind(&entry.notes)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_by_customer(
    pool: &SqlitePool,
    customer_id: i64,
    status: Option<OrderStatus>,
    page: Page,
) -> RepoResult<Vec<Order>> {
    let mut sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = ? AND is_active = 1"
    );
    if status.is_some() {
        sql.push_str(" AND status = ?");
    }
    sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");

    let mut query = sqlx::query_as::<_, Order>(&sql).bind(customer_id);
    if let Some(status) = status {
        query = query.bind(status.as_str());
    }
    let orders = query
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(pool)
        .await?;
    Ok(orders)
}

/// Orders of a vendor's restaurants. Empty restaurant set short-circuits
/// to an empty page.
pub async fn list_by_restaurants(
    pool: &SqlitePool,
    restaurant_ids: &[i64],
    status: Option<OrderStatus>,
    page: Page,
) -> RepoResult<Vec<Order>> {
    if restaurant_ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; restaurant_ids.len()].join(", ");
    let mut sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders \
         WHERE restaurant_id IN ({placeholders}) AND is_active = 1"
    );
    if status.is_some() {
        sql.push_str(" AND status = ?");
    }
    sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");

    let mut query = sqlx::query_as::<_, Order>(&sql);
    for id in restaurant_ids {
        query = query.bind(id);
    }
    if let Some(status) = status {
        query = query.bind(status.as_str());
    }
    let orders = query
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(pool)
        .await?;
    Ok(orders)
}

pub async fn list_by_driver(
    pool: &SqlitePool,
    driver_id: i64,
    status: Option<OrderStatus>,
    page: Page,
) -> RepoResult<Vec<Order>> {
    let mut sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE driver_id = ? AND is_active = 1"
    );
    if status.is_some() {
        sql.push_str(" AND status = ?");
    }
    sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");

    let mut query = sqlx::query_as::<_, Order>(&sql).bind(driver_id);
    if let Some(status) = status {
        query = query.bind(status.as_str());
    }
    let orders = query
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(pool)
        .await?;
    Ok(orders)
}

/// Admin list with combined filters; also returns the total match count
/// for the pagination envelope.
pub async fn list_admin(
    pool: &SqlitePool,
    filter: &AdminOrderFilter,
    page: Page,
) -> RepoResult<(Vec<Order>, i64)> {
    let mut conditions = String::from("is_active = 1");
    if filter.status.is_some() {
        conditions.push_str(" AND status = ?");
    }
    if filter.customer_id.is_some() {
        conditions.push_str(" AND customer_id = ?");
    }
    if filter.restaurant_id.is_some() {
        conditions.push_str(" AND restaurant_id = ?");
    }
    if filter.driver_id.is_some() {
        conditions.push_str(" AND driver_id = ?");
    }

    let list_sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE {conditions} \
         ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
    );
    let count_sql = format!("SELECT COUNT(*) FROM orders WHERE {conditions}");

    let mut list_query = sqlx::query_as::<_, Order>(&list_sql);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(status) = filter.status {
        list_query = list_query.bind(status.as_str());
        count_query = count_query.bind(status.as_str());
    }
    if let Some(id) = filter.customer_id {
        list_query = list_query.bind(id);
        count_query = count_query.bind(id);
    }
    if let Some(id) = filter.restaurant_id {
        list_query = list_query.bind(id);
        count_query = count_query.bind(id);
    }
    if let Some(id) = filter.driver_id {
        list_query = list_query.bind(id);
        count_query = count_query.bind(id);
    }

    let orders = list_query
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(pool)
        .await?;
    let total = count_query.fetch_one(pool).await?;
    Ok((orders, total))
}

/// Unclaimed ready orders, oldest first (FIFO). Ids are time-ordered, so
/// `id ASC` is a consistent tie-break.
pub async fn list_available(pool: &SqlitePool, limit: i64) -> RepoResult<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders \
         WHERE status = 'ready' AND driver_id IS NULL AND is_active = 1 \
         ORDER BY created_at ASC, id ASC LIMIT ?"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(orders)
}

/// Pending orders placed before `cutoff` (sweep input)
pub async fn list_stale_pending(
    pool: &SqlitePool,
    cutoff: i64,
    limit: i64,
) -> RepoResult<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders \
         WHERE status = 'pending' AND placed_at < ? AND is_active = 1 \
         ORDER BY placed_at ASC LIMIT ?"
    ))
    .bind(cutoff)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(orders)
}

/// Clear `is_active` on terminal orders older than `cutoff`; returns the
/// number of rows archived.
pub async fn archive_terminal_before(pool: &SqlitePool, cutoff: i64, now: i64) -> RepoResult<u64> {
    let result = sqlx::query(
        "UPDATE orders SET is_active = 0, updated_at = ? \
         WHERE status IN ('delivered', 'cancelled') AND updated_at < ? AND is_active = 1",
    )
    .bind(now)
    .bind(cutoff)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Platform-wide aggregates (includes archived orders)
pub async fn stats(pool: &SqlitePool) -> RepoResult<OrderStats> {
    let stats = sqlx::query_as::<_, OrderStats>(
        "SELECT \
           COUNT(*) AS total_orders, \
           COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0) AS pending_orders, \
           COALESCE(SUM(CASE WHEN status = 'confirmed' THEN 1 ELSE 0 END), 0) AS confirmed_orders, \
           COALESCE(SUM(CASE WHEN status = 'preparing' THEN 1 ELSE 0 END), 0) AS preparing_orders, \
           COALESCE(SUM(CASE WHEN status = 'ready' THEN 1 ELSE 0 END), 0) AS ready_orders, \
           COALESCE(SUM(CASE WHEN status = 'picked_up' THEN 1 ELSE 0 END), 0) AS picked_up_orders, \
           COALESCE(SUM(CASE WHEN status = 'en_route' THEN 1 ELSE 0 END), 0) AS en_route_orders, \
           COALESCE(SUM(CASE WHEN status = 'delivered' THEN 1 ELSE 0 END), 0) AS delivered_orders, \
           COALESCE(SUM(CASE WHEN status = 'cancelled' THEN 1 ELSE 0 END), 0) AS cancelled_orders, \
           COALESCE(SUM(CASE WHEN status = 'delivered' THEN total_amount ELSE 0 END), 0.0) AS total_revenue, \
           COALESCE(AVG(CASE WHEN status = 'delivered' THEN total_amount END), 0.0) AS average_order_value \
         FROM orders",
    )
    .fetch_one(pool)
    .await?;
    Ok(stats)
}

//! Background sweep tests
//!
//! Each sweep is exercised directly through its `sweep_once` entry point
//! with hand-backdated rows, so no test ever sleeps on a timer.

mod common;

use common::{CUSTOMER_ID, DRIVER_ID, VENDOR_ID};
use reparto_server::db::repository::drivers;
use reparto_server::db::repository::orders::{self, Page};
use reparto_server::jobs::{archiver, driver_liveness, stale_orders};
use reparto_server::orders::TransitionActor;
use reparto_server::orders::transitions::{TransitionRequest, apply_transition};
use shared::models::OrderStatus;
use shared::util::now_millis;
use tokio_util::sync::CancellationToken;

const MINUTE_MS: i64 = 60 * 1000;
const DAY_MS: i64 = 24 * 60 * MINUTE_MS;

async fn backdate_placed_at(state: &reparto_server::core::ServerState, order_id: i64, at: i64) {
    sqlx::query("UPDATE orders SET placed_at = ? WHERE id = ?")
        .bind(at)
        .bind(order_id)
        .execute(&state.pool)
        .await
        .expect("backdate placed_at");
}

async fn backdate_updated_at(state: &reparto_server::core::ServerState, order_id: i64, at: i64) {
    sqlx::query("UPDATE orders SET updated_at = ? WHERE id = ?")
        .bind(at)
        .bind(order_id)
        .execute(&state.pool)
        .await
        .expect("backdate updated_at");
}

#[tokio::test]
async fn test_stale_pending_orders_are_cancelled_by_the_system() {
    let (_dir, state) = common::test_state().await;
    let shop = common::seed_storefront(&state).await;

    let stale = common::place_order(&state, &shop, 2).await;
    let fresh = common::place_order(&state, &shop, 2).await;
    backdate_placed_at(&state, stale.order.id, now_millis() - 31 * MINUTE_MS).await;

    let cancelled = stale_orders::sweep_once(&state, &CancellationToken::new()).await;
    assert_eq!(cancelled, 1);

    let swept = orders::find_by_id(&state.pool, stale.order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(swept.status, OrderStatus::Cancelled);
    assert!(swept.cancelled_at.is_some());
    assert_eq!(
        swept.cancellation_reason.as_deref(),
        Some("Order not confirmed by vendor within 30 minutes")
    );

    let history = orders::list_history(&state.pool, stale.order.id)
        .await
        .unwrap();
    let row = history.last().unwrap();
    assert_eq!(row.actor_role, "system");
    assert_eq!(row.actor_id, None);
    assert_eq!(row.to_status, OrderStatus::Cancelled);

    // The order inside the window is untouched
    let kept = orders::find_by_id(&state.pool, fresh.order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kept.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_confirmed_orders_are_not_swept() {
    let (_dir, state) = common::test_state().await;
    let shop = common::seed_storefront(&state).await;

    let detail = common::place_order(&state, &shop, 2).await;
    backdate_placed_at(&state, detail.order.id, now_millis() - 2 * 60 * MINUTE_MS).await;
    apply_transition(
        &state.pool,
        TransitionRequest::new(
            detail.order.id,
            OrderStatus::Confirmed,
            TransitionActor::Vendor(VENDOR_ID),
        ),
    )
    .await
    .unwrap();

    let cancelled = stale_orders::sweep_once(&state, &CancellationToken::new()).await;
    assert_eq!(cancelled, 0);

    let order = orders::find_by_id(&state.pool, detail.order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Confirmed);
}

#[tokio::test]
async fn test_stale_sweep_stops_on_shutdown() {
    let (_dir, state) = common::test_state().await;
    let shop = common::seed_storefront(&state).await;

    let detail = common::place_order(&state, &shop, 2).await;
    backdate_placed_at(&state, detail.order.id, now_millis() - 31 * MINUTE_MS).await;

    let shutdown = CancellationToken::new();
    shutdown.cancel();
    let cancelled = stale_orders::sweep_once(&state, &shutdown).await;
    assert_eq!(cancelled, 0);

    let order = orders::find_by_id(&state.pool, detail.order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_archiver_deactivates_old_terminal_orders() {
    let (_dir, state) = common::test_state().await;
    let shop = common::seed_storefront(&state).await;

    let old = common::place_order(&state, &shop, 2).await;
    common::advance_order(&state, old.order.id, OrderStatus::Delivered).await;
    let recent = common::place_order(&state, &shop, 2).await;
    common::advance_order(&state, recent.order.id, OrderStatus::Delivered).await;
    backdate_updated_at(&state, old.order.id, now_millis() - 91 * DAY_MS).await;

    let archived = archiver::sweep_once(&state).await;
    assert_eq!(archived, 1);

    let order = orders::find_by_id(&state.pool, old.order.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!order.is_active);
    assert_eq!(order.status, OrderStatus::Delivered);

    // Archived orders drop out of customer listings
    let page = Page { limit: 20, offset: 0 };
    let visible = orders::list_by_customer(&state.pool, CUSTOMER_ID, None, page)
        .await
        .unwrap();
    assert_eq!(visible.iter().map(|o| o.id).collect::<Vec<_>>(), vec![recent.order.id]);

    // But the reporting totals still count them
    let stats = orders::stats(&state.pool).await.unwrap();
    assert_eq!(stats.total_orders, 2);
    assert_eq!(stats.delivered_orders, 2);
    assert_eq!(stats.total_revenue, 60.00);
    assert_eq!(stats.average_order_value, 30.00);
}

#[tokio::test]
async fn test_archiver_leaves_live_and_recent_orders_alone() {
    let (_dir, state) = common::test_state().await;
    let shop = common::seed_storefront(&state).await;

    // Old but still in flight
    let in_flight = common::place_order(&state, &shop, 2).await;
    backdate_updated_at(&state, in_flight.order.id, now_millis() - 91 * DAY_MS).await;

    // Terminal but recent
    let recent = common::place_order(&state, &shop, 2).await;
    common::advance_order(&state, recent.order.id, OrderStatus::Delivered).await;

    let archived = archiver::sweep_once(&state).await;
    assert_eq!(archived, 0);

    for id in [in_flight.order.id, recent.order.id] {
        let order = orders::find_by_id(&state.pool, id).await.unwrap().unwrap();
        assert!(order.is_active);
    }
}

#[tokio::test]
async fn test_silent_drivers_lose_availability_until_next_activity() {
    let (_dir, state) = common::test_state().await;

    let now = now_millis();
    drivers::upsert(&state.pool, DRIVER_ID, "Lena", now - 31 * MINUTE_MS)
        .await
        .unwrap();
    drivers::upsert(&state.pool, DRIVER_ID + 1, "Marco", now)
        .await
        .unwrap();

    let updated = driver_liveness::sweep_once(&state).await;
    assert_eq!(updated, 1);

    let silent = drivers::find_by_id(&state.pool, DRIVER_ID)
        .await
        .unwrap()
        .unwrap();
    assert!(!silent.is_available);
    let active = drivers::find_by_id(&state.pool, DRIVER_ID + 1)
        .await
        .unwrap()
        .unwrap();
    assert!(active.is_available);

    // Any fresh activity restores availability
    drivers::touch_last_seen(&state.pool, DRIVER_ID, now_millis())
        .await
        .unwrap();
    let back = drivers::find_by_id(&state.pool, DRIVER_ID)
        .await
        .unwrap()
        .unwrap();
    assert!(back.is_available);
    assert_eq!(driver_liveness::sweep_once(&state).await, 0);
}

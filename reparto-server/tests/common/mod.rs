//! Shared test fixtures
//!
//! Every test gets its own SQLite database inside a fresh temp directory.
//! The returned `TempDir` must be kept alive for as long as the state is
//! in use, or the database files disappear under the pool.

#![allow(dead_code)]

use tempfile::TempDir;

use reparto_server::core::{Config, ServerState};
use reparto_server::db::DbService;
use reparto_server::db::repository::{addresses, menu_items, orders, restaurants, settings};
use reparto_server::orders::TransitionActor;
use reparto_server::orders::assignment;
use reparto_server::orders::pipeline::{self, CreateOrderItem, CreateOrderRequest};
use reparto_server::orders::transitions::{TransitionRequest, apply_transition};
use shared::models::{OrderDetail, OrderStatus, Role};
use shared::util::now_millis;

pub const CUSTOMER_ID: i64 = 501;
pub const VENDOR_ID: i64 = 502;
pub const DRIVER_ID: i64 = 503;
pub const ADMIN_ID: i64 = 504;

/// Config with test-friendly values; thresholds stay at production
/// defaults because the sweeps are invoked directly, never on a timer.
pub fn test_config(work_dir: &str) -> Config {
    Config {
        work_dir: work_dir.to_string(),
        http_port: 0,
        environment: "development".into(),
        jwt_secret: "test-secret".into(),
        jwt_issuer: "reparto-server".into(),
        jwt_audience: "reparto-clients".into(),
        token_duration_hours: 1,
        stale_pending_minutes: 30,
        stale_sweep_secs: 60,
        archive_after_days: 90,
        archive_sweep_secs: 86400,
        driver_stale_minutes: 30,
        driver_sweep_secs: 300,
    }
}

/// Fresh server state over a throwaway database (migrations applied)
pub async fn test_state() -> (TempDir, ServerState) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let db_path = dir.path().join("reparto.db");
    let db = DbService::connect(&db_path.to_string_lossy())
        .await
        .expect("open test database");
    let config = test_config(&dir.path().to_string_lossy());
    let state = ServerState::with_pool(config, db.pool);
    (dir, state)
}

/// One approved restaurant, two menu items and a delivery address.
///
/// Rates are pinned to 8% tax and a 3.00 delivery fee so a two-pizza cart
/// prices to subtotal 25.00, tax 2.00, total 30.00 exactly.
pub struct Storefront {
    pub restaurant_id: i64,
    /// Margherita, 12.50
    pub pizza_id: i64,
    /// Garlic bread, 4.50
    pub bread_id: i64,
    pub address_id: i64,
}

pub async fn seed_storefront(state: &ServerState) -> Storefront {
    let now = now_millis();
    let pool = &state.pool;

    settings::set(pool, settings::KEY_TAX_RATE, "0.08", now)
        .await
        .expect("set tax rate");
    settings::set(pool, settings::KEY_DELIVERY_FEE, "3.00", now)
        .await
        .expect("set delivery fee");
    settings::set(pool, settings::KEY_MINIMUM_ORDER_AMOUNT, "10.00", now)
        .await
        .expect("set minimum order amount");

    let restaurant_id = restaurants::create(
        pool,
        &restaurants::NewRestaurant {
            owner_id: VENDOR_ID,
            name: "Trattoria Da Mario".into(),
            address: "12 Via Roma".into(),
            phone: None,
            is_active: true,
            approval_status: "approved".into(),
        },
        now,
    )
    .await
    .expect("seed restaurant");

    let pizza_id = menu_items::create(
        pool,
        &menu_items::NewMenuItem {
            restaurant_id,
            name: "Margherita".into(),
            description: "Tomato, mozzarella, basil".into(),
            price: 12.50,
            is_available: true,
        },
        now,
    )
    .await
    .expect("seed pizza");

    let bread_id = menu_items::create(
        pool,
        &menu_items::NewMenuItem {
            restaurant_id,
            name: "Garlic bread".into(),
            description: "With herb butter".into(),
            price: 4.50,
            is_available: true,
        },
        now,
    )
    .await
    .expect("seed garlic bread");

    let address_id = addresses::create(
        pool,
        &addresses::NewAddress {
            customer_id: CUSTOMER_ID,
            label: "Home".into(),
            street: "221B Baker Street".into(),
            city: "London".into(),
            postal_code: "NW1 6XE".into(),
        },
        now,
    )
    .await
    .expect("seed address");

    Storefront {
        restaurant_id,
        pizza_id,
        bread_id,
        address_id,
    }
}

/// Place a pending order of `quantity` pizzas through the pipeline
pub async fn place_order(
    state: &ServerState,
    shop: &Storefront,
    quantity: i64,
) -> OrderDetail {
    pipeline::create_order(
        &state.pool,
        CUSTOMER_ID,
        CreateOrderRequest {
            restaurant_id: shop.restaurant_id,
            delivery_address_id: shop.address_id,
            items: vec![CreateOrderItem {
                menu_item_id: shop.pizza_id,
                quantity,
                customizations: vec![],
                item_instructions: None,
            }],
            special_instructions: None,
        },
    )
    .await
    .expect("create order")
}

/// Drive an order forward to `target` through the normal flow: vendor
/// confirms and prepares, the fixture driver claims and delivers. Steps
/// the order has already passed are skipped.
pub async fn advance_order(state: &ServerState, order_id: i64, target: OrderStatus) {
    use OrderStatus::*;
    let current = orders::find_by_id(&state.pool, order_id)
        .await
        .expect("load order")
        .expect("order exists")
        .status;
    let rank = |s: OrderStatus| OrderStatus::ALL.iter().position(|x| *x == s).unwrap();
    for to in [Confirmed, Preparing, Ready, PickedUp, EnRoute, Delivered] {
        if rank(to) <= rank(current) {
            continue;
        }
        match to {
            Confirmed | Preparing | Ready => {
                apply_transition(
                    &state.pool,
                    TransitionRequest::new(order_id, to, TransitionActor::Vendor(VENDOR_ID)),
                )
                .await
                .expect("vendor step");
            }
            PickedUp => {
                assignment::claim(&state.pool, order_id, DRIVER_ID)
                    .await
                    .expect("driver claim");
            }
            EnRoute | Delivered => {
                apply_transition(
                    &state.pool,
                    TransitionRequest::new(order_id, to, TransitionActor::Driver(DRIVER_ID)),
                )
                .await
                .expect("driver step");
            }
            _ => unreachable!(),
        }
        if to == target {
            break;
        }
    }
}

/// Authorization header value for a freshly minted token
pub fn bearer(state: &ServerState, id: i64, username: &str, role: Role) -> String {
    let token = state
        .jwt
        .create_token(id, username, role)
        .expect("create token");
    format!("Bearer {token}")
}

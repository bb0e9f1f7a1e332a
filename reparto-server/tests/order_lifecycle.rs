//! Order lifecycle integration tests
//!
//! Creation through the pricing pipeline, the full happy path to
//! delivery, and the rejection cases: skipped states, late cancels,
//! terminal states and intake validation.

mod common;

use common::{ADMIN_ID, CUSTOMER_ID, DRIVER_ID, VENDOR_ID};
use reparto_server::db::repository::{addresses, menu_items, orders, restaurants};
use reparto_server::orders::TransitionActor;
use reparto_server::orders::pipeline::{self, CreateOrderItem, CreateOrderRequest};
use reparto_server::orders::transitions::{TransitionRequest, apply_transition};
use shared::error::ErrorCode;
use shared::models::{ItemCustomization, OrderStatus};
use shared::util::now_millis;

#[tokio::test]
async fn test_create_order_prices_the_cart() {
    let (_dir, state) = common::test_state().await;
    let shop = common::seed_storefront(&state).await;

    let detail = common::place_order(&state, &shop, 2).await;
    let order = &detail.order;

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.customer_id, CUSTOMER_ID);
    assert_eq!(order.restaurant_name, "Trattoria Da Mario");
    assert_eq!(order.driver_id, None);
    assert!(order.is_active);

    // 12.50 x 2 at 8% tax with a 3.00 delivery fee
    assert_eq!(order.subtotal, 25.00);
    assert_eq!(order.tax_amount, 2.00);
    assert_eq!(order.delivery_fee, 3.00);
    assert_eq!(order.total_amount, 30.00);

    assert_eq!(detail.items.len(), 1);
    let line = &detail.items[0];
    assert_eq!(line.menu_item_name, "Margherita");
    assert_eq!(line.unit_price, 12.50);
    assert_eq!(line.quantity, 2);
    assert_eq!(line.total_price, 25.00);

    // Creation writes the first history row
    let history = orders::list_history(&state.pool, order.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].from_status, None);
    assert_eq!(history[0].to_status, OrderStatus::Pending);
    assert_eq!(history[0].actor_role, "customer");
    assert_eq!(history[0].actor_id, Some(CUSTOMER_ID));
}

#[tokio::test]
async fn test_customizations_price_into_the_line() {
    let (_dir, state) = common::test_state().await;
    let shop = common::seed_storefront(&state).await;

    let detail = pipeline::create_order(
        &state.pool,
        CUSTOMER_ID,
        CreateOrderRequest {
            restaurant_id: shop.restaurant_id,
            delivery_address_id: shop.address_id,
            items: vec![CreateOrderItem {
                menu_item_id: shop.pizza_id,
                quantity: 2,
                customizations: vec![ItemCustomization {
                    name: "extra cheese".into(),
                    price_modifier: 1.50,
                }],
                item_instructions: Some("well done".into()),
            }],
            special_instructions: None,
        },
    )
    .await
    .unwrap();

    // (12.50 + 1.50) x 2
    assert_eq!(detail.items[0].total_price, 28.00);
    assert_eq!(detail.order.subtotal, 28.00);
    assert_eq!(detail.items[0].customizations.len(), 1);
    assert_eq!(detail.items[0].item_instructions.as_deref(), Some("well done"));
}

#[tokio::test]
async fn test_order_snapshot_survives_catalog_changes() {
    let (_dir, state) = common::test_state().await;
    let shop = common::seed_storefront(&state).await;

    let detail = common::place_order(&state, &shop, 2).await;

    // Taking the item off the menu must not rewrite existing orders
    menu_items::set_available(&state.pool, shop.pizza_id, false, now_millis())
        .await
        .unwrap();

    let reread = orders::find_detail(&state.pool, detail.order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reread.items[0].menu_item_name, "Margherita");
    assert_eq!(reread.items[0].unit_price, 12.50);
    assert_eq!(reread.order.total_amount, 30.00);

    // But new orders for the unavailable item are rejected
    let err = pipeline::create_order(
        &state.pool,
        CUSTOMER_ID,
        CreateOrderRequest {
            restaurant_id: shop.restaurant_id,
            delivery_address_id: shop.address_id,
            items: vec![CreateOrderItem {
                menu_item_id: shop.pizza_id,
                quantity: 1,
                customizations: vec![],
                item_instructions: None,
            }],
            special_instructions: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::ItemUnavailable);
}

#[tokio::test]
async fn test_full_lifecycle_to_delivered() {
    let (_dir, state) = common::test_state().await;
    let shop = common::seed_storefront(&state).await;
    let detail = common::place_order(&state, &shop, 2).await;
    let id = detail.order.id;

    let before = now_millis();
    let confirmed = apply_transition(
        &state.pool,
        TransitionRequest::new(id, OrderStatus::Confirmed, TransitionActor::Vendor(VENDOR_ID))
            .with_preparation_minutes(Some(20)),
    )
    .await
    .unwrap();
    assert_eq!(confirmed.status, OrderStatus::Confirmed);
    assert!(confirmed.confirmed_at.is_some());
    assert_eq!(confirmed.estimated_preparation_minutes, Some(20));

    // Estimate = confirmation time + preparation + 30 minute delivery window
    let estimate = confirmed.estimated_delivery_at.expect("estimate set");
    let expected = before + 50 * 60_000;
    assert!((estimate - expected).abs() < 5_000, "estimate {estimate} vs {expected}");

    common::advance_order(&state, id, OrderStatus::Delivered).await;

    let order = orders::find_by_id(&state.pool, id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
    assert_eq!(order.driver_id, Some(DRIVER_ID));
    assert!(order.ready_at.is_some());
    assert!(order.delivered_at.is_some());

    // Money fields never change after creation
    assert_eq!(order.subtotal, 25.00);
    assert_eq!(order.total_amount, 30.00);

    // Creation + confirmed/preparing/ready/picked_up/en_route/delivered
    let history = orders::list_history(&state.pool, id).await.unwrap();
    assert_eq!(history.len(), 7);
    assert_eq!(history[6].to_status, OrderStatus::Delivered);
    assert_eq!(history[6].actor_role, "driver");
    let claim_row = &history[4];
    assert_eq!(claim_row.from_status, Some(OrderStatus::Ready));
    assert_eq!(claim_row.to_status, OrderStatus::PickedUp);
    assert_eq!(claim_row.notes.as_deref(), Some("claimed for delivery"));
}

#[tokio::test]
async fn test_skipping_states_is_rejected() {
    let (_dir, state) = common::test_state().await;
    let shop = common::seed_storefront(&state).await;
    let detail = common::place_order(&state, &shop, 2).await;

    let err = apply_transition(
        &state.pool,
        TransitionRequest::new(
            detail.order.id,
            OrderStatus::Ready,
            TransitionActor::Vendor(VENDOR_ID),
        ),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidTransition);

    // The order did not move
    let order = orders::find_by_id(&state.pool, detail.order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_repeating_a_transition_is_rejected() {
    let (_dir, state) = common::test_state().await;
    let shop = common::seed_storefront(&state).await;
    let detail = common::place_order(&state, &shop, 2).await;
    common::advance_order(&state, detail.order.id, OrderStatus::Confirmed).await;

    let err = apply_transition(
        &state.pool,
        TransitionRequest::new(
            detail.order.id,
            OrderStatus::Confirmed,
            TransitionActor::Vendor(VENDOR_ID),
        ),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidTransition);
}

#[tokio::test]
async fn test_customer_cancel_window_closes_at_preparing() {
    let (_dir, state) = common::test_state().await;
    let shop = common::seed_storefront(&state).await;
    let detail = common::place_order(&state, &shop, 2).await;
    let id = detail.order.id;
    common::advance_order(&state, id, OrderStatus::Preparing).await;

    // Food is being made: the customer may no longer cancel
    let err = apply_transition(
        &state.pool,
        TransitionRequest::new(id, OrderStatus::Cancelled, TransitionActor::Customer(CUSTOMER_ID))
            .with_reason("changed my mind"),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);

    // The system sweep is similarly locked out past confirmation
    let err = apply_transition(
        &state.pool,
        TransitionRequest::new(id, OrderStatus::Cancelled, TransitionActor::System),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);

    // An admin override still works and records the reason
    let cancelled = apply_transition(
        &state.pool,
        TransitionRequest::new(id, OrderStatus::Cancelled, TransitionActor::Admin(ADMIN_ID))
            .with_reason("restaurant kitchen fire"),
    )
    .await
    .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(
        cancelled.cancellation_reason.as_deref(),
        Some("restaurant kitchen fire")
    );
    assert!(cancelled.cancelled_at.is_some());
}

#[tokio::test]
async fn test_customer_cancels_before_preparation() {
    let (_dir, state) = common::test_state().await;
    let shop = common::seed_storefront(&state).await;
    let detail = common::place_order(&state, &shop, 2).await;
    common::advance_order(&state, detail.order.id, OrderStatus::Confirmed).await;

    let cancelled = apply_transition(
        &state.pool,
        TransitionRequest::new(
            detail.order.id,
            OrderStatus::Cancelled,
            TransitionActor::Customer(CUSTOMER_ID),
        )
        .with_reason("ordered the wrong thing"),
    )
    .await
    .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_terminal_states_have_no_exits() {
    let (_dir, state) = common::test_state().await;
    let shop = common::seed_storefront(&state).await;
    let detail = common::place_order(&state, &shop, 2).await;
    let id = detail.order.id;
    common::advance_order(&state, id, OrderStatus::Delivered).await;

    // Even an admin cancel must bounce off a delivered order
    let err = apply_transition(
        &state.pool,
        TransitionRequest::new(id, OrderStatus::Cancelled, TransitionActor::Admin(ADMIN_ID))
            .with_reason("too late"),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidTransition);
}

#[tokio::test]
async fn test_vendor_cannot_touch_foreign_orders() {
    let (_dir, state) = common::test_state().await;
    let shop = common::seed_storefront(&state).await;
    let detail = common::place_order(&state, &shop, 2).await;

    let err = apply_transition(
        &state.pool,
        TransitionRequest::new(
            detail.order.id,
            OrderStatus::Confirmed,
            TransitionActor::Vendor(VENDOR_ID + 1),
        ),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotResourceOwner);
}

#[tokio::test]
async fn test_intake_rejections() {
    let (_dir, state) = common::test_state().await;
    let shop = common::seed_storefront(&state).await;
    let pool = &state.pool;

    let base = |items: Vec<CreateOrderItem>| CreateOrderRequest {
        restaurant_id: shop.restaurant_id,
        delivery_address_id: shop.address_id,
        items,
        special_instructions: None,
    };
    let pizza = |quantity: i64| CreateOrderItem {
        menu_item_id: shop.pizza_id,
        quantity,
        customizations: vec![],
        item_instructions: None,
    };

    // Empty cart
    let err = pipeline::create_order(pool, CUSTOMER_ID, base(vec![]))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::EmptyCart);

    // Zero quantity never reaches pricing
    let err = pipeline::create_order(pool, CUSTOMER_ID, base(vec![pizza(0)]))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);

    // One garlic bread (4.50) is below the 10.00 minimum
    let err = pipeline::create_order(
        pool,
        CUSTOMER_ID,
        base(vec![CreateOrderItem {
            menu_item_id: shop.bread_id,
            quantity: 1,
            customizations: vec![],
            item_instructions: None,
        }]),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::BelowMinimumOrder);

    // Someone else's delivery address
    let foreign_address = addresses::create(
        pool,
        &addresses::NewAddress {
            customer_id: CUSTOMER_ID + 1,
            label: "Work".into(),
            street: "1 Infinite Loop".into(),
            city: "Cupertino".into(),
            postal_code: "95014".into(),
        },
        now_millis(),
    )
    .await
    .unwrap();
    let err = pipeline::create_order(
        pool,
        CUSTOMER_ID,
        CreateOrderRequest {
            restaurant_id: shop.restaurant_id,
            delivery_address_id: foreign_address,
            items: vec![pizza(1)],
            special_instructions: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::AddressNotOwned);

    // Restaurant that never passed approval
    let unapproved = restaurants::create(
        pool,
        &restaurants::NewRestaurant {
            owner_id: VENDOR_ID,
            name: "Ghost Kitchen".into(),
            address: "Nowhere 1".into(),
            phone: None,
            is_active: true,
            approval_status: "pending".into(),
        },
        now_millis(),
    )
    .await
    .unwrap();
    let err = pipeline::create_order(
        pool,
        CUSTOMER_ID,
        CreateOrderRequest {
            restaurant_id: unapproved,
            delivery_address_id: shop.address_id,
            items: vec![pizza(1)],
            special_instructions: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::RestaurantUnavailable);

    // Item from a different restaurant's menu
    let other_restaurant = restaurants::create(
        pool,
        &restaurants::NewRestaurant {
            owner_id: VENDOR_ID + 1,
            name: "Sushi Go".into(),
            address: "5 Fish Lane".into(),
            phone: None,
            is_active: true,
            approval_status: "approved".into(),
        },
        now_millis(),
    )
    .await
    .unwrap();
    let foreign_item = menu_items::create(
        pool,
        &menu_items::NewMenuItem {
            restaurant_id: other_restaurant,
            name: "Nigiri set".into(),
            description: "Eight pieces".into(),
            price: 18.00,
            is_available: true,
        },
        now_millis(),
    )
    .await
    .unwrap();
    let err = pipeline::create_order(
        pool,
        CUSTOMER_ID,
        base(vec![CreateOrderItem {
            menu_item_id: foreign_item,
            quantity: 1,
            customizations: vec![],
            item_instructions: None,
        }]),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::ItemUnavailable);
}

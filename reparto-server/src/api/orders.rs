//! Customer order API
//!
//! Creation, listing and cancellation are customer-only. Detail and
//! history are shared with every party involved in the order, so those
//! routes carry their own access check instead of a role gate.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    middleware as axum_middleware,
    routing::{get, post},
};
use http::StatusCode;
use serde::Deserialize;
use sqlx::SqlitePool;

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Order, OrderDetail, OrderStatus, OrderStatusHistoryEntry, Role};

use crate::auth::{CurrentUser, require_role};
use crate::core::ServerState;
use crate::db::repository::{orders, restaurants};
use crate::orders::TransitionActor;
use crate::orders::pipeline::{self, CreateOrderRequest};
use crate::orders::transitions::{TransitionRequest, apply_transition};

/// Customer order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    // 下单、列表、取消仅限顾客
    let customer_routes = Router::new()
        .route("/", post(create).get(list))
        .route("/{id}/cancel", post(cancel))
        .route_layer(axum_middleware::from_fn(require_role(Role::Customer)));

    // 详情与历史对订单相关方开放 (处理器内校验)
    Router::new()
        .route("/{id}", get(get_by_id))
        .route("/{id}/history", get(history))
        .merge(customer_routes)
}

/// Query params for listing own orders
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<OrderStatus>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    super::DEFAULT_PER_PAGE
}

/// Place a new order
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<OrderDetail>)> {
    let detail = pipeline::create_order(&state.pool, user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// List the calling customer's orders (paginated, newest first)
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let page = super::page_window(query.page, query.per_page);
    let orders = orders::list_by_customer(&state.pool, user.id, query.status, page).await?;
    Ok(Json(orders))
}

/// Get order detail (order + line items)
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    let detail = orders::find_detail(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::order_not_found(id))?;
    check_view_access(&state.pool, &detail.order, &user).await?;
    Ok(Json(detail))
}

/// Cancel request body
#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

/// Cancel an own order (only allowed before preparation starts)
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<CancelRequest>,
) -> AppResult<Json<Order>> {
    let mut req = TransitionRequest::new(
        id,
        OrderStatus::Cancelled,
        TransitionActor::Customer(user.id),
    );
    if let Some(reason) = payload.reason {
        req = req.with_reason(reason);
    }
    let order = apply_transition(&state.pool, req).await?;
    Ok(Json(order))
}

/// Get the status audit trail of an order
pub async fn history(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<OrderStatusHistoryEntry>>> {
    let order = orders::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::order_not_found(id))?;
    check_view_access(&state.pool, &order, &user).await?;
    let entries = orders::list_history(&state.pool, id).await?;
    Ok(Json(entries))
}

/// 订单相关方校验：顾客本人、餐厅老板、被指派司机或管理员
async fn check_view_access(
    pool: &SqlitePool,
    order: &Order,
    user: &CurrentUser,
) -> AppResult<()> {
    let allowed = match user.role {
        Role::Admin => true,
        Role::Customer => order.customer_id == user.id,
        Role::Driver => order.driver_id == Some(user.id),
        Role::Vendor => restaurants::find_by_id(pool, order.restaurant_id)
            .await?
            .map(|r| r.owner_id == user.id)
            .unwrap_or(false),
    };
    if allowed {
        Ok(())
    } else {
        Err(AppError::with_message(
            ErrorCode::NotResourceOwner,
            "order does not involve this user",
        ))
    }
}

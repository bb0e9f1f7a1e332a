//! Driver order API
//!
//! 司机侧接口：浏览待认领订单、抢单、推进配送状态。
//! 每次调用都会刷新司机的 `last_seen_at`，静默超时的司机由
//! 后台任务标记为不可用。

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    middleware as axum_middleware,
    routing::{get, post},
};
use serde::Deserialize;

use shared::error::AppResult;
use shared::models::{Order, OrderStatus, Role};
use shared::util::now_millis;

use crate::auth::{CurrentUser, require_role};
use crate::core::ServerState;
use crate::db::repository::{drivers, orders};
use crate::orders::TransitionActor;
use crate::orders::assignment;
use crate::orders::transitions::{TransitionRequest, apply_transition};

/// Driver order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/driver/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/available", get(available))
        .route("/mine", get(mine))
        .route("/{id}/claim", post(claim))
        .route("/{id}/status", post(update_status))
        .route_layer(axum_middleware::from_fn(require_role(Role::Driver)))
}

/// Refresh the calling driver's profile and liveness timestamp
async fn record_activity(state: &ServerState, user: &CurrentUser) -> AppResult<()> {
    let now = now_millis();
    drivers::upsert(&state.pool, user.id, &user.username, now).await?;
    drivers::touch_last_seen(&state.pool, user.id, now).await?;
    Ok(())
}

/// Query params for the available-orders feed
#[derive(Debug, Deserialize)]
pub struct AvailableQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    assignment::DEFAULT_AVAILABLE_LIMIT
}

/// List unclaimed ready orders, oldest first
pub async fn available(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<AvailableQuery>,
) -> AppResult<Json<Vec<Order>>> {
    record_activity(&state, &user).await?;
    let limit = query.limit.min(super::MAX_PER_PAGE);
    let orders = assignment::list_available(&state.pool, limit).await?;
    Ok(Json(orders))
}

/// Claim a ready order for delivery
///
/// Exactly one of any set of concurrent claimers wins; the winner gets
/// the order back as `picked_up` with themselves assigned.
pub async fn claim(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    record_activity(&state, &user).await?;
    let order = assignment::claim(&state.pool, id, user.id).await?;
    Ok(Json(order))
}

/// Query params for listing assigned orders
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

/// List orders assigned to the calling driver
pub async fn mine(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Order>>> {
    record_activity(&state, &user).await?;
    let page = super::page_window(query.page, query.per_page);
    let orders = orders::list_by_driver(&state.pool, user.id, query.status, page).await?;
    Ok(Json(orders))
}

/// Status update request body
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    pub notes: Option<String>,
}

/// Advance a claimed order along the delivery states
pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<Order>> {
    record_activity(&state, &user).await?;
    let req = TransitionRequest::new(id, payload.status, TransitionActor::Driver(user.id))
        .with_notes(payload.notes);
    let order = apply_transition(&state.pool, req).await?;
    Ok(Json(order))
}

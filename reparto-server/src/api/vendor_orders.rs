//! Vendor order API
//!
//! 商家侧接口：查看自家餐厅的订单并推进厨房状态
//! (确认、备餐、出餐，以及在备餐前取消)。

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    middleware as axum_middleware,
    routing::{get, post},
};
use serde::Deserialize;

use shared::error::{AppError, AppResult};
use shared::models::{Order, OrderStatus, Role};

use crate::auth::{CurrentUser, require_role};
use crate::core::ServerState;
use crate::db::repository::{orders, restaurants};
use crate::orders::TransitionActor;
use crate::orders::transitions::{TransitionRequest, apply_transition};

/// Vendor order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/vendor/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}/status", post(update_status))
        .route_layer(axum_middleware::from_fn(require_role(Role::Vendor)))
}

/// Query params for listing restaurant orders
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

/// List orders across all restaurants owned by the calling vendor
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let restaurant_ids = restaurants::list_ids_by_owner(&state.pool, user.id).await?;
    let page = super::page_window(query.page, query.per_page);
    let orders =
        orders::list_by_restaurants(&state.pool, &restaurant_ids, query.status, page).await?;
    Ok(Json(orders))
}

/// Status update request body
///
/// `estimated_preparation_minutes` is only read when confirming;
/// `reason` is required when cancelling.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    pub estimated_preparation_minutes: Option<i64>,
    pub notes: Option<String>,
    pub reason: Option<String>,
}

/// Move an order through the kitchen states (or cancel it)
pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<Order>> {
    let mut req = TransitionRequest::new(id, payload.status, TransitionActor::Vendor(user.id))
        .with_preparation_minutes(payload.estimated_preparation_minutes)
        .with_notes(payload.notes);

    if payload.status == OrderStatus::Cancelled {
        let reason = payload
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| AppError::validation("cancellation requires a reason"))?;
        req = req.with_reason(reason);
    }

    let order = apply_transition(&state.pool, req).await?;
    Ok(Json(order))
}

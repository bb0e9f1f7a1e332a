//! Admin order API
//!
//! Platform-wide oversight: global order search, override cancellation
//! and aggregate statistics. Admins do not drive the normal lifecycle;
//! the only transition they may force is a cancel.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    middleware as axum_middleware,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use shared::error::{AppError, AppResult};
use shared::models::{Order, OrderStats, OrderStatus, Role};

use crate::auth::{CurrentUser, require_role};
use crate::core::ServerState;
use crate::db::repository::orders::{self, AdminOrderFilter};
use crate::orders::TransitionActor;
use crate::orders::transitions::{TransitionRequest, apply_transition};

/// Admin order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/admin/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(list))
        .route("/stats", get(stats))
        .route("/{id}/cancel", post(cancel))
        .route_layer(axum_middleware::from_fn(require_role(Role::Admin)))
}

/// Query params for the global order list
#[derive(Debug, Deserialize)]
pub struct AdminListQuery {
    pub status: Option<OrderStatus>,
    pub customer_id: Option<i64>,
    pub restaurant_id: Option<i64>,
    pub driver_id: Option<i64>,
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

/// Paginated list plus the total match count
#[derive(Debug, Serialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// List orders across the whole platform, with optional filters
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<AdminListQuery>,
) -> AppResult<Json<OrderPage>> {
    let filter = AdminOrderFilter {
        status: query.status,
        customer_id: query.customer_id,
        restaurant_id: query.restaurant_id,
        driver_id: query.driver_id,
    };
    let page = super::page_window(query.page, query.per_page);
    let (orders, total) = orders::list_admin(&state.pool, &filter, page).await?;
    Ok(Json(OrderPage {
        orders,
        total,
        page: query.page.max(1),
        per_page: page.limit,
    }))
}

/// Cancel request body; a reason is mandatory for overrides
#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

/// Force-cancel any live order
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<CancelRequest>,
) -> AppResult<Json<Order>> {
    let reason = payload
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AppError::validation("cancellation requires a reason"))?;

    let req = TransitionRequest::new(id, OrderStatus::Cancelled, TransitionActor::Admin(user.id))
        .with_reason(reason);
    let order = apply_transition(&state.pool, req).await?;
    Ok(Json(order))
}

/// Platform-wide order statistics
pub async fn stats(State(state): State<ServerState>) -> AppResult<Json<OrderStats>> {
    let stats = orders::stats(&state.pool).await?;
    Ok(Json(stats))
}

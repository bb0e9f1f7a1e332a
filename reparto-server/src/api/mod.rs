//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查 (公共路由)
//! - [`orders`] - 顾客订单接口 (下单、查询、取消)
//! - [`vendor_orders`] - 商家订单接口 (确认、备餐、出餐)
//! - [`driver_orders`] - 司机订单接口 (认领、配送)
//! - [`admin_orders`] - 管理端订单接口 (全局查询、强制取消、统计)

use axum::Router;
use axum::middleware as axum_middleware;
use http::{HeaderName, HeaderValue};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::require_auth;
use crate::core::ServerState;
use crate::db::repository::orders::Page;

pub mod admin_orders;
pub mod driver_orders;
pub mod health;
pub mod orders;
pub mod vendor_orders;

/// Default page size for list endpoints
pub const DEFAULT_PER_PAGE: i64 = 20;
/// Hard cap on page size
pub const MAX_PER_PAGE: i64 = 100;

/// Clamp user-supplied pagination into a LIMIT/OFFSET window.
///
/// `page` starts at 1; out-of-range values fall back to the first page
/// and the default page size rather than erroring.
pub(crate) fn page_window(page: i64, per_page: i64) -> Page {
    let page = page.max(1);
    let per_page = if (1..=MAX_PER_PAGE).contains(&per_page) {
        per_page
    } else {
        DEFAULT_PER_PAGE
    };
    Page {
        limit: per_page,
        offset: (page - 1) * per_page,
    }
}

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        Some(RequestId::new(HeaderValue::from_str(&id).unwrap()))
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        // Customer API - customer role required
        .merge(orders::router())
        // Vendor API - vendor role required
        .merge(vendor_orders::router())
        // Driver API - driver role required
        .merge(driver_orders::router())
        // Admin API - admin role required
        .merge(admin_orders::router())
        // Health API - public route
        .merge(health::router())
}

/// Build a fully configured application with all middleware and state
///
/// This is used by both the HTTP server and the integration tests
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    build_router()
        // ========== Tower HTTP Middleware ==========
        // CORS - Handle cross-origin requests
        .layer(CorsLayer::permissive())
        // Compression - Gzip compress responses
        .layer(CompressionLayer::new())
        // Trace - Request tracing (logs at INFO level)
        .layer(TraceLayer::new_for_http())
        // ========== Application Middleware ==========
        // Propagate request ID to response
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        // Request ID - Generate unique ID for each request
        // (added after Propagate so it runs first on the request path;
        // `Router::layer` makes the last-added layer outermost)
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        // JWT authentication - executes before routes, injects CurrentUser
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ))
}

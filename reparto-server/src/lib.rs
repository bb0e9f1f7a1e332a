//! Reparto Server - 外卖订单生命周期服务
//!
//! Order lifecycle and driver-assignment backend for the Reparto
//! food-delivery platform.
//!
//! # 模块结构
//!
//! ```text
//! reparto-server/src/
//! ├── core/          # 配置、状态、后台任务
//! ├── auth/          # JWT 认证、角色检查
//! ├── db/            # SQLite 连接池和仓储层
//! ├── orders/        # 状态机、定价、创建管道、司机认领
//! ├── jobs/          # 定时对账任务
//! └── api/           # HTTP 路由和处理器
//! ```
//!
//! All coordination between concurrent requests goes through the store's
//! conditional UPDATE; there are no in-process locks around order state.

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod jobs;
pub mod orders;

// Re-export common types
pub use auth::{CurrentUser, JwtService};
pub use core::{BackgroundTasks, Config, ServerState, TaskKind};
pub use shared::{ApiResponse, AppError, AppResult, ErrorCode};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

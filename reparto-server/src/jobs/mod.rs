//! Scheduled reconciliation jobs (定时任务)
//!
//! 周期任务注册为 `TaskKind::Periodic`，在 `start_background_tasks()` 中启动，
//! 通过 CancellationToken 优雅退出。
//!
//! - [`stale_orders`] - cancels pending orders the restaurant never confirmed
//! - [`archiver`] - retires old terminal orders from the hot set
//! - [`driver_liveness`] - clears the availability flag of silent drivers

pub mod archiver;
pub mod driver_liveness;
pub mod stale_orders;

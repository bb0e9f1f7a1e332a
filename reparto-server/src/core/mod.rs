//! 核心模块 - 服务器配置、状态和后台任务
//!
//! - [`Config`] - 服务器配置
//! - [`ServerState`] - 服务器状态
//! - [`BackgroundTasks`] - 后台任务管理器

pub mod config;
pub mod state;
pub mod tasks;

pub use config::Config;
pub use state::ServerState;
pub use tasks::{BackgroundTasks, TaskKind};

//! Server state
//!
//! [`ServerState`] holds the shared handles every request needs: config,
//! the SQLite pool and the JWT service. It is cloned into each handler;
//! all fields are cheap to clone. There is no service container beyond
//! this struct - repositories are free functions over the pool.

use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::auth::JwtService;
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::Config;
use crate::db::DbService;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration (immutable after startup)
    pub config: Config,
    /// SQLite connection pool
    pub pool: SqlitePool,
    /// JWT validation service
    pub jwt: Arc<JwtService>,
    /// Background task registry; `None` after shutdown
    tasks: Arc<Mutex<Option<BackgroundTasks>>>,
}

impl ServerState {
    /// Initialize server state: database pool, migrations, JWT service.
    pub async fn initialize(config: &Config) -> Result<Self, BoxError> {
        let db = DbService::new(config).await?;

        let jwt = Arc::new(JwtService::from_config(config));

        Ok(Self {
            config: config.clone(),
            pool: db.pool,
            jwt,
            tasks: Arc::new(Mutex::new(Some(BackgroundTasks::new()))),
        })
    }

    /// Build a state over an existing pool (tests)
    pub fn with_pool(config: Config, pool: SqlitePool) -> Self {
        let jwt = Arc::new(JwtService::from_config(&config));
        Self {
            config,
            pool,
            jwt,
            tasks: Arc::new(Mutex::new(Some(BackgroundTasks::new()))),
        }
    }

    /// Register and start the reconciliation jobs.
    ///
    /// Must be called once, after migrations have run.
    pub async fn start_background_tasks(&self) {
        let mut guard = self.tasks.lock().await;
        let Some(tasks) = guard.as_mut() else {
            tracing::warn!("start_background_tasks called after shutdown");
            return;
        };

        let token = tasks.shutdown_token();

        // Seed platform settings once so pricing reads see explicit rows
        let pool = self.pool.clone();
        tasks.spawn("settings_seed", TaskKind::Warmup, async move {
            if let Err(e) = crate::db::repository::settings::seed_defaults(&pool).await {
                tracing::error!(error = %e, "Failed to seed platform settings");
            }
        });

        tasks.spawn(
            "stale_pending_canceller",
            TaskKind::Periodic,
            crate::jobs::stale_orders::run(self.clone(), token.clone()),
        );
        tasks.spawn(
            "order_archiver",
            TaskKind::Periodic,
            crate::jobs::archiver::run(self.clone(), token.clone()),
        );
        tasks.spawn(
            "driver_liveness",
            TaskKind::Periodic,
            crate::jobs::driver_liveness::run(self.clone(), token),
        );

        tasks.log_summary();
    }

    /// Cancel the jobs and wait for them to stop.
    pub async fn shutdown_background_tasks(&self) {
        let tasks = self.tasks.lock().await.take();
        if let Some(tasks) = tasks {
            tasks.shutdown().await;
        }
    }

    /// Database liveness probe for the health endpoint
    pub async fn ping_db(&self) -> Result<(), sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

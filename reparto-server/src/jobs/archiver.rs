//! Terminal-order archiver
//!
//! Delivered and cancelled orders older than the retention window drop out
//! of the hot set (`is_active = 0`). Rows are kept, so admin stats still see
//! the full history; every list endpoint filters them out.

use std::time::Duration;

use shared::util::now_millis;
use tokio_util::sync::CancellationToken;

use crate::core::ServerState;
use crate::db::repository::orders;

pub async fn run(state: ServerState, shutdown: CancellationToken) {
    tracing::info!(
        interval_secs = state.config.archive_sweep_secs,
        retention_days = state.config.archive_after_days,
        "Order archiver started"
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(state.config.archive_sweep_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("Order archiver received shutdown signal");
                return;
            }
            _ = ticker.tick() => {}
        }
        sweep_once(&state).await;
    }
}

/// One pass: deactivate terminal orders past retention. Returns rows archived.
pub async fn sweep_once(state: &ServerState) -> u64 {
    let now = now_millis();
    let cutoff = now - state.config.archive_after_ms();

    match orders::archive_terminal_before(&state.pool, cutoff, now).await {
        Ok(0) => 0,
        Ok(archived) => {
            tracing::info!(archived, "Archived terminal orders");
            archived
        }
        Err(e) => {
            tracing::error!(error = %e, "Archive sweep failed");
            0
        }
    }
}

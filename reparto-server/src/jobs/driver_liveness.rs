//! Driver liveness refresher
//!
//! `drivers.last_seen_at` is touched on every driver API call; this sweep
//! clears `is_available` for drivers that have gone quiet. Not part of the
//! order state machine, but it shares the scheduling pattern.

use std::time::Duration;

use shared::util::now_millis;
use tokio_util::sync::CancellationToken;

use crate::core::ServerState;
use crate::db::repository::drivers;

pub async fn run(state: ServerState, shutdown: CancellationToken) {
    tracing::info!(
        interval_secs = state.config.driver_sweep_secs,
        threshold_minutes = state.config.driver_stale_minutes,
        "Driver liveness refresher started"
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(state.config.driver_sweep_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("Driver liveness refresher received shutdown signal");
                return;
            }
            _ = ticker.tick() => {}
        }
        sweep_once(&state).await;
    }
}

/// One pass: mark drivers silent past the threshold as unavailable.
pub async fn sweep_once(state: &ServerState) -> u64 {
    let now = now_millis();
    let cutoff = now - state.config.driver_stale_ms();

    match drivers::mark_stale_unavailable(&state.pool, cutoff, now).await {
        Ok(0) => 0,
        Ok(updated) => {
            tracing::info!(updated, "Marked silent drivers unavailable");
            updated
        }
        Err(e) => {
            tracing::error!(error = %e, "Driver liveness sweep failed");
            0
        }
    }
}

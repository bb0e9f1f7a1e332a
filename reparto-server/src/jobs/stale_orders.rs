//! Stale-pending sweep
//!
//! A `pending` order the restaurant has not confirmed within
//! `stale_pending_minutes` is cancelled by the system actor. The sweep
//! interval is the effective timeout granularity. Orders are handled
//! independently: one failure must not stop the rest of the pass.

use std::time::Duration;

use shared::models::OrderStatus;
use shared::util::now_millis;
use tokio_util::sync::CancellationToken;

use crate::core::ServerState;
use crate::db::repository::orders;
use crate::orders::transitions::{self, TransitionActor, TransitionRequest};

/// Upper bound per pass so a huge backlog cannot starve the loop.
const SWEEP_BATCH_LIMIT: i64 = 200;

/// Reason recorded on system-cancelled orders.
fn cancel_reason(threshold_minutes: i64) -> String {
    format!("Order not confirmed by vendor within {threshold_minutes} minutes")
}

pub async fn run(state: ServerState, shutdown: CancellationToken) {
    tracing::info!(
        interval_secs = state.config.stale_sweep_secs,
        threshold_minutes = state.config.stale_pending_minutes,
        "Stale-pending canceller started"
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(state.config.stale_sweep_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("Stale-pending canceller received shutdown signal");
                return;
            }
            _ = ticker.tick() => {}
        }
        sweep_once(&state, &shutdown).await;
    }
}

/// One pass: cancel every `pending` order placed before the threshold.
/// Returns how many orders were cancelled.
pub async fn sweep_once(state: &ServerState, shutdown: &CancellationToken) -> usize {
    let cutoff = now_millis() - state.config.stale_pending_ms();
    let stale = match orders::list_stale_pending(&state.pool, cutoff, SWEEP_BATCH_LIMIT).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list stale pending orders");
            return 0;
        }
    };
    if stale.is_empty() {
        return 0;
    }

    tracing::info!(count = stale.len(), "Cancelling stale pending orders");

    let reason = cancel_reason(state.config.stale_pending_minutes);
    let mut cancelled = 0;
    for order in stale {
        if shutdown.is_cancelled() {
            tracing::info!("Stale sweep interrupted by shutdown");
            break;
        }

        let req = TransitionRequest::new(order.id, OrderStatus::Cancelled, TransitionActor::System)
            .with_reason(reason.clone());
        match transitions::apply_transition(&state.pool, req).await {
            Ok(_) => cancelled += 1,
            Err(e) => {
                // The order may have moved since the query; skip it and keep sweeping.
                tracing::warn!(order_id = order.id, error = %e, "Skipped stale order");
            }
        }
    }

    if cancelled > 0 {
        tracing::info!(cancelled, "Stale pending sweep finished");
    }
    cancelled
}

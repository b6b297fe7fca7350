//! Periodic phase-advancement pass over all in-progress periods.
//!
//! Spawns a background task that moves periods out of phases whose
//! governing deadline has elapsed. Runs on a fixed interval using
//! `tokio::time::interval`; a single missed or doubled pass is harmless
//! because advancement is idempotent.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use evalcycle_engine::scheduler;

/// Run the phase-advance loop until `cancel` is triggered.
pub async fn run(pool: PgPool, interval_secs: u64, cancel: CancellationToken) {
    tracing::info!(interval_secs, "Phase-advance job started");

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Phase-advance job stopping");
                break;
            }
            _ = interval.tick() => {
                match scheduler::advance_due_periods(&pool, Utc::now()).await {
                    Ok(transitioned) => {
                        if transitioned > 0 {
                            tracing::info!(transitioned, "Phase-advance: periods moved forward");
                        } else {
                            tracing::debug!("Phase-advance: nothing due");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Phase-advance pass failed");
                    }
                }
            }
        }
    }
}

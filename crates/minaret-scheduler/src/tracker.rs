//! Periodic refresh of the cached next-prayer snapshot.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use minaret_core::config::TRACKER_REFRESH_SECS;

use crate::engine::ScheduleEngine;

/// Recompute the next-prayer cache on a fixed period until `shutdown`
/// broadcasts `true`. The engine also refreshes it directly after every
/// (re)arm, so this loop only keeps the countdown fresh between arms.
pub async fn run(engine: Arc<ScheduleEngine>, mut shutdown: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(Duration::from_secs(TRACKER_REFRESH_SECS));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                engine.refresh_next_prayer();
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("next-prayer tracker shutting down");
                    break;
                }
            }
        }
    }
}

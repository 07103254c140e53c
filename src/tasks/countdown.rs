//! Per-timer countdown background task

use std::sync::Arc;

use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::state::{TickOutcome, TimerManager};

/// Tick loop owned by exactly one timer registration
///
/// Runs until the timer is due (then performs the completion teardown) or
/// until the registration is detached by a pause, stop or shutdown.
pub async fn countdown_task(manager: Arc<TimerManager>, name: String, registration: u64) {
    debug!("Countdown task {} started for timer {}", registration, name);

    let mut ticker = interval(manager.settings().tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        match manager.tick(&name, registration) {
            TickOutcome::Running => continue,
            TickOutcome::Due => {
                manager.complete(name, registration).await;
                return;
            }
            TickOutcome::Detached => {
                debug!("Countdown task {} for timer {} detached", registration, name);
                return;
            }
        }
    }
}

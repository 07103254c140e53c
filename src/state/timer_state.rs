//! Per-timer state and its display view

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{task::JoinHandle, time::Instant};

/// Lifecycle phase of an active timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    Running,
    Paused,
    /// Judged complete; still holds its name until teardown finishes
    Completing,
}

/// One countdown in the active set
#[derive(Debug)]
pub struct Timer {
    pub name: String,
    pub total_seconds: u64,
    /// Deadline while running; stale while paused
    pub target_end: Instant,
    /// Authoritative only while paused
    pub remaining: Duration,
    pub phase: TimerPhase,
    pub started_at: DateTime<Utc>,
    /// Number of the tick registration currently allowed to drive this timer
    pub registration: u64,
    pub tick: Option<JoinHandle<()>>,
}

impl Timer {
    /// Create a running timer anchored at `now`
    pub fn new(name: String, total_seconds: u64, now: Instant, registration: u64) -> Self {
        let remaining = Duration::from_secs(total_seconds);
        Self {
            name,
            total_seconds,
            target_end: now + remaining,
            remaining,
            phase: TimerPhase::Running,
            started_at: Utc::now(),
            registration,
            tick: None,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.phase == TimerPhase::Paused
    }

    pub fn total(&self) -> Duration {
        Duration::from_secs(self.total_seconds)
    }

    /// Time left before the deadline as seen at `now`
    pub fn remaining_at(&self, now: Instant) -> Duration {
        self.target_end.saturating_duration_since(now)
    }

    /// Cancel the outstanding tick registration, if any
    pub fn cancel_tick(&mut self) {
        if let Some(handle) = self.tick.take() {
            handle.abort();
        }
    }

    pub fn view(&self) -> TimerView {
        TimerView {
            name: self.name.clone(),
            total_seconds: self.total_seconds,
            remaining_millis: self.remaining.as_millis() as u64,
            display: format_hms(self.remaining),
            progress_percent: progress_percent(self.remaining, self.total()),
            paused: self.is_paused(),
            label: match self.phase {
                TimerPhase::Running => "Running",
                TimerPhase::Paused => "Paused",
                TimerPhase::Completing => "Completed",
            }
            .to_string(),
            toggle_label: if self.is_paused() { "Resume" } else { "Pause" }.to_string(),
            started_at: self.started_at,
        }
    }
}

/// Read-only display data of one timer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerView {
    pub name: String,
    pub total_seconds: u64,
    pub remaining_millis: u64,
    pub display: String,
    pub progress_percent: f64,
    pub paused: bool,
    pub label: String,
    pub toggle_label: String,
    pub started_at: DateTime<Utc>,
}

/// Format remaining time as `HH:MM:SS`, rounding partial seconds up
pub fn format_hms(remaining: Duration) -> String {
    let millis = remaining.as_millis() as u64;
    let total = millis.div_ceil(1000);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Linear progress of the remaining time, clamped to `0..=100`
pub fn progress_percent(remaining: Duration, total: Duration) -> f64 {
    if total.is_zero() {
        return 0.0;
    }
    let ratio = remaining.as_secs_f64() / total.as_secs_f64() * 100.0;
    ratio.clamp(0.0, 100.0)
}

//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{services::Notice, state::TimerView};

/// Body of `POST /timers`
///
/// The duration is either `duration_seconds` or any mix of
/// `hours`/`minutes`/`seconds` as entered in the Mini App form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartTimerRequest {
    pub name: String,
    #[serde(default)]
    pub duration_seconds: Option<u64>,
    #[serde(default)]
    pub hours: u64,
    #[serde(default)]
    pub minutes: u64,
    #[serde(default)]
    pub seconds: u64,
}

impl StartTimerRequest {
    /// Total requested duration in seconds
    pub fn total_seconds(&self) -> u64 {
        self.duration_seconds.unwrap_or_else(|| {
            self.hours
                .saturating_mul(3600)
                .saturating_add(self.minutes.saturating_mul(60))
                .saturating_add(self.seconds)
        })
    }
}

/// API response structure for timer operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer: Option<TimerView>,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: &str, message: String, timer: Option<TimerView>) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            timer,
        }
    }

    pub fn ok(message: String, timer: Option<TimerView>) -> Self {
        Self::new("ok", message, timer)
    }

    /// Create an error response
    pub fn error(message: String) -> Self {
        Self::new("error", message, None)
    }
}

/// Contents of the countdown surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimersResponse {
    pub visible: bool,
    pub timers: Vec<TimerView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticesResponse {
    pub notices: Vec<Notice>,
}

/// Status response with timer information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub active_timers: usize,
    pub surface_visible: bool,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

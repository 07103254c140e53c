//! Main application state shared with the HTTP handlers

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Instant,
};

use chrono::{DateTime, Utc};

use super::TimerManager;
use crate::services::NoticeBoard;

/// Application state: the timer manager plus server metadata
#[derive(Debug)]
pub struct AppState {
    pub timers: Arc<TimerManager>,
    /// Notice feed read by the UI
    pub notices: Arc<NoticeBoard>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl AppState {
    pub fn new(timers: Arc<TimerManager>, notices: Arc<NoticeBoard>, port: u16, host: String) -> Self {
        Self {
            timers,
            notices,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
        }
    }

    /// Remember the latest caller action for the status endpoint
    pub fn record_action(&self, action: impl Into<String>) {
        let mut last = self.last_action.lock().unwrap_or_else(PoisonError::into_inner);
        *last = Some((action.into(), Utc::now()));
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last = self.last_action.lock().unwrap_or_else(PoisonError::into_inner);
        match last.as_ref() {
            Some((action, at)) => (Some(action.clone()), Some(*at)),
            None => (None, None),
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

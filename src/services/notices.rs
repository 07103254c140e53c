//! Transient user-facing notices

use std::{
    collections::VecDeque,
    sync::{Mutex, PoisonError},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Number of notices kept for the notice feed
const NOTICE_HISTORY: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Displays a transient message to the user
pub trait NoticeSink: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);
}

/// Logs notices and keeps the latest ones for the HTTP notice feed
#[derive(Debug, Default)]
pub struct NoticeBoard {
    recent: Mutex<VecDeque<Notice>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent notices, oldest first
    pub fn recent(&self) -> Vec<Notice> {
        self.recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Messages only, handy for assertions
    pub fn messages(&self) -> Vec<String> {
        self.recent().into_iter().map(|n| n.message).collect()
    }
}

impl NoticeSink for NoticeBoard {
    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Warning | Severity::Error => warn!(?severity, "{}", message),
            Severity::Info | Severity::Success => info!(?severity, "{}", message),
        }

        let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
        if recent.len() == NOTICE_HISTORY {
            recent.pop_front();
        }
        recent.push_back(Notice {
            severity,
            message: message.to_string(),
            timestamp: Utc::now(),
        });
    }
}

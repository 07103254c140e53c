//! Best-effort "timer completed" call to the chat bot backend

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::RemoteError;

/// Path of the backend endpoint relaying completions to the bot
pub const NOTIFICATION_PATH: &str = "/api/send-timer-notification";

/// Informs an external system that a named timer completed
#[async_trait]
pub trait RemoteNotifier: Send + Sync {
    async fn notify_completed(&self, timer_name: &str) -> Result<(), RemoteError>;
}

#[derive(Debug, Serialize)]
struct NotificationRequest<'a> {
    timer_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct NotificationResponse {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Posts completions to the backend over HTTP
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    url: String,
    user_id: Option<i64>,
    client: Client,
}

impl HttpNotifier {
    pub fn new(base_url: &str, user_id: Option<i64>, timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: format!("{}{}", base_url.trim_end_matches('/'), NOTIFICATION_PATH),
            user_id,
            client,
        })
    }
}

#[async_trait]
impl RemoteNotifier for HttpNotifier {
    async fn notify_completed(&self, timer_name: &str) -> Result<(), RemoteError> {
        debug!("POST {} for timer {}", self.url, timer_name);

        let mut request = self
            .client
            .post(&self.url)
            .json(&NotificationRequest { timer_name });
        if let Some(user_id) = self.user_id {
            request = request.header("X-User-ID", user_id.to_string());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status));
        }

        let body: NotificationResponse = response.json().await?;
        if !body.success {
            return Err(RemoteError::Rejected(
                body.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        info!("Completion of timer {} relayed to the bot", timer_name);
        Ok(())
    }
}

/// Used when no backend is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledNotifier;

#[async_trait]
impl RemoteNotifier for DisabledNotifier {
    async fn notify_completed(&self, timer_name: &str) -> Result<(), RemoteError> {
        debug!("Remote notification disabled, skipping timer {}", timer_name);
        Ok(())
    }
}

//! Recording fakes for the timer manager's collaborators

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    error::RemoteError,
    services::{AlertSink, NoticeBoard, RemoteNotifier},
    state::{ManagerSettings, TimerManager},
};

#[derive(Debug, Default)]
pub struct CountingAlert {
    plays: AtomicUsize,
}

impl CountingAlert {
    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlertSink for CountingAlert {
    async fn play_completion(&self) {
        self.plays.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
pub struct RecordingRemote {
    calls: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingRemote {
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteNotifier for RecordingRemote {
    async fn notify_completed(&self, timer_name: &str) -> Result<(), RemoteError> {
        self.calls.lock().unwrap().push(timer_name.to_string());
        if self.fail {
            Err(RemoteError::Rejected("bot offline".to_string()))
        } else {
            Ok(())
        }
    }
}

/// A manager wired to fakes, plus handles to inspect them
pub struct Harness {
    pub manager: Arc<TimerManager>,
    pub notices: Arc<NoticeBoard>,
    pub alert: Arc<CountingAlert>,
    pub remote: Arc<RecordingRemote>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(ManagerSettings {
            tick_interval: Duration::from_millis(100),
            exit_transition: Duration::ZERO,
        })
    }

    pub fn with_settings(settings: ManagerSettings) -> Self {
        Self::build(settings, RecordingRemote::default())
    }

    pub fn build(settings: ManagerSettings, remote: RecordingRemote) -> Self {
        let notices = Arc::new(NoticeBoard::new());
        let alert = Arc::new(CountingAlert::default());
        let remote = Arc::new(remote);
        let manager = TimerManager::new(
            settings,
            notices.clone(),
            alert.clone(),
            remote.clone(),
        );
        Self {
            manager,
            notices,
            alert,
            remote,
        }
    }
}

//! Registry of named countdown timers and their state transitions

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use serde::Serialize;
use tokio::{
    sync::{broadcast, watch},
    time::Instant,
};
use tracing::{debug, info, warn};

use super::timer_state::{format_hms, Timer, TimerPhase, TimerView};
use crate::{
    error::TimerError,
    services::{AlertSink, NoticeSink, RemoteNotifier, Severity},
    tasks::countdown_task,
};

/// Longest accepted countdown (366 days)
pub const MAX_DURATION_SECONDS: u64 = 366 * 24 * 3600;

/// Timing parameters of a manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerSettings {
    pub tick_interval: Duration,
    /// Delay between the completed notice and removal of the timer
    pub exit_transition: Duration,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            exit_transition: Duration::from_millis(300),
        }
    }
}

/// Change notifications for display surfaces
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TimerEvent {
    Started { timer: TimerView },
    /// Sent when the displayed `HH:MM:SS` string changes
    Tick { timer: TimerView },
    Paused { timer: TimerView },
    Resumed { timer: TimerView },
    Completed { name: String },
    Stopped { name: String },
    Removed { name: String },
    SurfaceVisibility { visible: bool },
}

/// Result of one tick evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running,
    /// Deadline reached; the caller now owns the completion teardown
    Due,
    /// The registration is no longer current; the caller must exit
    Detached,
}

/// Owns the active set of timers and drives each one to completion
pub struct TimerManager {
    settings: ManagerSettings,
    timers: Mutex<HashMap<String, Timer>>,
    next_registration: Mutex<u64>,
    notices: Arc<dyn NoticeSink>,
    alert: Arc<dyn AlertSink>,
    remote: Arc<dyn RemoteNotifier>,
    events_tx: broadcast::Sender<TimerEvent>,
    surface_tx: watch::Sender<bool>,
}

impl TimerManager {
    pub fn new(
        settings: ManagerSettings,
        notices: Arc<dyn NoticeSink>,
        alert: Arc<dyn AlertSink>,
        remote: Arc<dyn RemoteNotifier>,
    ) -> Arc<Self> {
        let (events_tx, _) = broadcast::channel(256);
        let (surface_tx, _) = watch::channel(false);

        Arc::new(Self {
            settings,
            timers: Mutex::new(HashMap::new()),
            next_registration: Mutex::new(0),
            notices,
            alert,
            remote,
            events_tx,
            surface_tx,
        })
    }

    pub fn settings(&self) -> ManagerSettings {
        self.settings
    }

    /// Subscribe to timer change events
    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.events_tx.subscribe()
    }

    /// Watch whether the countdown surface should be visible
    pub fn surface(&self) -> watch::Receiver<bool> {
        self.surface_tx.subscribe()
    }

    pub fn is_surface_visible(&self) -> bool {
        *self.surface_tx.borrow()
    }

    /// Display views of all active timers, sorted by name
    pub fn snapshot(&self) -> Vec<TimerView> {
        let timers = self.lock_timers();
        let mut views: Vec<TimerView> = timers.values().map(Timer::view).collect();
        views.sort_by(|a, b| a.name.cmp(&b.name));
        views
    }

    pub fn view(&self, name: &str) -> Option<TimerView> {
        self.lock_timers().get(name.trim()).map(Timer::view)
    }

    pub fn len(&self) -> usize {
        self.lock_timers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start a new countdown; an active name is never restarted
    pub fn start(self: &Arc<Self>, name: &str, duration_seconds: u64) -> Result<TimerView, TimerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TimerError::EmptyName);
        }
        if duration_seconds == 0 {
            return Err(TimerError::ZeroDuration);
        }
        if duration_seconds > MAX_DURATION_SECONDS {
            return Err(TimerError::DurationTooLong(MAX_DURATION_SECONDS));
        }

        let (view, first) = {
            let mut timers = self.lock_timers();
            if timers.contains_key(name) {
                drop(timers);
                warn!("Timer {} is already running, start rejected", name);
                self.notices
                    .notify(Severity::Warning, &format!("Timer \"{}\" is already running", name));
                return Err(TimerError::DuplicateTimerName(name.to_string()));
            }

            let registration = self.next_registration();
            let mut timer = Timer::new(name.to_string(), duration_seconds, Instant::now(), registration);
            timer.tick = Some(self.spawn_tick(name, registration));
            let view = timer.view();
            timers.insert(name.to_string(), timer);
            (view, timers.len() == 1)
        };

        info!("Timer {} started for {}s", name, duration_seconds);
        if first {
            self.set_surface_visible(true);
        }
        self.emit(TimerEvent::Started { timer: view.clone() });
        self.notices
            .notify(Severity::Success, &format!("Timer \"{}\" started", name));
        Ok(view)
    }

    /// Pause a running timer or resume a paused one
    pub fn toggle_pause(self: &Arc<Self>, name: &str) -> Result<TimerView, TimerError> {
        let name = name.trim();
        let (view, resumed) = {
            let mut timers = self.lock_timers();
            let Some(timer) = timers.get_mut(name) else {
                debug!("Toggle ignored, no active timer {}", name);
                return Err(TimerError::UnknownTimerName(name.to_string()));
            };

            let now = Instant::now();
            match timer.phase {
                TimerPhase::Running => {
                    timer.cancel_tick();
                    timer.remaining = timer.remaining.min(timer.remaining_at(now));
                    timer.phase = TimerPhase::Paused;
                    (timer.view(), false)
                }
                TimerPhase::Paused => {
                    // re-anchor; the old deadline has already drifted into the past
                    timer.target_end = now + timer.remaining;
                    timer.phase = TimerPhase::Running;
                    let registration = self.next_registration();
                    timer.registration = registration;
                    timer.tick = Some(self.spawn_tick(name, registration));
                    (timer.view(), true)
                }
                TimerPhase::Completing => {
                    debug!("Toggle ignored, timer {} is completing", name);
                    return Err(TimerError::UnknownTimerName(name.to_string()));
                }
            }
        };

        if resumed {
            info!("Timer {} resumed with {}ms left", name, view.remaining_millis);
            self.emit(TimerEvent::Resumed { timer: view.clone() });
            self.notices
                .notify(Severity::Info, &format!("Timer \"{}\" resumed", name));
        } else {
            info!("Timer {} paused with {}ms left", name, view.remaining_millis);
            self.emit(TimerEvent::Paused { timer: view.clone() });
            self.notices
                .notify(Severity::Info, &format!("Timer \"{}\" paused", name));
        }
        Ok(view)
    }

    /// Cancel a timer without sound or remote notification
    pub fn stop(&self, name: &str) -> Result<(), TimerError> {
        let name = name.trim();
        let now_empty = {
            let mut timers = self.lock_timers();
            match timers.get(name).map(|t| t.phase) {
                Some(TimerPhase::Running | TimerPhase::Paused) => {}
                _ => {
                    debug!("Stop ignored, no active timer {}", name);
                    return Err(TimerError::UnknownTimerName(name.to_string()));
                }
            }
            if let Some(mut timer) = timers.remove(name) {
                timer.cancel_tick();
            }
            timers.is_empty()
        };

        info!("Timer {} stopped", name);
        self.emit(TimerEvent::Stopped { name: name.to_string() });
        self.emit(TimerEvent::Removed { name: name.to_string() });
        self.notices
            .notify(Severity::Info, &format!("Timer \"{}\" stopped", name));
        if now_empty {
            self.set_surface_visible(false);
        }
        Ok(())
    }

    /// Re-evaluate a running timer against the clock
    pub fn tick(&self, name: &str, registration: u64) -> TickOutcome {
        let mut timers = self.lock_timers();
        let Some(timer) = timers.get_mut(name) else {
            return TickOutcome::Detached;
        };
        if timer.registration != registration || timer.phase != TimerPhase::Running {
            return TickOutcome::Detached;
        }

        let remaining = timer.remaining_at(Instant::now());
        if remaining.is_zero() {
            timer.remaining = Duration::ZERO;
            timer.phase = TimerPhase::Completing;
            // the calling task is this registration; release it without aborting itself
            timer.tick = None;
            return TickOutcome::Due;
        }

        let changed = format_hms(remaining) != format_hms(timer.remaining);
        timer.remaining = remaining;
        if changed {
            let view = timer.view();
            drop(timers);
            self.emit(TimerEvent::Tick { timer: view });
        }
        TickOutcome::Running
    }

    /// Completion teardown of a timer judged due by [`Self::tick`]
    pub async fn complete(self: Arc<Self>, name: String, registration: u64) {
        info!("Timer {} completed", name);

        let alert = Arc::clone(&self.alert);
        tokio::spawn(async move {
            alert.play_completion().await;
        });

        self.notices
            .notify(Severity::Success, &format!("Timer \"{}\" completed", name));

        let remote = Arc::clone(&self.remote);
        let remote_name = name.clone();
        tokio::spawn(async move {
            if let Err(e) = remote.notify_completed(&remote_name).await {
                warn!("Failed to notify completion of timer {}: {}", remote_name, e);
            }
        });

        self.emit(TimerEvent::Completed { name: name.clone() });

        if !self.settings.exit_transition.is_zero() {
            tokio::time::sleep(self.settings.exit_transition).await;
        }

        let now_empty = {
            let mut timers = self.lock_timers();
            let ours = timers
                .get(&name)
                .is_some_and(|t| t.registration == registration && t.phase == TimerPhase::Completing);
            if !ours {
                return;
            }
            timers.remove(&name);
            timers.is_empty()
        };

        debug!("Timer {} removed", name);
        self.emit(TimerEvent::Removed { name });
        if now_empty {
            self.set_surface_visible(false);
        }
    }

    /// Abort every tick task and clear the active set
    pub fn shutdown(&self) {
        let mut timers = self.lock_timers();
        for timer in timers.values_mut() {
            timer.cancel_tick();
        }
        let count = timers.len();
        timers.clear();
        drop(timers);

        if count > 0 {
            info!("Discarded {} active timers on shutdown", count);
        }
        self.set_surface_visible(false);
    }

    fn spawn_tick(self: &Arc<Self>, name: &str, registration: u64) -> tokio::task::JoinHandle<()> {
        tokio::spawn(countdown_task(Arc::clone(self), name.to_string(), registration))
    }

    fn next_registration(&self) -> u64 {
        let mut next = self
            .next_registration
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *next += 1;
        *next
    }

    fn set_surface_visible(&self, visible: bool) {
        let changed = self.surface_tx.send_if_modified(|current| {
            let changed = *current != visible;
            *current = visible;
            changed
        });
        if changed {
            debug!("Countdown surface {}", if visible { "shown" } else { "hidden" });
            self.emit(TimerEvent::SurfaceVisibility { visible });
        }
    }

    fn emit(&self, event: TimerEvent) {
        // no subscribers is fine
        let _ = self.events_tx.send(event);
    }

    fn lock_timers(&self) -> MutexGuard<'_, HashMap<String, Timer>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for TimerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerManager")
            .field("settings", &self.settings)
            .field("active", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Harness, RecordingRemote};
    use tokio::time::sleep;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[tokio::test(start_paused = true)]
    async fn start_registers_one_running_timer() {
        let h = Harness::new();

        let view = h.manager.start("Farm", 90).unwrap();

        assert_eq!(view.remaining_millis, 90_000);
        assert_eq!(view.display, "00:01:30");
        assert_eq!(h.manager.len(), 1);
        assert!(h.manager.is_surface_visible());
        assert_eq!(h.notices.messages(), vec!["Timer \"Farm\" started"]);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_start_keeps_original_timer() {
        let h = Harness::new();
        h.manager.start("A", 10).unwrap();

        let err = h.manager.start("A", 5).unwrap_err();

        assert_eq!(err, TimerError::DuplicateTimerName("A".to_string()));
        let timers = h.manager.snapshot();
        assert_eq!(timers.len(), 1);
        assert_eq!(timers[0].name, "A");
        assert_eq!(timers[0].total_seconds, 10);
        assert_eq!(
            h.notices.messages().last().map(String::as_str),
            Some("Timer \"A\" is already running")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_start_is_refused() {
        let h = Harness::new();

        assert_eq!(h.manager.start("  ", 10), Err(TimerError::EmptyName));
        assert_eq!(h.manager.start("Farm", 0), Err(TimerError::ZeroDuration));
        assert!(h.manager.is_empty());
        assert!(!h.manager.is_surface_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_duration_is_refused() {
        let h = Harness::new();

        assert_eq!(
            h.manager.start("Farm", u64::MAX),
            Err(TimerError::DurationTooLong(MAX_DURATION_SECONDS))
        );
        assert_eq!(
            h.manager.start("Farm", MAX_DURATION_SECONDS + 1),
            Err(TimerError::DurationTooLong(MAX_DURATION_SECONDS))
        );
        assert!(h.manager.is_empty());

        let view = h.manager.start("Farm", MAX_DURATION_SECONDS).unwrap();
        assert_eq!(view.display, "8784:00:00");
    }

    #[tokio::test(start_paused = true)]
    async fn names_are_trimmed_everywhere() {
        let h = Harness::new();
        h.manager.start(" Farm ", 10).unwrap();

        assert!(h.manager.view("Farm").is_some());
        assert!(h.manager.start("Farm", 10).is_err());

        assert!(h.manager.toggle_pause(" Farm ").unwrap().paused);
        assert!(h.manager.toggle_pause("Farm ").is_ok());
        assert!(h.manager.stop(" Farm").is_ok());
        assert!(h.manager.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_resume_round_trip_keeps_remaining() {
        let h = Harness::new();
        h.manager.start("B", 60).unwrap();
        sleep(ms(1_250)).await;

        let paused = h.manager.toggle_pause("B").unwrap();
        let resumed = h.manager.toggle_pause("B").unwrap();

        assert!(paused.paused);
        assert_eq!(paused.label, "Paused");
        assert_eq!(paused.toggle_label, "Resume");
        assert!(!resumed.paused);
        assert_eq!(resumed.remaining_millis, paused.remaining_millis);
        assert_eq!(paused.remaining_millis, 58_750);
    }

    #[tokio::test(start_paused = true)]
    async fn paused_time_does_not_count() {
        let h = Harness::new();
        h.manager.start("B", 60).unwrap();
        h.manager.toggle_pause("B").unwrap();

        sleep(ms(3_000)).await;
        let resumed = h.manager.toggle_pause("B").unwrap();
        assert_eq!(resumed.remaining_millis, 60_000);

        // deadline re-anchored at t=3s
        sleep(ms(59_900)).await;
        assert!(h.manager.view("B").is_some());
        sleep(ms(200)).await;
        assert!(h.manager.view("B").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn paused_timer_never_completes() {
        let h = Harness::new();
        h.manager.start("B", 2).unwrap();
        sleep(ms(500)).await;
        h.manager.toggle_pause("B").unwrap();

        sleep(ms(10_000)).await;

        let view = h.manager.view("B").unwrap();
        assert!(view.paused);
        assert_eq!(view.remaining_millis, 1_500);
        assert_eq!(h.alert.plays(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn completes_on_time_and_never_earlier() {
        let h = Harness::new();
        h.manager.start("A", 5).unwrap();

        sleep(ms(4_950)).await;
        let view = h.manager.view("A").unwrap();
        assert_eq!(view.display, "00:00:01");
        assert_eq!(h.alert.plays(), 0);

        sleep(ms(150)).await;
        assert!(h.manager.view("A").is_none());
        assert_eq!(h.alert.plays(), 1);
        assert_eq!(h.remote.calls(), vec!["A"]);
    }

    #[tokio::test(start_paused = true)]
    async fn farm_completes_and_hides_surface() {
        let h = Harness::new();
        h.manager.start("Farm", 2).unwrap();

        sleep(ms(2_300)).await;

        assert!(h.manager.is_empty());
        assert!(!h.manager.is_surface_visible());
        assert_eq!(h.alert.plays(), 1);
        assert_eq!(h.remote.calls(), vec!["Farm"]);
        assert!(h
            .notices
            .messages()
            .contains(&"Timer \"Farm\" completed".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn completion_fires_once_with_fine_ticks() {
        let h = Harness::with_settings(ManagerSettings {
            tick_interval: ms(10),
            exit_transition: ms(300),
        });
        h.manager.start("Farm", 1).unwrap();

        sleep(ms(3_000)).await;

        assert_eq!(h.alert.plays(), 1);
        assert_eq!(h.remote.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_without_sound_or_remote_call() {
        let h = Harness::new();
        h.manager.start("Rent", 2).unwrap();
        sleep(ms(500)).await;

        h.manager.stop("Rent").unwrap();
        assert!(h.manager.is_empty());
        assert!(!h.manager.is_surface_visible());

        sleep(ms(5_000)).await;
        assert_eq!(h.alert.plays(), 0);
        assert!(h.remote.calls().is_empty());
        assert_eq!(
            h.notices.messages().last().map(String::as_str),
            Some("Timer \"Rent\" stopped")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_of_paused_timer_removes_it() {
        let h = Harness::new();
        h.manager.start("Rent", 20).unwrap();
        h.manager.toggle_pause("Rent").unwrap();

        h.manager.stop("Rent").unwrap();

        assert!(h.manager.is_empty());
        assert!(h.manager.start("Rent", 20).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_names_are_ignored() {
        let h = Harness::new();
        h.manager.start("A", 10).unwrap();
        let notices_before = h.notices.messages().len();

        assert_eq!(
            h.manager.toggle_pause("nope"),
            Err(TimerError::UnknownTimerName("nope".to_string()))
        );
        assert_eq!(
            h.manager.stop("nope"),
            Err(TimerError::UnknownTimerName("nope".to_string()))
        );
        assert_eq!(h.manager.len(), 1);
        assert_eq!(h.notices.messages().len(), notices_before);
    }

    #[tokio::test(start_paused = true)]
    async fn completing_timer_still_holds_its_name() {
        let h = Harness::with_settings(ManagerSettings {
            tick_interval: ms(100),
            exit_transition: ms(300),
        });
        h.manager.start("A", 1).unwrap();

        sleep(ms(1_100)).await;
        let view = h.manager.view("A").unwrap();
        assert_eq!(view.label, "Completed");
        assert_eq!(view.display, "00:00:00");
        assert!(h.manager.is_surface_visible());
        assert_eq!(
            h.manager.start("A", 5),
            Err(TimerError::DuplicateTimerName("A".to_string()))
        );
        assert!(h.manager.toggle_pause("A").is_err());
        assert!(h.manager.stop("A").is_err());

        sleep(ms(300)).await;
        assert!(h.manager.view("A").is_none());
        assert!(!h.manager.is_surface_visible());
        assert!(h.manager.start("A", 5).is_ok());
        assert_eq!(h.alert.plays(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn remote_failure_does_not_block_removal() {
        let h = Harness::build(
            ManagerSettings {
                tick_interval: ms(100),
                exit_transition: Duration::ZERO,
            },
            RecordingRemote::failing(),
        );
        h.manager.start("Farm", 1).unwrap();

        sleep(ms(1_500)).await;

        assert!(h.manager.is_empty());
        assert_eq!(h.remote.calls(), vec!["Farm"]);
        assert!(!h.notices.messages().iter().any(|m| m.contains("bot offline")));
    }

    #[tokio::test(start_paused = true)]
    async fn timers_run_independently() {
        let h = Harness::new();
        h.manager.start("A", 2).unwrap();
        h.manager.start("B", 4).unwrap();
        h.manager.toggle_pause("B").unwrap();
        h.manager.toggle_pause("B").unwrap();

        sleep(ms(2_500)).await;
        assert!(h.manager.view("A").is_none());
        assert!(h.manager.view("B").is_some());
        assert!(h.manager.is_surface_visible());

        sleep(ms(2_000)).await;
        assert!(h.manager.is_empty());
        assert!(!h.manager.is_surface_visible());
        assert_eq!(h.remote.calls(), vec!["A", "B"]);
    }

    #[tokio::test(start_paused = true)]
    async fn managers_do_not_share_timers() {
        let first = Harness::new();
        let second = Harness::new();

        first.manager.start("A", 10).unwrap();

        assert!(second.manager.is_empty());
        assert!(second.manager.start("A", 10).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn events_follow_the_lifecycle() {
        let h = Harness::new();
        let mut events = h.manager.subscribe();

        h.manager.start("A", 1).unwrap();
        sleep(ms(1_200)).await;

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }

        assert!(matches!(seen[0], TimerEvent::SurfaceVisibility { visible: true }));
        assert!(matches!(&seen[1], TimerEvent::Started { timer } if timer.name == "A"));
        let tail: Vec<_> = seen.iter().rev().take(3).rev().cloned().collect();
        assert_eq!(
            tail,
            vec![
                TimerEvent::Completed { name: "A".to_string() },
                TimerEvent::Removed { name: "A".to_string() },
                TimerEvent::SurfaceVisibility { visible: false },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn tick_events_only_on_display_change() {
        let h = Harness::new();
        let mut events = h.manager.subscribe();
        h.manager.start("A", 3).unwrap();

        sleep(ms(2_050)).await;

        let mut displays = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let TimerEvent::Tick { timer } = event {
                displays.push(timer.display);
            }
        }
        assert_eq!(displays, vec!["00:00:02", "00:00:01"]);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_discards_everything() {
        let h = Harness::new();
        h.manager.start("A", 1).unwrap();
        h.manager.start("B", 1).unwrap();

        h.manager.shutdown();
        sleep(ms(2_000)).await;

        assert!(h.manager.is_empty());
        assert!(!h.manager.is_surface_visible());
        assert_eq!(h.alert.plays(), 0);
    }
}

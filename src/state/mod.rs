//! State management module
//!
//! This module contains the timer registry, per-timer state and the
//! application state shared with the HTTP handlers.

pub mod app_state;
pub mod timer_manager;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use timer_manager::{
    ManagerSettings, TickOutcome, TimerEvent, TimerManager, MAX_DURATION_SECONDS,
};
pub use timer_state::{format_hms, progress_percent, Timer, TimerPhase, TimerView};

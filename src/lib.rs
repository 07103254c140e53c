//! Resell Timers - named countdown timers for the resell Mini App
//!
//! This library provides a timer manager that runs independent, pausable
//! countdowns with drift-free remaining time, plays a completion alert and
//! relays completions to the chat bot backend, plus the HTTP surface the
//! Mini App talks to.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::TimerError;
pub use state::{AppState, TimerManager};
pub use utils::signals::shutdown_signal;

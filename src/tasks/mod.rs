//! Background tasks module
//!
//! This module contains the countdown tasks that drive running timers.

pub mod countdown;

// Re-export main functions
pub use countdown::countdown_task;

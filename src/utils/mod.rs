//! Utility functions module
//!
//! Process-level helpers used by the binary.

pub mod signals;

// Re-export main functions
pub use signals::shutdown_signal;

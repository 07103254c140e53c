//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::state::ManagerSettings;

/// CLI argument parsing structure
#[derive(Parser, Debug, Clone)]
#[command(name = "resell-timers")]
#[command(about = "Named countdown timers for the resell Mini App")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Tick interval of running timers in milliseconds
    #[arg(long, default_value = "100", value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_ms: u64,

    /// Delay between a timer's completion notice and its removal, in milliseconds
    #[arg(long, default_value = "300")]
    pub exit_transition_ms: u64,

    /// Base URL of the backend that relays completions to the chat bot
    #[arg(long)]
    pub notify_url: Option<String>,

    /// Telegram user id sent with completion notifications
    #[arg(long)]
    pub user_id: Option<i64>,

    /// Timeout of the completion notification request in seconds
    #[arg(long, default_value = "5")]
    pub notify_timeout_secs: u64,

    /// Sound file played when a timer completes
    #[arg(long)]
    pub sound_file: Option<PathBuf>,

    /// Completion sound volume in percent
    #[arg(long, default_value = "100", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub volume: u8,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn manager_settings(&self) -> ManagerSettings {
        ManagerSettings {
            tick_interval: Duration::from_millis(self.tick_ms),
            exit_transition: Duration::from_millis(self.exit_transition_ms),
        }
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }
}

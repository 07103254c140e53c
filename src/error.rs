//! Error types for timers and their best-effort collaborators

use thiserror::Error;

/// Errors returned by the timer manager's caller-facing operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimerError {
    #[error("timer name must not be empty")]
    EmptyName,
    #[error("timer duration must be at least one second")]
    ZeroDuration,
    #[error("timer duration must not exceed {0} seconds")]
    DurationTooLong(u64),
    #[error("timer \"{0}\" is already running")]
    DuplicateTimerName(String),
    #[error("no active timer named \"{0}\"")]
    UnknownTimerName(String),
}

/// Failure to play a completion sound (recovered by the fallback chain)
#[derive(Debug, Error)]
pub enum SoundError {
    #[error("no sound asset configured")]
    MissingAsset,
    #[error("no audio output available: {0}")]
    Stream(#[from] rodio::StreamError),
    #[error("failed to start playback: {0}")]
    Play(#[from] rodio::PlayError),
    #[error("unsupported sound file: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure of the remote "timer completed" call (logged only)
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("notification endpoint answered with status {0}")]
    Status(reqwest::StatusCode),
    #[error("notification rejected: {0}")]
    Rejected(String),
}

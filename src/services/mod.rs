//! Collaborators of the timer manager
//!
//! Notices shown to the user, the completion sound and the remote
//! completion notification.

pub mod notices;
pub mod remote;
pub mod sound;
pub mod tone;

// Re-export main types
pub use notices::{Notice, NoticeBoard, NoticeSink, Severity};
pub use remote::{DisabledNotifier, HttpNotifier, RemoteNotifier};
pub use sound::{AlertSink, AudioOutput, RodioOutput, SoundAlert};

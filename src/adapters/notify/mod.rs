//! Notification sinks. Implement NotifierPort.
//!
//! The interactive spinner sink lives with the UI adapter.

pub mod log_notifier;
pub mod recording;

pub use log_notifier::LogNotifier;
pub use recording::RecordingNotifier;

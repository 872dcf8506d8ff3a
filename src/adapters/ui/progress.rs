//! Toast-style notices on the terminal. Implements NotifierPort.
//!
//! A pending notice starts a spinner; the next success or error notice
//! resolves it in place.

use crate::domain::NoticeKind;
use crate::ports::NotifierPort;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

const SPINNER_TEMPLATE: &str = "{spinner:.red} {msg}";

#[derive(Default)]
pub struct SpinnerNotifier {
    active: Mutex<Option<ProgressBar>>,
}

impl SpinnerNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn spinner(message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template(SPINNER_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

impl NotifierPort for SpinnerNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        debug!(?kind, message, "notice");
        let Ok(mut active) = self.active.lock() else {
            return;
        };
        match kind {
            NoticeKind::Pending => {
                if let Some(previous) = active.take() {
                    previous.finish_and_clear();
                }
                *active = Some(Self::spinner(message));
            }
            NoticeKind::Success => match active.take() {
                Some(pb) => pb.finish_with_message(format!("✔ {}", message)),
                None => println!("✔ {}", message),
            },
            NoticeKind::Error => match active.take() {
                Some(pb) => pb.abandon_with_message(format!("✖ {}", message)),
                None => eprintln!("✖ {}", message),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_then_resolved() {
        let notifier = SpinnerNotifier::new();
        notifier.notify(NoticeKind::Pending, "working");
        assert!(notifier.active.lock().unwrap().is_some());
        notifier.notify(NoticeKind::Success, "done");
        assert!(notifier.active.lock().unwrap().is_none());
        notifier.notify(NoticeKind::Error, "no spinner to resolve");
        assert!(notifier.active.lock().unwrap().is_none());
    }
}

//! Keeps every notice in memory. Lets tests assert on user feedback.

use crate::domain::{Notice, NoticeKind};
use crate::ports::NotifierPort;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all notices in delivery order.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, kind: NoticeKind) -> usize {
        self.notices().iter().filter(|n| n.kind == kind).count()
    }

    pub fn kinds(&self) -> Vec<NoticeKind> {
        self.notices().iter().map(|n| n.kind).collect()
    }
}

impl NotifierPort for RecordingNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(Notice {
                kind,
                message: message.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let sink = RecordingNotifier::new();
        sink.notify(NoticeKind::Pending, "working");
        sink.notify(NoticeKind::Success, "done");
        assert_eq!(sink.kinds(), vec![NoticeKind::Pending, NoticeKind::Success]);
        assert_eq!(sink.count(NoticeKind::Success), 1);
        assert_eq!(sink.notices()[1].message, "done");
    }
}

//! Forwards user notices to tracing. Used when no terminal is attached.

use crate::domain::NoticeKind;
use crate::ports::NotifierPort;
use tracing::{error, info};

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotifierPort for LogNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        match kind {
            NoticeKind::Pending => info!(notice = "pending", "{}", message),
            NoticeKind::Success => info!(notice = "success", "{}", message),
            NoticeKind::Error => error!(notice = "error", "{}", message),
        }
    }
}

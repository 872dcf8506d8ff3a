//! Events crossing the core boundary: store change notices and user notices.

use serde::{Deserialize, Serialize};

/// Emitted by a store after a write lands. Views subscribe and re-read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreChange {
    VotesChanged { post_id: i64 },
    CommentsChanged { post_id: i64 },
}

impl StoreChange {
    pub fn post_id(&self) -> i64 {
        match self {
            Self::VotesChanged { post_id } | Self::CommentsChanged { post_id } => *post_id,
        }
    }
}

/// Kind of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Pending,
    Success,
    Error,
}

/// A delivered notification (kept by recording sinks).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

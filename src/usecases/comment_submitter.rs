//! Comment creation: guard identity, notify pending, submit, clear the draft.
//!
//! No retry. A failed submission keeps the draft so the user can resend.

use crate::domain::{Comment, DomainError, Identity, NewComment, NoticeKind};
use crate::ports::{MutationPort, NotifierPort};
use std::sync::Arc;
use tracing::{info, warn};

pub const SIGN_IN_TO_COMMENT: &str = "You need to sign in to comment";
pub const COMMENT_PENDING: &str = "Posting your comment...";
pub const COMMENT_POSTED: &str = "Comment successfully posted!";

/// The comment input field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentDraft {
    text: String,
}

impl CommentDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }
}

pub struct CommentSubmitter {
    mutations: Arc<dyn MutationPort>,
    notifier: Arc<dyn NotifierPort>,
}

impl CommentSubmitter {
    pub fn new(mutations: Arc<dyn MutationPort>, notifier: Arc<dyn NotifierPort>) -> Self {
        Self {
            mutations,
            notifier,
        }
    }

    /// Submit the draft as-is. The body is neither trimmed nor validated here.
    pub async fn submit(
        &self,
        post_id: i64,
        identity: Option<&Identity>,
        draft: &mut CommentDraft,
    ) -> Result<Comment, DomainError> {
        // The UI disables the input when signed out; this path may still be reached.
        let Some(author) = identity else {
            warn!(post_id, "comment submit without identity");
            self.notifier.notify(NoticeKind::Error, SIGN_IN_TO_COMMENT);
            return Err(DomainError::Unauthorized);
        };

        self.notifier.notify(NoticeKind::Pending, COMMENT_PENDING);
        let request = NewComment {
            post_id,
            author: author.clone(),
            text: draft.text().to_string(),
        };

        match self.mutations.submit_comment(request).await {
            Ok(comment) => {
                draft.clear();
                info!(post_id, comment_id = comment.id, "comment posted");
                self.notifier.notify(NoticeKind::Success, COMMENT_POSTED);
                Ok(comment)
            }
            Err(e) => {
                warn!(post_id, error = %e, "comment submission failed");
                self.notifier
                    .notify(NoticeKind::Error, &format!("Could not post your comment: {}", e));
                Err(e)
            }
        }
    }
}

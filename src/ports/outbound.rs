//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{
    Comment, DomainError, Identity, NewComment, NewPost, NewVote, NoticeKind, Post, StoreChange,
    Subreddit, Vote,
};
use tokio::sync::broadcast;

/// Read side of the record store.
#[async_trait::async_trait]
pub trait PostReader: Send + Sync {
    /// Fetch one post with nested comments, community and votes.
    /// `Ok(None)` means the store has no such post.
    async fn fetch_post(&self, post_id: i64) -> Result<Option<Post>, DomainError>;

    /// Fetch the vote records of a post in store order.
    /// `Ok(None)` means the store did not report a vote list (not yet known);
    /// `Ok(Some(vec![]))` means the post is known to have no votes.
    async fn fetch_votes(&self, post_id: i64) -> Result<Option<Vec<Vote>>, DomainError>;

    /// All posts, newest first.
    async fn list_posts(&self) -> Result<Vec<Post>, DomainError>;

    /// Posts of one community, newest first.
    async fn list_posts_by_topic(&self, topic: &str) -> Result<Vec<Post>, DomainError>;

    async fn subreddit_by_topic(&self, topic: &str) -> Result<Option<Subreddit>, DomainError>;

    /// Up to `limit` communities for the "top communities" list.
    async fn list_subreddits(&self, limit: usize) -> Result<Vec<Subreddit>, DomainError>;
}

/// Write side of the record store. Request/response. A new vote supersedes
/// the voter's earlier vote on the same post.
#[async_trait::async_trait]
pub trait MutationPort: Send + Sync {
    async fn submit_vote(&self, vote: NewVote) -> Result<Vote, DomainError>;

    async fn submit_comment(&self, comment: NewComment) -> Result<Comment, DomainError>;
}

/// Community and post creation. Only local stores implement it (seeding).
#[async_trait::async_trait]
pub trait CommunityPort: Send + Sync {
    async fn create_subreddit(&self, topic: &str) -> Result<Subreddit, DomainError>;

    async fn create_post(&self, post: NewPost) -> Result<Post, DomainError>;
}

/// Change notifications emitted after a write lands.
pub trait ChangeFeed: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}

/// Session provider. Read-only; the core never authenticates.
pub trait SessionPort: Send + Sync {
    fn current_identity(&self) -> Option<Identity>;
}

/// Fire-and-forget user feedback sink.
pub trait NotifierPort: Send + Sync {
    fn notify(&self, kind: NoticeKind, message: &str);
}

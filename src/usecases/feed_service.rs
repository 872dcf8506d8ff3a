//! Feed browsing: home feed, community feed, community lookup and the
//! "top communities" list. Read-only; order is whatever the store returns.

use crate::domain::{DomainError, Post, Subreddit};
use crate::ports::PostReader;
use std::sync::Arc;
use tracing::info;

/// Communities shown on the home page.
pub const DEFAULT_TOP_COMMUNITIES: usize = 10;

pub struct FeedService {
    reader: Arc<dyn PostReader>,
}

impl FeedService {
    pub fn new(reader: Arc<dyn PostReader>) -> Self {
        Self { reader }
    }

    /// Home feed, or a single community's feed when `topic` is given.
    pub async fn feed(&self, topic: Option<&str>) -> Result<Vec<Post>, DomainError> {
        let posts = match topic {
            Some(topic) => self.reader.list_posts_by_topic(topic).await?,
            None => self.reader.list_posts().await?,
        };
        info!(topic = topic.unwrap_or("*"), count = posts.len(), "feed loaded");
        Ok(posts)
    }

    pub async fn subreddit(&self, topic: &str) -> Result<Option<Subreddit>, DomainError> {
        self.reader.subreddit_by_topic(topic).await
    }

    pub async fn top_subreddits(&self, limit: usize) -> Result<Vec<Subreddit>, DomainError> {
        self.reader.list_subreddits(limit).await
    }
}

//! In-memory record store. Implements the read, write and change-feed ports.
//!
//! Records are kept in insertion order, which is the order readers see.
//! At most one vote per (post, voter): a changed vote replaces the voter's
//! record in place, keeping its id and position.

use crate::domain::{
    Comment, DomainError, Identity, NewComment, NewPost, NewVote, Post, StoreChange, Subreddit,
    Vote,
};
use crate::ports::{ChangeFeed, CommunityPort, MutationPort, PostReader};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{RwLock, broadcast};
use tracing::debug;

/// Capacity of the change broadcast. Slow subscribers see `Lagged` and re-read.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
struct StoredPost {
    id: i64,
    title: String,
    body: String,
    image: Option<String>,
    subreddit_id: i64,
    author: Identity,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MemoryData {
    subreddits: Vec<Subreddit>,
    posts: Vec<StoredPost>,
    comments: Vec<Comment>,
    votes: Vec<Vote>,
    last_id: i64,
}

impl MemoryData {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn assemble(&self, stored: &StoredPost) -> Post {
        Post {
            id: stored.id,
            title: stored.title.clone(),
            body: stored.body.clone(),
            image: stored.image.clone(),
            subreddit: self
                .subreddits
                .iter()
                .find(|s| s.id == stored.subreddit_id)
                .cloned(),
            author: stored.author.clone(),
            created_at: stored.created_at,
            comments: self
                .comments
                .iter()
                .filter(|c| c.post_id == stored.id)
                .cloned()
                .collect(),
            votes: self.votes_for(stored.id),
        }
    }

    fn votes_for(&self, post_id: i64) -> Vec<Vote> {
        self.votes
            .iter()
            .filter(|v| v.post_id == post_id)
            .cloned()
            .collect()
    }

    /// Newest first; later insertions win ties.
    fn posts_newest_first(&self, filter: impl Fn(&StoredPost) -> bool) -> Vec<Post> {
        self.posts
            .iter()
            .rev()
            .filter(|p| filter(p))
            .map(|p| self.assemble(p))
            .collect()
    }
}

/// Process-local store. Thread-safe via tokio RwLock.
pub struct MemoryStore {
    data: RwLock<MemoryData>,
    changes: broadcast::Sender<StoreChange>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            data: RwLock::new(MemoryData::default()),
            changes,
            writes: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        }
    }

    /// Number of vote/comment write requests that reached the store (including failed ones).
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make subsequent vote/comment writes fail with a transport error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent reads fail with a transport error.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check_read(&self) -> Result<(), DomainError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DomainError::Transport("memory store: read refused".into()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), DomainError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::Transport("memory store: write refused".into()));
        }
        Ok(())
    }

    fn publish(&self, change: StoreChange) {
        // No subscribers is fine.
        let _ = self.changes.send(change);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PostReader for MemoryStore {
    async fn fetch_post(&self, post_id: i64) -> Result<Option<Post>, DomainError> {
        self.check_read()?;
        let data = self.data.read().await;
        Ok(data
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .map(|p| data.assemble(p)))
    }

    async fn fetch_votes(&self, post_id: i64) -> Result<Option<Vec<Vote>>, DomainError> {
        self.check_read()?;
        Ok(Some(self.data.read().await.votes_for(post_id)))
    }

    async fn list_posts(&self) -> Result<Vec<Post>, DomainError> {
        self.check_read()?;
        Ok(self.data.read().await.posts_newest_first(|_| true))
    }

    async fn list_posts_by_topic(&self, topic: &str) -> Result<Vec<Post>, DomainError> {
        self.check_read()?;
        let data = self.data.read().await;
        let Some(subreddit_id) = data
            .subreddits
            .iter()
            .find(|s| s.topic == topic)
            .map(|s| s.id)
        else {
            return Ok(Vec::new());
        };
        Ok(data.posts_newest_first(|p| p.subreddit_id == subreddit_id))
    }

    async fn subreddit_by_topic(&self, topic: &str) -> Result<Option<Subreddit>, DomainError> {
        self.check_read()?;
        let data = self.data.read().await;
        Ok(data.subreddits.iter().find(|s| s.topic == topic).cloned())
    }

    async fn list_subreddits(&self, limit: usize) -> Result<Vec<Subreddit>, DomainError> {
        self.check_read()?;
        let data = self.data.read().await;
        Ok(data.subreddits.iter().take(limit).cloned().collect())
    }
}

#[async_trait::async_trait]
impl MutationPort for MemoryStore {
    async fn submit_vote(&self, vote: NewVote) -> Result<Vote, DomainError> {
        self.check_write()?;
        let record = {
            let mut data = self.data.write().await;
            if !data.posts.iter().any(|p| p.id == vote.post_id) {
                return Err(DomainError::Repo(format!("post {} not found", vote.post_id)));
            }
            let existing = data
                .votes
                .iter()
                .position(|v| v.post_id == vote.post_id && v.voter == vote.voter);
            match existing {
                Some(index) => {
                    let slot = &mut data.votes[index];
                    slot.direction = vote.direction;
                    slot.created_at = Utc::now();
                    slot.clone()
                }
                None => {
                    let record = Vote {
                        id: data.next_id(),
                        post_id: vote.post_id,
                        voter: vote.voter,
                        direction: vote.direction,
                        created_at: Utc::now(),
                    };
                    data.votes.push(record.clone());
                    record
                }
            }
        };
        debug!(post_id = record.post_id, vote_id = record.id, direction = %record.direction, "vote stored");
        self.publish(StoreChange::VotesChanged {
            post_id: record.post_id,
        });
        Ok(record)
    }

    async fn submit_comment(&self, comment: NewComment) -> Result<Comment, DomainError> {
        self.check_write()?;
        let record = {
            let mut data = self.data.write().await;
            if !data.posts.iter().any(|p| p.id == comment.post_id) {
                return Err(DomainError::Repo(format!(
                    "post {} not found",
                    comment.post_id
                )));
            }
            let record = Comment {
                id: data.next_id(),
                post_id: comment.post_id,
                author: comment.author,
                text: comment.text,
                created_at: Utc::now(),
            };
            data.comments.push(record.clone());
            record
        };
        debug!(post_id = record.post_id, comment_id = record.id, "comment stored");
        self.publish(StoreChange::CommentsChanged {
            post_id: record.post_id,
        });
        Ok(record)
    }
}

#[async_trait::async_trait]
impl CommunityPort for MemoryStore {
    async fn create_subreddit(&self, topic: &str) -> Result<Subreddit, DomainError> {
        let mut data = self.data.write().await;
        if let Some(existing) = data.subreddits.iter().find(|s| s.topic == topic) {
            return Ok(existing.clone());
        }
        let subreddit = Subreddit {
            id: data.next_id(),
            topic: topic.to_string(),
            created_at: Utc::now(),
        };
        data.subreddits.push(subreddit.clone());
        Ok(subreddit)
    }

    async fn create_post(&self, post: NewPost) -> Result<Post, DomainError> {
        let mut data = self.data.write().await;
        if !data.subreddits.iter().any(|s| s.id == post.subreddit_id) {
            return Err(DomainError::Repo(format!(
                "subreddit {} not found",
                post.subreddit_id
            )));
        }
        let stored = StoredPost {
            id: data.next_id(),
            title: post.title,
            body: post.body,
            image: post.image.filter(|i| !i.is_empty()),
            subreddit_id: post.subreddit_id,
            author: post.author,
            created_at: Utc::now(),
        };
        data.posts.push(stored.clone());
        Ok(data.assemble(&stored))
    }
}

impl ChangeFeed for MemoryStore {
    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

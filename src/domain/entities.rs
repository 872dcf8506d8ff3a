//! Domain entities. Pure data structures for the core business.
//!
//! No transport/storage types here; adapters map their rows and wire
//! payloads into these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A user identity as supplied by the session provider (the display name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Vote direction. On the wire this is the boolean `upvote` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn from_upvote(upvote: bool) -> Self {
        if upvote { Self::Up } else { Self::Down }
    }

    pub fn is_up(self) -> bool {
        matches!(self, Self::Up)
    }

    /// Signed contribution to a tally: +1 for up, -1 for down.
    pub fn weight(self) -> i64 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("up"),
            Self::Down => f.write_str("down"),
        }
    }
}

/// A topic-based community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subreddit {
    pub id: i64,
    pub topic: String,
    pub created_at: DateTime<Utc>,
}

/// A single directional vote record. Never updated in place: a changed vote
/// is a newer record for the same voter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: i64,
    pub post_id: i64,
    pub voter: Identity,
    pub direction: Direction,
    pub created_at: DateTime<Utc>,
}

/// An immutable comment on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author: Identity,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Read-only projection of a post with its nested records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub image: Option<String>,
    /// Owning community. `None` when the store returned no community row.
    pub subreddit: Option<Subreddit>,
    pub author: Identity,
    pub created_at: DateTime<Utc>,
    pub comments: Vec<Comment>,
    pub votes: Vec<Vote>,
}

impl Post {
    pub fn topic(&self) -> Option<&str> {
        self.subreddit.as_ref().map(|s| s.topic.as_str())
    }

    /// Route of the post detail page: `/r/{topic}/post/{id}`.
    pub fn permalink(&self) -> String {
        format!("/r/{}/post/{}", self.topic().unwrap_or_default(), self.id)
    }

    /// Detail page title: `{title} | r/{topic}`.
    pub fn page_title(&self) -> String {
        format!("{} | r/{}", self.title, self.topic().unwrap_or_default())
    }
}

/// Vote creation request sent to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVote {
    pub post_id: i64,
    pub voter: Identity,
    pub direction: Direction,
}

/// Comment creation request sent to the store. `text` is passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post_id: i64,
    pub author: Identity,
    pub text: String,
}

/// Post creation request (used for seeding local stores).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub image: Option<String>,
    pub subreddit_id: i64,
    pub author: Identity,
}

/// Loading state of a post as seen by a view.
///
/// `Loading`: no answer from the store yet. `Empty`: the store answered and
/// has no such post. Neither state carries partial post data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PostState {
    #[default]
    Loading,
    Empty,
    Ready(Post),
}

impl PostState {
    pub fn post(&self) -> Option<&Post> {
        match self {
            Self::Ready(post) => Some(post),
            Self::Loading | Self::Empty => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

impl From<Option<Post>> for PostState {
    fn from(value: Option<Post>) -> Self {
        match value {
            Some(post) => Self::Ready(post),
            None => Self::Empty,
        }
    }
}

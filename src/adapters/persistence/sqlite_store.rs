//! SQLite-backed record store via libsql. Implements the read, write and
//! change-feed ports.
//!
//! Four tables (subreddit, post, comment, vote). Reads return records in
//! creation order, post lists newest first. A vote row is unique per
//! (post, voter): a changed vote updates that row and keeps its position.

use crate::domain::{
    Comment, Direction, DomainError, Identity, NewComment, NewPost, NewVote, Post, StoreChange,
    Subreddit, Vote,
};
use crate::ports::{ChangeFeed, CommunityPort, MutationPort, PostReader};
use chrono::{DateTime, Utc};
use libsql::{Connection, Row, params};
use std::path::Path;
use tokio::sync::broadcast;
use tracing::{debug, info};

const SUBREDDIT_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS subreddit (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    topic TEXT NOT NULL UNIQUE,
    created_at INTEGER NOT NULL
)"#;

const POST_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS post (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    body TEXT NOT NULL DEFAULT '',
    image TEXT,
    subreddit_id INTEGER NOT NULL REFERENCES subreddit (id),
    username TEXT NOT NULL,
    created_at INTEGER NOT NULL
)"#;

const COMMENT_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS comment (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id INTEGER NOT NULL REFERENCES post (id),
    username TEXT NOT NULL,
    text TEXT NOT NULL,
    created_at INTEGER NOT NULL
)"#;

const VOTE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS vote (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id INTEGER NOT NULL REFERENCES post (id),
    username TEXT NOT NULL,
    upvote INTEGER NOT NULL,
    created_at INTEGER NOT NULL
)"#;

const VOTE_INDEX: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_vote_voter ON vote (post_id, username)";

const VOTE_UPSERT: &str = "INSERT INTO vote (post_id, username, upvote, created_at) \
                           VALUES (?1, ?2, ?3, ?4) \
                           ON CONFLICT (post_id, username) \
                           DO UPDATE SET upvote = excluded.upvote, created_at = excluded.created_at \
                           RETURNING id";
const COMMENT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_comment_post ON comment (post_id, created_at)";

const POST_COLUMNS: &str = "p.id, p.title, p.body, p.image, p.username, p.created_at, \
                            s.id, s.topic, s.created_at";

const CHANGE_CHANNEL_CAPACITY: usize = 64;

fn repo_err(e: libsql::Error) -> DomainError {
    DomainError::Repo(e.to_string())
}

fn millis_to_time(ms: i64) -> Result<DateTime<Utc>, DomainError> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| DomainError::Repo(format!("timestamp {} out of range", ms)))
}

/// Post row without its nested comments and votes.
fn row_to_post(row: &Row) -> Result<Post, DomainError> {
    let subreddit = match row.get::<i64>(6).ok() {
        Some(id) => Some(Subreddit {
            id,
            topic: row.get::<String>(7).map_err(repo_err)?,
            created_at: millis_to_time(row.get::<i64>(8).map_err(repo_err)?)?,
        }),
        None => None,
    };
    Ok(Post {
        id: row.get(0).map_err(repo_err)?,
        title: row.get(1).map_err(repo_err)?,
        body: row.get::<String>(2).map_err(repo_err)?,
        image: row.get::<String>(3).ok().filter(|i| !i.is_empty()),
        subreddit,
        author: Identity::new(row.get::<String>(4).map_err(repo_err)?),
        created_at: millis_to_time(row.get::<i64>(5).map_err(repo_err)?)?,
        comments: Vec::new(),
        votes: Vec::new(),
    })
}

fn row_to_vote(row: &Row) -> Result<Vote, DomainError> {
    Ok(Vote {
        id: row.get(0).map_err(repo_err)?,
        post_id: row.get(1).map_err(repo_err)?,
        voter: Identity::new(row.get::<String>(2).map_err(repo_err)?),
        direction: Direction::from_upvote(row.get::<i64>(3).map_err(repo_err)? != 0),
        created_at: millis_to_time(row.get::<i64>(4).map_err(repo_err)?)?,
    })
}

fn row_to_comment(row: &Row) -> Result<Comment, DomainError> {
    Ok(Comment {
        id: row.get(0).map_err(repo_err)?,
        post_id: row.get(1).map_err(repo_err)?,
        author: Identity::new(row.get::<String>(2).map_err(repo_err)?),
        text: row.get::<String>(3).map_err(repo_err)?,
        created_at: millis_to_time(row.get::<i64>(4).map_err(repo_err)?)?,
    })
}

fn row_to_subreddit(row: &Row) -> Result<Subreddit, DomainError> {
    Ok(Subreddit {
        id: row.get(0).map_err(repo_err)?,
        topic: row.get(1).map_err(repo_err)?,
        created_at: millis_to_time(row.get::<i64>(2).map_err(repo_err)?)?,
    })
}

/// SQLite store. One connection shared behind libsql's internal locking.
pub struct SqliteStore {
    conn: Connection,
    changes: broadcast::Sender<StoreChange>,
}

impl SqliteStore {
    /// Open (or create) `votes.db` in `base_dir` and ensure the schema exists.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(|e| DomainError::Repo(e.to_string()))?;
        let db_path = base.join("votes.db");
        let store = Self::open(&db_path.to_string_lossy()).await?;

        // WAL: concurrent readers with one writer. PRAGMA returns a row, so drain it.
        let mut wal_rows = store
            .conn
            .query("PRAGMA journal_mode=WAL", ())
            .await
            .map_err(|e| DomainError::Repo(format!("WAL pragma failed: {}", e)))?;
        while wal_rows.next().await.map_err(repo_err)?.is_some() {}

        info!(path = %db_path.display(), "SQLite store connected");
        Ok(store)
    }

    /// Private in-memory database, used by tests.
    pub async fn open_in_memory() -> Result<Self, DomainError> {
        Self::open(":memory:").await
    }

    async fn open(path: &str) -> Result<Self, DomainError> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(repo_err)?;
        let conn = db.connect().map_err(repo_err)?;
        for ddl in [
            SUBREDDIT_TABLE,
            POST_TABLE,
            COMMENT_TABLE,
            VOTE_TABLE,
            VOTE_INDEX,
            COMMENT_INDEX,
        ] {
            conn.execute(ddl, ()).await.map_err(repo_err)?;
        }
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self { conn, changes })
    }

    async fn query_posts(
        &self,
        filter: &str,
        args: impl libsql::params::IntoParams,
    ) -> Result<Vec<Post>, DomainError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM post p LEFT JOIN subreddit s ON s.id = p.subreddit_id \
             {filter} ORDER BY p.created_at DESC, p.id DESC"
        );
        let mut rows = self.conn.query(&sql, args).await.map_err(repo_err)?;
        let mut posts = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            posts.push(row_to_post(&row)?);
        }
        for post in &mut posts {
            post.comments = self.comments_for(post.id).await?;
            post.votes = self.votes_for(post.id).await?;
        }
        Ok(posts)
    }

    async fn votes_for(&self, post_id: i64) -> Result<Vec<Vote>, DomainError> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, post_id, username, upvote, created_at FROM vote \
                 WHERE post_id = ?1 ORDER BY id",
                params![post_id],
            )
            .await
            .map_err(repo_err)?;
        let mut votes = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            votes.push(row_to_vote(&row)?);
        }
        Ok(votes)
    }

    async fn comments_for(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, post_id, username, text, created_at FROM comment \
                 WHERE post_id = ?1 ORDER BY created_at, id",
                params![post_id],
            )
            .await
            .map_err(repo_err)?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            comments.push(row_to_comment(&row)?);
        }
        Ok(comments)
    }

    async fn post_exists(&self, post_id: i64) -> Result<bool, DomainError> {
        let mut rows = self
            .conn
            .query("SELECT 1 FROM post WHERE id = ?1", params![post_id])
            .await
            .map_err(repo_err)?;
        Ok(rows.next().await.map_err(repo_err)?.is_some())
    }

    fn publish(&self, change: StoreChange) {
        let _ = self.changes.send(change);
    }
}

#[async_trait::async_trait]
impl PostReader for SqliteStore {
    async fn fetch_post(&self, post_id: i64) -> Result<Option<Post>, DomainError> {
        let mut posts = self.query_posts("WHERE p.id = ?1", params![post_id]).await?;
        Ok(posts.pop())
    }

    async fn fetch_votes(&self, post_id: i64) -> Result<Option<Vec<Vote>>, DomainError> {
        self.votes_for(post_id).await.map(Some)
    }

    async fn list_posts(&self) -> Result<Vec<Post>, DomainError> {
        self.query_posts("", ()).await
    }

    async fn list_posts_by_topic(&self, topic: &str) -> Result<Vec<Post>, DomainError> {
        self.query_posts("WHERE s.topic = ?1", params![topic]).await
    }

    async fn subreddit_by_topic(&self, topic: &str) -> Result<Option<Subreddit>, DomainError> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, topic, created_at FROM subreddit WHERE topic = ?1",
                params![topic],
            )
            .await
            .map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => Ok(Some(row_to_subreddit(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_subreddits(&self, limit: usize) -> Result<Vec<Subreddit>, DomainError> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, topic, created_at FROM subreddit ORDER BY created_at, id LIMIT ?1",
                params![limit as i64],
            )
            .await
            .map_err(repo_err)?;
        let mut subreddits = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            subreddits.push(row_to_subreddit(&row)?);
        }
        Ok(subreddits)
    }
}

#[async_trait::async_trait]
impl MutationPort for SqliteStore {
    async fn submit_vote(&self, vote: NewVote) -> Result<Vote, DomainError> {
        if !self.post_exists(vote.post_id).await? {
            return Err(DomainError::Repo(format!("post {} not found", vote.post_id)));
        }
        let created_at = Utc::now();
        let mut rows = self
            .conn
            .query(
                VOTE_UPSERT,
                params![
                    vote.post_id,
                    vote.voter.as_str(),
                    i64::from(vote.direction.is_up()),
                    created_at.timestamp_millis()
                ],
            )
            .await
            .map_err(repo_err)?;
        let id: i64 = match rows.next().await.map_err(repo_err)? {
            Some(row) => row.get(0).map_err(repo_err)?,
            None => return Err(DomainError::Repo("vote upsert returned no row".into())),
        };
        let record = Vote {
            id,
            post_id: vote.post_id,
            voter: vote.voter,
            direction: vote.direction,
            created_at,
        };
        debug!(post_id = record.post_id, vote_id = record.id, direction = %record.direction, "vote row upserted");
        self.publish(StoreChange::VotesChanged {
            post_id: record.post_id,
        });
        Ok(record)
    }

    async fn submit_comment(&self, comment: NewComment) -> Result<Comment, DomainError> {
        if !self.post_exists(comment.post_id).await? {
            return Err(DomainError::Repo(format!(
                "post {} not found",
                comment.post_id
            )));
        }
        let created_at = Utc::now();
        self.conn
            .execute(
                "INSERT INTO comment (post_id, username, text, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    comment.post_id,
                    comment.author.as_str(),
                    comment.text.as_str(),
                    created_at.timestamp_millis()
                ],
            )
            .await
            .map_err(repo_err)?;
        let record = Comment {
            id: self.conn.last_insert_rowid(),
            post_id: comment.post_id,
            author: comment.author,
            text: comment.text,
            created_at,
        };
        debug!(post_id = record.post_id, comment_id = record.id, "comment row inserted");
        self.publish(StoreChange::CommentsChanged {
            post_id: record.post_id,
        });
        Ok(record)
    }
}

#[async_trait::async_trait]
impl CommunityPort for SqliteStore {
    async fn create_subreddit(&self, topic: &str) -> Result<Subreddit, DomainError> {
        if let Some(existing) = self.subreddit_by_topic(topic).await? {
            return Ok(existing);
        }
        let created_at = Utc::now();
        self.conn
            .execute(
                "INSERT INTO subreddit (topic, created_at) VALUES (?1, ?2)",
                params![topic, created_at.timestamp_millis()],
            )
            .await
            .map_err(repo_err)?;
        Ok(Subreddit {
            id: self.conn.last_insert_rowid(),
            topic: topic.to_string(),
            created_at,
        })
    }

    async fn create_post(&self, post: NewPost) -> Result<Post, DomainError> {
        let created_at = Utc::now();
        let image = post.image.filter(|i| !i.is_empty());
        self.conn
            .execute(
                "INSERT INTO post (title, body, image, subreddit_id, username, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    post.title.as_str(),
                    post.body.as_str(),
                    image.clone(),
                    post.subreddit_id,
                    post.author.as_str(),
                    created_at.timestamp_millis()
                ],
            )
            .await
            .map_err(repo_err)?;
        let id = self.conn.last_insert_rowid();
        self.fetch_post(id)
            .await?
            .ok_or_else(|| DomainError::Repo(format!("post {} vanished after insert", id)))
    }
}

impl ChangeFeed for SqliteStore {
    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_post() -> (SqliteStore, Post) {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let sub = store.create_subreddit("rust").await.unwrap();
        let post = store
            .create_post(NewPost {
                title: "Lifetimes".into(),
                body: "explain".into(),
                image: None,
                subreddit_id: sub.id,
                author: Identity::new("op"),
            })
            .await
            .unwrap();
        (store, post)
    }

    #[tokio::test]
    async fn test_create_and_fetch_post() {
        let (store, post) = store_with_post().await;
        assert_eq!(post.topic(), Some("rust"));
        assert_eq!(post.author, Identity::new("op"));
        assert!(post.votes.is_empty());

        let fetched = store.fetch_post(post.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Lifetimes");
        assert!(store.fetch_post(post.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_changed_vote_updates_row_in_place() {
        let (store, post) = store_with_post().await;
        let mut rx = store.subscribe();
        for (voter, direction) in [("a", Direction::Up), ("b", Direction::Down), ("a", Direction::Down)] {
            store
                .submit_vote(NewVote {
                    post_id: post.id,
                    voter: Identity::new(voter),
                    direction,
                })
                .await
                .unwrap();
        }
        let votes = store.fetch_votes(post.id).await.unwrap().unwrap();
        let got: Vec<(&str, Direction)> = votes
            .iter()
            .map(|v| (v.voter.as_str(), v.direction))
            .collect();
        assert_eq!(got, vec![("a", Direction::Down), ("b", Direction::Down)]);
        assert_eq!(
            rx.recv().await.unwrap(),
            StoreChange::VotesChanged { post_id: post.id }
        );
    }

    #[tokio::test]
    async fn test_vote_on_missing_post_rejected() {
        let (store, post) = store_with_post().await;
        let err = store
            .submit_vote(NewVote {
                post_id: post.id + 10,
                voter: Identity::new("a"),
                direction: Direction::Up,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Repo(_)));
    }

    #[tokio::test]
    async fn test_comments_nested_in_post() {
        let (store, post) = store_with_post().await;
        store
            .submit_comment(NewComment {
                post_id: post.id,
                author: Identity::new("bob"),
                text: "nice".into(),
            })
            .await
            .unwrap();
        let fetched = store.fetch_post(post.id).await.unwrap().unwrap();
        assert_eq!(fetched.comments.len(), 1);
        assert_eq!(fetched.comments[0].author, Identity::new("bob"));
    }

    #[tokio::test]
    async fn test_topic_queries() {
        let (store, _) = store_with_post().await;
        store.create_subreddit("golang").await.unwrap();
        // Creating an existing topic returns the existing row.
        let again = store.create_subreddit("rust").await.unwrap();

        assert_eq!(store.list_subreddits(10).await.unwrap().len(), 2);
        assert_eq!(
            store.subreddit_by_topic("rust").await.unwrap().map(|s| s.id),
            Some(again.id)
        );
        assert_eq!(store.list_posts_by_topic("rust").await.unwrap().len(), 1);
        assert!(store.list_posts_by_topic("golang").await.unwrap().is_empty());
        assert_eq!(store.list_posts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_switched_vote_returns_same_row_id() {
        let (store, post) = store_with_post().await;
        let up = store
            .submit_vote(NewVote {
                post_id: post.id,
                voter: Identity::new("alice"),
                direction: Direction::Up,
            })
            .await
            .unwrap();
        let down = store
            .submit_vote(NewVote {
                post_id: post.id,
                voter: Identity::new("alice"),
                direction: Direction::Down,
            })
            .await
            .unwrap();
        assert_eq!(up.id, down.id);
        let fetched = store.fetch_post(post.id).await.unwrap().unwrap();
        assert_eq!(fetched.votes.len(), 1);
        assert_eq!(fetched.votes[0].direction, Direction::Down);
    }

    #[tokio::test]
    async fn test_corrupt_timestamp_is_reported() {
        let (store, post) = store_with_post().await;
        store
            .conn
            .execute(
                "INSERT INTO vote (post_id, username, upvote, created_at) VALUES (?1, 'x', 1, ?2)",
                params![post.id, i64::MAX],
            )
            .await
            .unwrap();
        let err = store.fetch_votes(post.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Repo(_)));
    }
}

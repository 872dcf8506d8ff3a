//! Wire shapes of the GraphQL backend and their mapping to domain entities.
//!
//! Field names follow the backend schema (snake_case, `username`, `upvote`).
//! Ids may arrive as numbers or numeric strings.

use crate::domain::{Comment, Direction, DomainError, Identity, Post, Subreddit, Vote};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Standard GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlError {
    pub message: String,
}

fn id_from_any<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Num(i64),
        Text(String),
    }
    match RawId::deserialize(deserializer)? {
        RawId::Num(n) => Ok(n),
        RawId::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Deserialize)]
pub struct WireSubreddit {
    #[serde(deserialize_with = "id_from_any")]
    pub id: i64,
    pub topic: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct WireVote {
    #[serde(deserialize_with = "id_from_any")]
    pub id: i64,
    #[serde(deserialize_with = "id_from_any")]
    pub post_id: i64,
    pub upvote: bool,
    pub username: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct WireComment {
    #[serde(deserialize_with = "id_from_any")]
    pub id: i64,
    #[serde(deserialize_with = "id_from_any")]
    pub post_id: i64,
    pub text: String,
    pub username: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct WirePost {
    #[serde(deserialize_with = "id_from_any")]
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    pub username: String,
    pub created_at: String,
    #[serde(default)]
    pub comments: Option<Vec<WireComment>>,
    #[serde(default)]
    pub subreddit: Option<Vec<WireSubreddit>>,
    #[serde(default)]
    pub votes: Option<Vec<WireVote>>,
}

/// Accepts RFC 3339 and the backend's zone-less `YYYY-MM-DDTHH:MM:SS[.f]` (UTC).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DomainError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| DomainError::Transport(format!("bad timestamp {:?}: {}", raw, e)))
}

pub fn subreddit_to_domain(w: WireSubreddit) -> Result<Subreddit, DomainError> {
    Ok(Subreddit {
        id: w.id,
        topic: w.topic,
        created_at: parse_timestamp(&w.created_at)?,
    })
}

pub fn vote_to_domain(w: WireVote) -> Result<Vote, DomainError> {
    Ok(Vote {
        id: w.id,
        post_id: w.post_id,
        voter: Identity::new(w.username),
        direction: Direction::from_upvote(w.upvote),
        created_at: parse_timestamp(&w.created_at)?,
    })
}

pub fn comment_to_domain(w: WireComment) -> Result<Comment, DomainError> {
    Ok(Comment {
        id: w.id,
        post_id: w.post_id,
        author: Identity::new(w.username),
        text: w.text,
        created_at: parse_timestamp(&w.created_at)?,
    })
}

/// Map a post. The community comes as a list; its first element owns the post.
/// Nested lists keep server order.
pub fn post_to_domain(w: WirePost) -> Result<Post, DomainError> {
    let subreddit = w
        .subreddit
        .unwrap_or_default()
        .into_iter()
        .next()
        .map(subreddit_to_domain)
        .transpose()?;
    Ok(Post {
        id: w.id,
        title: w.title,
        body: w.body.unwrap_or_default(),
        image: w.image.filter(|i| !i.is_empty()),
        subreddit,
        author: Identity::new(w.username),
        created_at: parse_timestamp(&w.created_at)?,
        comments: w
            .comments
            .unwrap_or_default()
            .into_iter()
            .map(comment_to_domain)
            .collect::<Result<_, _>>()?,
        votes: w
            .votes
            .unwrap_or_default()
            .into_iter()
            .map(vote_to_domain)
            .collect::<Result<_, _>>()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_timestamp_variants() {
        assert!(parse_timestamp("2022-07-10T12:30:00+00:00").is_ok());
        assert!(parse_timestamp("2022-07-10T12:30:00.123456").is_ok());
        assert_eq!(
            parse_timestamp("2022-07-10 12:30:00").unwrap().year(),
            2022
        );
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(DomainError::Transport(_))
        ));
    }

    #[test]
    fn test_post_mapping_keeps_order_and_first_community() {
        let json = r#"{
            "id": "7",
            "title": "Hello",
            "body": "World",
            "image": "",
            "username": "op",
            "created_at": "2022-07-10T12:00:00+00:00",
            "subreddit": [
                {"id": 3, "topic": "rust", "created_at": "2022-07-01T00:00:00+00:00"}
            ],
            "comments": [],
            "votes": [
                {"id": 1, "post_id": 7, "upvote": false, "username": "a", "created_at": "2022-07-10T12:01:00+00:00"},
                {"id": 2, "post_id": 7, "upvote": true, "username": "b", "created_at": "2022-07-10T12:02:00+00:00"}
            ]
        }"#;
        let wire: WirePost = serde_json::from_str(json).unwrap();
        let post = post_to_domain(wire).unwrap();
        assert_eq!(post.id, 7);
        assert_eq!(post.image, None);
        assert_eq!(post.topic(), Some("rust"));
        assert_eq!(post.votes[0].direction, Direction::Down);
        assert_eq!(post.votes[1].voter, Identity::new("b"));
    }

    #[test]
    fn test_post_without_nested_lists() {
        let json = r#"{"id": 1, "title": "t", "username": "u", "created_at": "2022-07-10T12:00:00Z"}"#;
        let post = post_to_domain(serde_json::from_str(json).unwrap()).unwrap();
        assert!(post.subreddit.is_none());
        assert!(post.comments.is_empty());
        assert_eq!(post.body, "");
    }

    #[test]
    fn test_error_envelope() {
        let json = r#"{"data": null, "errors": [{"message": "boom"}]}"#;
        let resp: GraphqlResponse<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert!(resp.data.is_none());
        assert_eq!(resp.errors.unwrap()[0].message, "boom");
    }
}

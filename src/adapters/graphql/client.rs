//! GraphQL-over-HTTP record store. Implements the read, write and change-feed
//! ports against the hosted backend.
//!
//! Change events are local: they are emitted after this client's own writes
//! succeed, not pushed by the server.

use super::documents::{
    ADD_COMMENT, ADD_VOTE, GET_ALL_POSTS, GET_ALL_POSTS_BY_TOPIC, GET_POST_BY_POST_ID,
    GET_SUBREDDIT_BY_TOPIC, GET_SUBREDDITS_WITH_LIMIT, GET_VOTES_BY_POST_ID,
};
use super::wire::{
    GraphqlResponse, WireComment, WirePost, WireSubreddit, WireVote, comment_to_domain,
    post_to_domain, subreddit_to_domain, vote_to_domain,
};
use crate::domain::{
    Comment, DomainError, NewComment, NewVote, Post, StoreChange, Subreddit, Vote,
};
use crate::ports::{ChangeFeed, MutationPort, PostReader};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Deserialize)]
struct PostListData {
    #[serde(rename = "getPostList")]
    posts: Option<Vec<WirePost>>,
}

#[derive(Deserialize)]
struct PostListByTopicData {
    #[serde(rename = "getPostListByTopic")]
    posts: Option<Vec<WirePost>>,
}

#[derive(Deserialize)]
struct PostByIdData {
    #[serde(rename = "getPostListByPostId")]
    post: Option<WirePost>,
}

#[derive(Deserialize)]
struct VotesData {
    #[serde(rename = "getVotesByPostId")]
    votes: Option<Vec<WireVote>>,
}

#[derive(Deserialize)]
struct SubredditByTopicData {
    #[serde(rename = "getSubredditListByTopic")]
    subreddits: Option<Vec<WireSubreddit>>,
}

#[derive(Deserialize)]
struct SubredditsWithLimitData {
    #[serde(rename = "getSubredditListWithLimit")]
    subreddits: Option<Vec<WireSubreddit>>,
}

#[derive(Deserialize)]
struct InsertVoteData {
    #[serde(rename = "insertVote")]
    vote: WireVote,
}

#[derive(Deserialize)]
struct InsertCommentData {
    #[serde(rename = "insertComment")]
    comment: WireComment,
}

/// Unwrap the GraphQL envelope: any `errors` entry fails the call.
fn unwrap_envelope<T>(response: GraphqlResponse<T>) -> Result<T, DomainError> {
    if let Some(errors) = response.errors.filter(|e| !e.is_empty()) {
        let joined = errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(DomainError::Transport(format!("GraphQL error: {}", joined)));
    }
    response
        .data
        .ok_or_else(|| DomainError::Transport("GraphQL response carried no data".into()))
}

/// A null vote list means "not known", not "no votes".
fn votes_to_domain(data: VotesData) -> Result<Option<Vec<Vote>>, DomainError> {
    data.votes
        .map(|votes| votes.into_iter().map(vote_to_domain).collect::<Result<Vec<_>, _>>())
        .transpose()
}

fn posts_to_domain(posts: Option<Vec<WirePost>>) -> Result<Vec<Post>, DomainError> {
    posts
        .unwrap_or_default()
        .into_iter()
        .map(post_to_domain)
        .collect()
}

pub struct GraphqlStore {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    changes: broadcast::Sender<StoreChange>,
}

impl GraphqlStore {
    /// # Arguments
    /// * `endpoint` - GraphQL endpoint URL
    /// * `api_key` - Sent as `Authorization: Apikey <key>` when present
    pub fn new(endpoint: String, api_key: Option<String>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            changes,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, DomainError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&GraphqlRequest { query, variables });
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Apikey {}", key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| DomainError::Transport(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %text, "GraphQL endpoint returned error");
            return Err(DomainError::Transport(format!(
                "API error {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        let envelope: GraphqlResponse<T> = response
            .json()
            .await
            .map_err(|e| DomainError::Transport(format!("Failed to parse response: {}", e)))?;
        unwrap_envelope(envelope)
    }

    fn publish(&self, change: StoreChange) {
        let _ = self.changes.send(change);
    }
}

#[async_trait::async_trait]
impl PostReader for GraphqlStore {
    async fn fetch_post(&self, post_id: i64) -> Result<Option<Post>, DomainError> {
        let data: PostByIdData = self
            .execute(GET_POST_BY_POST_ID, json!({ "post_id": post_id }))
            .await?;
        data.post.map(post_to_domain).transpose()
    }

    async fn fetch_votes(&self, post_id: i64) -> Result<Option<Vec<Vote>>, DomainError> {
        let data: VotesData = self
            .execute(GET_VOTES_BY_POST_ID, json!({ "post_id": post_id }))
            .await?;
        let votes = votes_to_domain(data)?;
        match &votes {
            Some(votes) => debug!(post_id, count = votes.len(), "votes fetched"),
            None => debug!(post_id, "vote list absent in response"),
        }
        Ok(votes)
    }

    async fn list_posts(&self) -> Result<Vec<Post>, DomainError> {
        let data: PostListData = self.execute(GET_ALL_POSTS, json!({})).await?;
        posts_to_domain(data.posts)
    }

    async fn list_posts_by_topic(&self, topic: &str) -> Result<Vec<Post>, DomainError> {
        let data: PostListByTopicData = self
            .execute(GET_ALL_POSTS_BY_TOPIC, json!({ "topic": topic }))
            .await?;
        posts_to_domain(data.posts)
    }

    async fn subreddit_by_topic(&self, topic: &str) -> Result<Option<Subreddit>, DomainError> {
        let data: SubredditByTopicData = self
            .execute(GET_SUBREDDIT_BY_TOPIC, json!({ "topic": topic }))
            .await?;
        data.subreddits
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(subreddit_to_domain)
            .transpose()
    }

    async fn list_subreddits(&self, limit: usize) -> Result<Vec<Subreddit>, DomainError> {
        let data: SubredditsWithLimitData = self
            .execute(GET_SUBREDDITS_WITH_LIMIT, json!({ "limit": limit }))
            .await?;
        data.subreddits
            .unwrap_or_default()
            .into_iter()
            .map(subreddit_to_domain)
            .collect()
    }
}

#[async_trait::async_trait]
impl MutationPort for GraphqlStore {
    async fn submit_vote(&self, vote: NewVote) -> Result<Vote, DomainError> {
        let data: InsertVoteData = self
            .execute(
                ADD_VOTE,
                json!({
                    "post_id": vote.post_id,
                    "username": vote.voter.as_str(),
                    "upvote": vote.direction.is_up(),
                }),
            )
            .await?;
        let record = vote_to_domain(data.vote)?;
        info!(post_id = record.post_id, vote_id = record.id, "vote inserted remotely");
        self.publish(StoreChange::VotesChanged {
            post_id: record.post_id,
        });
        Ok(record)
    }

    async fn submit_comment(&self, comment: NewComment) -> Result<Comment, DomainError> {
        let data: InsertCommentData = self
            .execute(
                ADD_COMMENT,
                json!({
                    "post_id": comment.post_id,
                    "username": comment.author.as_str(),
                    "text": comment.text,
                }),
            )
            .await?;
        let record = comment_to_domain(data.comment)?;
        info!(post_id = record.post_id, comment_id = record.id, "comment inserted remotely");
        self.publish(StoreChange::CommentsChanged {
            post_id: record.post_id,
        });
        Ok(record)
    }
}

impl ChangeFeed for GraphqlStore {
    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_errors_fail_call() {
        let resp: GraphqlResponse<VotesData> = serde_json::from_str(
            r#"{"data": null, "errors": [{"message": "a"}, {"message": "b"}]}"#,
        )
        .unwrap();
        match unwrap_envelope(resp) {
            Err(DomainError::Transport(msg)) => assert!(msg.contains("a; b")),
            _ => panic!("expected transport error"),
        }
    }

    #[test]
    fn test_envelope_missing_data() {
        let resp: GraphqlResponse<VotesData> = serde_json::from_str(r#"{}"#).unwrap();
        assert!(unwrap_envelope(resp).is_err());
    }

    #[test]
    fn test_votes_payload_in_server_order() {
        let resp: GraphqlResponse<VotesData> = serde_json::from_str(
            r#"{"data": {"getVotesByPostId": [
                {"id": 5, "post_id": 1, "upvote": true, "username": "x", "created_at": "2022-07-10T12:00:00Z"},
                {"id": 2, "post_id": 1, "upvote": false, "username": "y", "created_at": "2022-07-10T11:00:00Z"}
            ]}}"#,
        )
        .unwrap();
        let votes = votes_to_domain(unwrap_envelope(resp).unwrap())
            .unwrap()
            .unwrap();
        let ids: Vec<i64> = votes.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![5, 2]);
    }

    #[test]
    fn test_null_vote_list_is_unknown() {
        let resp: GraphqlResponse<VotesData> =
            serde_json::from_str(r#"{"data": {"getVotesByPostId": null}}"#).unwrap();
        assert_eq!(votes_to_domain(unwrap_envelope(resp).unwrap()).unwrap(), None);

        let empty: GraphqlResponse<VotesData> =
            serde_json::from_str(r#"{"data": {"getVotesByPostId": []}}"#).unwrap();
        assert_eq!(
            votes_to_domain(unwrap_envelope(empty).unwrap()).unwrap(),
            Some(Vec::new())
        );
    }

    #[test]
    fn test_null_post_is_absent() {
        let resp: GraphqlResponse<PostByIdData> =
            serde_json::from_str(r#"{"data": {"getPostListByPostId": null}}"#).unwrap();
        assert!(unwrap_envelope(resp).unwrap().post.is_none());
    }
}

//! GraphQL operation documents understood by the hosted backend.

pub const GET_ALL_POSTS: &str = r#"
query GetAllPosts {
  getPostList {
    body
    created_at
    id
    image
    title
    subreddit_id
    username
    comments { created_at id post_id text username }
    subreddit { created_at id topic }
    votes { created_at id post_id upvote username }
  }
}"#;

pub const GET_ALL_POSTS_BY_TOPIC: &str = r#"
query GetAllPostsByTopic($topic: String!) {
  getPostListByTopic(topic: $topic) {
    body
    created_at
    id
    image
    title
    subreddit_id
    username
    comments { created_at id post_id text username }
    subreddit { created_at id topic }
    votes { created_at id post_id upvote username }
  }
}"#;

pub const GET_POST_BY_POST_ID: &str = r#"
query GetPostByPostId($post_id: ID!) {
  getPostListByPostId(post_id: $post_id) {
    body
    created_at
    id
    image
    title
    subreddit_id
    username
    comments { created_at id post_id text username }
    subreddit { created_at id topic }
    votes { created_at id post_id upvote username }
  }
}"#;

pub const GET_VOTES_BY_POST_ID: &str = r#"
query GetVotesByPostId($post_id: ID!) {
  getVotesByPostId(post_id: $post_id) {
    created_at
    id
    post_id
    upvote
    username
  }
}"#;

pub const GET_SUBREDDIT_BY_TOPIC: &str = r#"
query GetSubredditByTopic($topic: String!) {
  getSubredditListByTopic(topic: $topic) {
    id
    topic
    created_at
  }
}"#;

pub const GET_SUBREDDITS_WITH_LIMIT: &str = r#"
query GetSubredditsWithLimit($limit: Int!) {
  getSubredditListWithLimit(limit: $limit) {
    id
    topic
    created_at
  }
}"#;

pub const ADD_VOTE: &str = r#"
mutation AddVote($post_id: ID!, $username: String!, $upvote: Boolean!) {
  insertVote(post_id: $post_id, username: $username, upvote: $upvote) {
    created_at
    id
    post_id
    upvote
    username
  }
}"#;

pub const ADD_COMMENT: &str = r#"
mutation AddComment($post_id: ID!, $username: String!, $text: String!) {
  insertComment(post_id: $post_id, username: $username, text: $text) {
    created_at
    id
    post_id
    text
    username
  }
}"#;

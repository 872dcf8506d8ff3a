//! Application use cases. Orchestrate domain logic via ports.

pub mod comment_submitter;
pub mod feed_service;
pub mod post_view;
pub mod vote_mutator;

pub use comment_submitter::{CommentDraft, CommentSubmitter};
pub use feed_service::{DEFAULT_TOP_COMMUNITIES, FeedService};
pub use post_view::{PlaceholderKind, PostCard, PostRender, PostView, Thread, ViewMode};
pub use vote_mutator::{VoteDecision, VoteMutator, VoteOutcome};

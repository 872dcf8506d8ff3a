//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;
pub mod events;
pub mod tally;

pub use entities::{
    Comment, Direction, Identity, NewComment, NewPost, NewVote, Post, PostState, Subreddit, Vote,
};
pub use errors::DomainError;
pub use events::{Notice, NoticeKind, StoreChange};
pub use tally::{VoteSummary, aggregate, own_vote, tally};

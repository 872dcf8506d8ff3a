//! Vote change requests for a single user.
//!
//! - Refuses without a session identity (`Unauthorized`, user notice)
//! - Skips requests that would not change the user's current vote
//! - Otherwise submits one new vote record; the caller re-reads afterwards

use crate::domain::{Direction, DomainError, Identity, NewVote, NoticeKind, Vote};
use crate::ports::{MutationPort, NotifierPort};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const SIGN_IN_TO_VOTE: &str = "You need to sign in to vote";

/// What the mutator decided before touching the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteDecision {
    Submit(NewVote),
    NoOp,
}

/// Result of a vote request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// A new record was accepted by the store.
    Submitted(Vote),
    /// The requested direction already holds; nothing was sent.
    NoOp,
}

impl VoteOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted(_))
    }
}

/// Decide whether a vote request needs a store write. Pure.
pub fn decide(
    post_id: i64,
    identity: Option<&Identity>,
    requested: Direction,
    current: Option<Direction>,
) -> Result<VoteDecision, DomainError> {
    let voter = identity.ok_or(DomainError::Unauthorized)?;
    if current == Some(requested) {
        return Ok(VoteDecision::NoOp);
    }
    Ok(VoteDecision::Submit(NewVote {
        post_id,
        voter: voter.clone(),
        direction: requested,
    }))
}

pub struct VoteMutator {
    mutations: Arc<dyn MutationPort>,
    notifier: Arc<dyn NotifierPort>,
}

impl VoteMutator {
    pub fn new(mutations: Arc<dyn MutationPort>, notifier: Arc<dyn NotifierPort>) -> Self {
        Self {
            mutations,
            notifier,
        }
    }

    /// Request `requested` for `post_id`. `current` is the user's own vote as
    /// derived from the latest snapshot.
    pub async fn cast(
        &self,
        post_id: i64,
        identity: Option<&Identity>,
        requested: Direction,
        current: Option<Direction>,
    ) -> Result<VoteOutcome, DomainError> {
        let request = match decide(post_id, identity, requested, current) {
            Ok(VoteDecision::Submit(request)) => request,
            Ok(VoteDecision::NoOp) => {
                debug!(post_id, direction = %requested, "vote unchanged, nothing to submit");
                return Ok(VoteOutcome::NoOp);
            }
            Err(e) => {
                warn!(post_id, "vote attempted without identity");
                self.notifier.notify(NoticeKind::Error, SIGN_IN_TO_VOTE);
                return Err(e);
            }
        };

        match self.mutations.submit_vote(request).await {
            Ok(vote) => {
                info!(post_id, vote_id = vote.id, direction = %vote.direction, "vote submitted");
                Ok(VoteOutcome::Submitted(vote))
            }
            Err(e) => {
                warn!(post_id, error = %e, "vote submission failed");
                self.notifier
                    .notify(NoticeKind::Error, &format!("Could not register your vote: {}", e));
                Err(e)
            }
        }
    }
}

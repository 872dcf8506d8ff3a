//! Vote aggregation. Pure functions over a vote snapshot.
//!
//! Callers must pass records in the order the store returned them: the
//! zero-sum tie-break and the duplicate own-vote rule both depend on it.

use super::entities::{Direction, Identity, Vote};
use serde::Serialize;

/// Derived vote state for one post and one viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteSummary {
    pub tally: i64,
    pub own_vote: Option<Direction>,
    /// Number of vote records in the snapshot.
    pub participants: usize,
}

/// Net display tally.
///
/// Empty snapshot → 0. A non-empty snapshot never displays 0: when ups and
/// downs cancel out, the first record's direction decides (+1 or -1).
pub fn tally(votes: &[Vote]) -> i64 {
    let Some(first) = votes.first() else {
        return 0;
    };
    let sum: i64 = votes.iter().map(|v| v.direction.weight()).sum();
    if sum == 0 { first.direction.weight() } else { sum }
}

/// The viewer's own direction. On duplicate records for the same voter the
/// last one in supplied order wins.
pub fn own_vote(votes: &[Vote], identity: Option<&Identity>) -> Option<Direction> {
    let identity = identity?;
    votes
        .iter()
        .rev()
        .find(|v| &v.voter == identity)
        .map(|v| v.direction)
}

pub fn aggregate(votes: &[Vote], identity: Option<&Identity>) -> VoteSummary {
    VoteSummary {
        tally: tally(votes),
        own_vote: own_vote(votes, identity),
        participants: votes.len(),
    }
}

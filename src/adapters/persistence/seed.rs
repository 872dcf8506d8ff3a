//! Demo content for local stores, so an empty backend has something to browse.

use crate::domain::{Direction, DomainError, Identity, NewComment, NewPost, NewVote};
use crate::ports::{CommunityPort, MutationPort, PostReader};
use tracing::info;

struct DemoPost {
    topic: &'static str,
    author: &'static str,
    title: &'static str,
    body: &'static str,
    votes: &'static [(&'static str, bool)],
    comments: &'static [(&'static str, &'static str)],
}

const DEMO_POSTS: &[DemoPost] = &[
    DemoPost {
        topic: "rust",
        author: "ferris",
        title: "What finally made the borrow checker click for you?",
        body: "Mine was rewriting a linked list three times.",
        votes: &[("alice", true), ("bob", true), ("carol", false)],
        comments: &[
            ("alice", "Reading the NLL RFC, oddly enough."),
            ("bob", "Writing a parser with owned tokens."),
        ],
    },
    DemoPost {
        topic: "rust",
        author: "alice",
        title: "Tokio or smol for a small CLI?",
        body: "Mostly HTTP calls and a bit of file IO.",
        // Balanced on purpose: the tally shows the first vote's direction.
        votes: &[("bob", false), ("ferris", true)],
        comments: &[],
    },
    DemoPost {
        topic: "gardening",
        author: "carol",
        title: "Tomatoes splitting after rain",
        body: "Any way to prevent this next season?",
        votes: &[],
        comments: &[("dave", "Water more evenly during dry spells.")],
    },
];

/// Populate an empty store. A store that already has posts is left alone.
pub async fn seed_demo<S>(store: &S) -> Result<(), DomainError>
where
    S: CommunityPort + MutationPort + PostReader,
{
    if !store.list_posts().await?.is_empty() {
        info!("store already has posts; skipping demo seed");
        return Ok(());
    }

    for demo in DEMO_POSTS {
        let subreddit = store.create_subreddit(demo.topic).await?;
        let post = store
            .create_post(NewPost {
                title: demo.title.to_string(),
                body: demo.body.to_string(),
                image: None,
                subreddit_id: subreddit.id,
                author: Identity::new(demo.author),
            })
            .await?;
        for &(voter, upvote) in demo.votes {
            store
                .submit_vote(NewVote {
                    post_id: post.id,
                    voter: Identity::new(voter),
                    direction: Direction::from_upvote(upvote),
                })
                .await?;
        }
        for &(author, text) in demo.comments {
            store
                .submit_comment(NewComment {
                    post_id: post.id,
                    author: Identity::new(author),
                    text: text.to_string(),
                })
                .await?;
        }
    }

    info!(posts = DEMO_POSTS.len(), "demo content seeded");
    Ok(())
}

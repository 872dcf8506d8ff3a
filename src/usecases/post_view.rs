//! Per-post view. Holds the latest post and vote snapshots and recomputes the
//! derived vote state whenever a snapshot is applied.
//!
//! Every fetch is issued with a ticket. Only the response to the most recently
//! issued fetch is applied; anything older that arrives later is dropped, so a
//! newer snapshot always supersedes an older one regardless of arrival order.
//! After a vote is accepted by the store the votes are re-read, strictly after
//! the write response has been observed.

use crate::domain::{
    Comment, Direction, DomainError, Identity, NoticeKind, Post, PostState, StoreChange, Vote,
    VoteSummary, aggregate,
};
use crate::ports::{MutationPort, NotifierPort, PostReader};
use crate::usecases::comment_submitter::{CommentDraft, CommentSubmitter};
use crate::usecases::vote_mutator::{VoteMutator, VoteOutcome};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Feed card: header, body, tally, comment count.
    #[default]
    Card,
    /// Detail page: card plus the comment thread and the comment form.
    Detail,
}

/// Identifies one issued fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

/// Issues tickets and accepts only the latest one, once.
#[derive(Debug, Default)]
struct Sequencer {
    issued: u64,
    applied: u64,
}

impl Sequencer {
    fn issue(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    fn accept(&mut self, ticket: FetchTicket) -> bool {
        if ticket.0 == self.issued && ticket.0 > self.applied {
            self.applied = ticket.0;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    Loading,
    NotFound,
}

/// What a post looks like to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostRender {
    Placeholder(PlaceholderKind),
    Card(Box<PostCard>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCard {
    pub post_id: i64,
    pub title: String,
    pub body: String,
    pub image: Option<String>,
    pub topic: Option<String>,
    pub author: Identity,
    pub created_at: DateTime<Utc>,
    /// `None` until the first vote snapshot arrives.
    pub tally: Option<i64>,
    pub own_vote: Option<Direction>,
    pub vote_pending: bool,
    pub comment_count: usize,
    pub permalink: String,
    pub page_title: String,
    /// Present in detail mode only.
    pub thread: Option<Thread>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    /// Creation order.
    pub comments: Vec<Comment>,
    /// False when signed out; the comment input is disabled.
    pub can_comment: bool,
    pub commenter: Option<Identity>,
}

/// Comments in creation order; equal timestamps fall back to id.
pub fn ordered_comments(post: &Post) -> Vec<Comment> {
    let mut comments = post.comments.clone();
    comments.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    comments
}

fn build_render(
    state: &PostState,
    summary: Option<&VoteSummary>,
    mode: ViewMode,
    viewer: Option<&Identity>,
    vote_pending: bool,
) -> PostRender {
    let post = match state {
        PostState::Loading => return PostRender::Placeholder(PlaceholderKind::Loading),
        PostState::Empty => return PostRender::Placeholder(PlaceholderKind::NotFound),
        PostState::Ready(post) => post,
    };

    let thread = (mode == ViewMode::Detail).then(|| Thread {
        comments: ordered_comments(post),
        can_comment: viewer.is_some(),
        commenter: viewer.cloned(),
    });

    PostRender::Card(Box::new(PostCard {
        post_id: post.id,
        title: post.title.clone(),
        body: post.body.clone(),
        image: post.image.clone(),
        topic: post.topic().map(String::from),
        author: post.author.clone(),
        created_at: post.created_at,
        tally: summary.map(|s| s.tally),
        own_vote: summary.and_then(|s| s.own_vote),
        vote_pending,
        comment_count: post.comments.len(),
        permalink: post.permalink(),
        page_title: post.page_title(),
        thread,
    }))
}

pub struct PostView {
    post_id: i64,
    mode: ViewMode,
    reader: Arc<dyn PostReader>,
    mutator: VoteMutator,
    submitter: CommentSubmitter,
    notifier: Arc<dyn NotifierPort>,
    viewer: Option<Identity>,
    state: PostState,
    /// `None` = not yet known; `Some(vec![])` = known to have no votes.
    votes: Option<Vec<Vote>>,
    summary: Option<VoteSummary>,
    post_seq: Sequencer,
    vote_seq: Sequencer,
    vote_pending: bool,
    publisher: watch::Sender<PostRender>,
}

impl PostView {
    pub fn new(
        post_id: i64,
        mode: ViewMode,
        reader: Arc<dyn PostReader>,
        mutations: Arc<dyn MutationPort>,
        notifier: Arc<dyn NotifierPort>,
        viewer: Option<Identity>,
    ) -> Self {
        let (publisher, _) = watch::channel(PostRender::Placeholder(PlaceholderKind::Loading));
        Self {
            post_id,
            mode,
            reader,
            mutator: VoteMutator::new(Arc::clone(&mutations), Arc::clone(&notifier)),
            submitter: CommentSubmitter::new(mutations, Arc::clone(&notifier)),
            notifier,
            viewer,
            state: PostState::Loading,
            votes: None,
            summary: None,
            post_seq: Sequencer::default(),
            vote_seq: Sequencer::default(),
            vote_pending: false,
            publisher,
        }
    }

    pub fn post_id(&self) -> i64 {
        self.post_id
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn state(&self) -> &PostState {
        &self.state
    }

    pub fn votes(&self) -> Option<&[Vote]> {
        self.votes.as_deref()
    }

    pub fn summary(&self) -> Option<VoteSummary> {
        self.summary
    }

    pub fn viewer(&self) -> Option<&Identity> {
        self.viewer.as_ref()
    }

    pub fn is_vote_pending(&self) -> bool {
        self.vote_pending
    }

    /// Comments of the loaded post in creation order; empty while loading.
    pub fn comments(&self) -> Vec<Comment> {
        self.state.post().map(ordered_comments).unwrap_or_default()
    }

    pub fn render(&self) -> PostRender {
        build_render(
            &self.state,
            self.summary.as_ref(),
            self.mode,
            self.viewer.as_ref(),
            self.vote_pending,
        )
    }

    /// Receive a fresh render every time a snapshot is applied.
    pub fn subscribe(&self) -> watch::Receiver<PostRender> {
        self.publisher.subscribe()
    }

    /// Switch the session identity and recompute the own-vote.
    pub fn set_viewer(&mut self, viewer: Option<Identity>) {
        self.viewer = viewer;
        self.recompute();
    }

    /// Install a post already fetched elsewhere (e.g. a feed listing),
    /// together with its nested vote snapshot.
    pub fn seed(&mut self, post: Post) {
        if post.id != self.post_id {
            warn!(post_id = self.post_id, other = post.id, "ignoring seed for another post");
            return;
        }
        let votes_ticket = self.begin_votes_fetch();
        self.apply_votes(votes_ticket, Ok(Some(post.votes.clone())));
        let ticket = self.begin_post_fetch();
        self.apply_post(ticket, Ok(Some(post)));
    }

    pub fn begin_post_fetch(&mut self) -> FetchTicket {
        self.post_seq.issue()
    }

    /// Apply a post response. Returns false when the response was stale or failed.
    pub fn apply_post(
        &mut self,
        ticket: FetchTicket,
        result: Result<Option<Post>, DomainError>,
    ) -> bool {
        if !self.post_seq.accept(ticket) {
            debug!(post_id = self.post_id, ?ticket, "dropping stale post response");
            return false;
        }
        match result {
            Ok(post) => {
                self.state = PostState::from(post);
                self.publish();
                true
            }
            Err(e) => {
                warn!(post_id = self.post_id, error = %e, "post fetch failed; keeping last state");
                self.notifier
                    .notify(NoticeKind::Error, &format!("Could not load post: {}", e));
                false
            }
        }
    }

    pub fn begin_votes_fetch(&mut self) -> FetchTicket {
        self.vote_seq.issue()
    }

    /// Apply a vote snapshot and recompute. Returns false when stale, failed
    /// or absent; an absent snapshot leaves the previous one in place.
    pub fn apply_votes(
        &mut self,
        ticket: FetchTicket,
        result: Result<Option<Vec<Vote>>, DomainError>,
    ) -> bool {
        if !self.vote_seq.accept(ticket) {
            debug!(post_id = self.post_id, ?ticket, "dropping stale vote snapshot");
            return false;
        }
        match result {
            Ok(Some(votes)) => {
                self.votes = Some(votes);
                self.recompute();
                true
            }
            Ok(None) => {
                debug!(post_id = self.post_id, "store reported no vote list; keeping last snapshot");
                false
            }
            Err(e) => {
                warn!(post_id = self.post_id, error = %e, "vote fetch failed; keeping last snapshot");
                self.notifier
                    .notify(NoticeKind::Error, &format!("Could not load votes: {}", e));
                false
            }
        }
    }

    pub async fn refresh_post(&mut self) -> bool {
        let ticket = self.begin_post_fetch();
        let result = self.reader.fetch_post(self.post_id).await;
        self.apply_post(ticket, result)
    }

    pub async fn refresh_votes(&mut self) -> bool {
        let ticket = self.begin_votes_fetch();
        let result = self.reader.fetch_votes(self.post_id).await;
        self.apply_votes(ticket, result)
    }

    pub async fn refresh(&mut self) {
        self.refresh_post().await;
        self.refresh_votes().await;
    }

    /// Request a vote in `direction` for the current viewer.
    pub async fn vote(&mut self, direction: Direction) -> Result<VoteOutcome, DomainError> {
        let current = self.summary.and_then(|s| s.own_vote);
        self.vote_pending = true;
        self.publish();

        let result = self
            .mutator
            .cast(self.post_id, self.viewer.as_ref(), direction, current)
            .await;

        self.vote_pending = false;
        if matches!(result, Ok(VoteOutcome::Submitted(_))) {
            self.refresh_votes().await;
        } else {
            self.publish();
        }
        result
    }

    /// Submit the draft as a comment on this post, then re-read the post.
    pub async fn submit_comment(&mut self, draft: &mut CommentDraft) -> Result<Comment, DomainError> {
        if self.mode != ViewMode::Detail {
            return Err(DomainError::Ui(
                "comments can only be posted from the post page".into(),
            ));
        }
        let comment = self
            .submitter
            .submit(self.post_id, self.viewer.as_ref(), draft)
            .await?;
        self.refresh_post().await;
        Ok(comment)
    }

    /// Observer hook for store change events.
    pub async fn on_change(&mut self, change: &StoreChange) {
        if change.post_id() != self.post_id {
            return;
        }
        match change {
            StoreChange::VotesChanged { .. } => {
                self.refresh_votes().await;
            }
            StoreChange::CommentsChanged { .. } => {
                self.refresh_post().await;
            }
        }
    }

    fn recompute(&mut self) {
        self.summary = self
            .votes
            .as_deref()
            .map(|votes| aggregate(votes, self.viewer.as_ref()));
        self.publish();
    }

    fn publish(&self) {
        self.publisher.send_replace(self.render());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::notify::RecordingNotifier;
    use crate::adapters::persistence::MemoryStore;
    use crate::domain::{NewComment, NewPost, NewVote};
    use crate::ports::CommunityPort;

    struct Fixture {
        store: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
        post: Post,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let sub = store.create_subreddit("rust").await.unwrap();
        let post = store
            .create_post(NewPost {
                title: "Borrowck".into(),
                body: "Why?".into(),
                image: None,
                subreddit_id: sub.id,
                author: Identity::new("op"),
            })
            .await
            .unwrap();
        Fixture {
            store,
            notifier: Arc::new(RecordingNotifier::new()),
            post,
        }
    }

    fn view(f: &Fixture, mode: ViewMode, viewer: Option<&str>) -> PostView {
        PostView::new(
            f.post.id,
            mode,
            f.store.clone(),
            f.store.clone(),
            f.notifier.clone(),
            viewer.map(Identity::new),
        )
    }

    fn vote(id: i64, post_id: i64, voter: &str, direction: Direction) -> Vote {
        Vote {
            id,
            post_id,
            voter: Identity::new(voter),
            direction,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_starts_as_loading_placeholder() {
        let f = fixture().await;
        let v = view(&f, ViewMode::Card, None);
        assert!(v.state().is_loading());
        assert_eq!(v.summary(), None);
        assert_eq!(v.render(), PostRender::Placeholder(PlaceholderKind::Loading));
    }

    #[tokio::test]
    async fn test_missing_post_is_not_found() {
        let f = fixture().await;
        let mut v = PostView::new(
            4242,
            ViewMode::Detail,
            f.store.clone(),
            f.store.clone(),
            f.notifier.clone(),
            None,
        );
        v.refresh().await;
        assert_eq!(v.state(), &PostState::Empty);
        assert_eq!(v.render(), PostRender::Placeholder(PlaceholderKind::NotFound));
        // Known-empty vote snapshot, distinct from "not yet known".
        assert_eq!(v.votes(), Some(&[][..]));
        assert_eq!(v.summary().map(|s| s.tally), Some(0));
    }

    #[tokio::test]
    async fn test_newer_snapshot_wins_out_of_order() {
        let f = fixture().await;
        let mut v = view(&f, ViewMode::Card, Some("alice"));
        let pid = f.post.id;

        let older = v.begin_votes_fetch();
        let newer = v.begin_votes_fetch();

        assert!(v.apply_votes(newer, Ok(Some(vec![vote(2, pid, "alice", Direction::Down)]))));
        assert!(!v.apply_votes(older, Ok(Some(vec![vote(1, pid, "alice", Direction::Up)]))));

        let summary = v.summary().unwrap();
        assert_eq!(summary.tally, -1);
        assert_eq!(summary.own_vote, Some(Direction::Down));
    }

    #[tokio::test]
    async fn test_stale_response_dropped_even_if_first() {
        let f = fixture().await;
        let mut v = view(&f, ViewMode::Card, None);
        let pid = f.post.id;

        let older = v.begin_votes_fetch();
        let newer = v.begin_votes_fetch();
        assert!(!v.apply_votes(older, Ok(Some(vec![vote(1, pid, "a", Direction::Up)]))));
        assert_eq!(v.summary(), None);
        assert!(v.apply_votes(newer, Ok(Some(vec![]))));
        // Applying the same ticket twice is refused.
        assert!(!v.apply_votes(newer, Ok(Some(vec![vote(1, pid, "a", Direction::Up)]))));
        assert_eq!(v.summary().map(|s| s.tally), Some(0));
    }

    #[tokio::test]
    async fn test_absent_vote_list_stays_unknown() {
        let f = fixture().await;
        let mut v = view(&f, ViewMode::Card, Some("alice"));
        let pid = f.post.id;

        let first = v.begin_votes_fetch();
        assert!(!v.apply_votes(first, Ok(None)));
        assert_eq!(v.votes(), None);
        assert_eq!(v.summary(), None);

        let known = v.begin_votes_fetch();
        assert!(v.apply_votes(known, Ok(Some(vec![vote(1, pid, "bob", Direction::Up)]))));
        let absent = v.begin_votes_fetch();
        assert!(!v.apply_votes(absent, Ok(None)));
        assert_eq!(v.summary().map(|s| s.tally), Some(1));
        assert!(f.notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn test_seed_applies_nested_votes() {
        let f = fixture().await;
        let mut post = f.post.clone();
        post.votes = vec![
            vote(1, post.id, "alice", Direction::Down),
            vote(2, post.id, "bob", Direction::Down),
        ];
        let mut v = view(&f, ViewMode::Card, Some("alice"));
        v.seed(post);

        assert!(matches!(v.state(), PostState::Ready(_)));
        let summary = v.summary().unwrap();
        assert_eq!(summary.tally, -2);
        assert_eq!(summary.own_vote, Some(Direction::Down));
        match v.render() {
            PostRender::Card(card) => assert_eq!(card.tally, Some(-2)),
            other => panic!("expected a card, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_last_state() {
        let f = fixture().await;
        let mut v = view(&f, ViewMode::Card, None);
        v.refresh().await;
        let before = v.render();

        f.store.set_fail_reads(true);
        assert!(!v.refresh_votes().await);
        assert!(!v.refresh_post().await);
        assert_eq!(v.render(), before);
        assert_eq!(f.notifier.count(NoticeKind::Error), 2);
    }

    #[tokio::test]
    async fn test_vote_refetches_after_response() {
        let f = fixture().await;
        let mut v = view(&f, ViewMode::Card, Some("alice"));
        v.refresh().await;
        assert_eq!(v.summary().map(|s| s.tally), Some(0));

        let outcome = v.vote(Direction::Up).await.unwrap();
        assert!(outcome.is_submitted());
        assert!(!v.is_vote_pending());
        assert_eq!(v.summary().unwrap().tally, 1);
        assert_eq!(v.summary().unwrap().own_vote, Some(Direction::Up));

        // Same direction again: no write.
        let writes = f.store.write_count();
        assert_eq!(v.vote(Direction::Up).await.unwrap(), VoteOutcome::NoOp);
        assert_eq!(f.store.write_count(), writes);
    }

    #[tokio::test]
    async fn test_subscribers_see_recomputed_render() {
        let f = fixture().await;
        let mut v = view(&f, ViewMode::Card, Some("alice"));
        let rx = v.subscribe();
        v.refresh().await;
        v.vote(Direction::Down).await.unwrap();

        match &*rx.borrow() {
            PostRender::Card(card) => {
                assert_eq!(card.tally, Some(-1));
                assert_eq!(card.own_vote, Some(Direction::Down));
                assert!(!card.vote_pending);
                assert!(card.thread.is_none());
            }
            other => panic!("expected card, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_viewer_switch_recomputes_own_vote() {
        let f = fixture().await;
        f.store
            .submit_vote(NewVote {
                post_id: f.post.id,
                voter: Identity::new("bob"),
                direction: Direction::Down,
            })
            .await
            .unwrap();
        let mut v = view(&f, ViewMode::Card, Some("alice"));
        v.refresh().await;
        assert_eq!(v.summary().unwrap().own_vote, None);

        v.set_viewer(Some(Identity::new("bob")));
        assert_eq!(v.summary().unwrap().own_vote, Some(Direction::Down));
    }

    #[tokio::test]
    async fn test_detail_thread_in_creation_order() {
        let f = fixture().await;
        for text in ["first", "second", "third"] {
            f.store
                .submit_comment(NewComment {
                    post_id: f.post.id,
                    author: Identity::new("bob"),
                    text: text.into(),
                })
                .await
                .unwrap();
        }
        let mut v = view(&f, ViewMode::Detail, None);
        v.refresh().await;

        let PostRender::Card(card) = v.render() else {
            panic!("expected card");
        };
        let thread = card.thread.clone().expect("detail mode has a thread");
        let texts: Vec<&str> = thread.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert!(!thread.can_comment);
        assert_eq!(card.comment_count, 3);
        assert_eq!(card.permalink, format!("/r/rust/post/{}", f.post.id));
        assert_eq!(card.page_title, "Borrowck | r/rust");
    }

    #[tokio::test]
    async fn test_comment_only_in_detail_mode() {
        let f = fixture().await;
        let mut v = view(&f, ViewMode::Card, Some("alice"));
        let mut draft = CommentDraft::new("hi");
        let err = v.submit_comment(&mut draft).await.unwrap_err();
        assert!(matches!(err, DomainError::Ui(_)));
        assert_eq!(f.store.write_count(), 0);
        assert_eq!(draft.text(), "hi");
    }

    #[tokio::test]
    async fn test_on_change_ignores_other_posts() {
        let f = fixture().await;
        let mut v = view(&f, ViewMode::Card, None);
        v.on_change(&StoreChange::VotesChanged {
            post_id: f.post.id + 100,
        })
        .await;
        assert_eq!(v.summary(), None);

        v.on_change(&StoreChange::VotesChanged { post_id: f.post.id })
            .await;
        assert!(v.summary().is_some());
    }

    #[tokio::test]
    async fn test_seed_rejects_other_post() {
        let f = fixture().await;
        let mut v = view(&f, ViewMode::Card, None);
        let mut other = f.post.clone();
        other.id += 1;
        v.seed(other);
        assert!(v.state().is_loading());

        v.seed(f.post.clone());
        assert!(matches!(v.state(), PostState::Ready(_)));
    }
}

//! Implements InputPort. Inquire-based interactive prompts.
//!
//! Home menu -> feed (all posts or one community) -> post page with voting
//! and the comment form. Store change events are drained before every redraw.

use crate::adapters::session::LocalSession;
use crate::adapters::ui::render::{feed_label, render_lines};
use crate::domain::{Direction, DomainError, NoticeKind, PostState};
use crate::ports::{ChangeFeed, InputPort, MutationPort, NotifierPort, PostReader, SessionPort};
use crate::usecases::{CommentDraft, FeedService, PostView, ViewMode};
use async_trait::async_trait;
use chrono::Utc;
use inquire::ui::{Color, RenderConfig, StyleSheet, Styled};
use inquire::{InquireError, Select, Text};
use std::sync::Arc;
use tokio::sync::broadcast::{Receiver, error::TryRecvError};
use tracing::{debug, info};

const HOME_FEED: &str = "Home feed";
const BROWSE_COMMUNITY: &str = "Browse a community";
const TOP_COMMUNITIES: &str = "Top communities";
const SIGN_IN: &str = "Sign in";
const SIGN_OUT: &str = "Sign out";
const QUIT: &str = "Quit";

const UPVOTE: &str = "▲ Upvote";
const DOWNVOTE: &str = "▼ Downvote";
const COMMENT: &str = "Comment";
const REFRESH: &str = "Refresh";
const BACK: &str = "Back";

/// Theme for every inquire prompt. Call once before the first prompt.
pub fn apply_theme() {
    let config = RenderConfig::default()
        .with_prompt_prefix(Styled::new("▲").with_fg(Color::LightRed))
        .with_highlighted_option_prefix(Styled::new("›").with_fg(Color::LightRed))
        .with_help_message(StyleSheet::new().with_fg(Color::DarkGrey));
    inquire::set_global_render_config(config);
}

/// Cancelled prompts (Esc / Ctrl-C) become `None`.
fn ask<T>(answer: Result<T, InquireError>) -> Result<Option<T>, DomainError> {
    match answer {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(DomainError::Ui(e.to_string())),
    }
}

/// TUI adapter. Inquire prompts.
pub struct TuiInputPort {
    reader: Arc<dyn PostReader>,
    mutations: Arc<dyn MutationPort>,
    changes: Arc<dyn ChangeFeed>,
    notifier: Arc<dyn NotifierPort>,
    session: Arc<LocalSession>,
    feed: FeedService,
    top_communities: usize,
}

impl TuiInputPort {
    pub fn new(
        reader: Arc<dyn PostReader>,
        mutations: Arc<dyn MutationPort>,
        changes: Arc<dyn ChangeFeed>,
        notifier: Arc<dyn NotifierPort>,
        session: Arc<LocalSession>,
        top_communities: usize,
    ) -> Self {
        Self {
            feed: FeedService::new(Arc::clone(&reader)),
            reader,
            mutations,
            changes,
            notifier,
            session,
            top_communities,
        }
    }

    fn view(&self, post_id: i64, mode: ViewMode) -> PostView {
        PostView::new(
            post_id,
            mode,
            Arc::clone(&self.reader),
            Arc::clone(&self.mutations),
            Arc::clone(&self.notifier),
            self.session.current_identity(),
        )
    }

    fn home_prompt(&self) -> String {
        match self.session.current_identity() {
            Some(identity) => format!("Signed in as u/{}", identity),
            None => "Browsing signed out".to_string(),
        }
    }

    async fn browse_feed(&self, topic: Option<&str>) -> Result<(), DomainError> {
        loop {
            let posts = match self.feed.feed(topic).await {
                Ok(posts) => posts,
                Err(e) if e.is_recoverable() => {
                    self.notifier
                        .notify(NoticeKind::Error, &format!("Could not load the feed: {}", e));
                    return Ok(());
                }
                Err(e) => return Err(e),
            };
            if posts.is_empty() {
                println!("No posts yet.");
                return Ok(());
            }

            let mut ids = Vec::with_capacity(posts.len());
            let mut labels = Vec::with_capacity(posts.len());
            for post in posts {
                let mut card = self.view(post.id, ViewMode::Card);
                card.seed(post);
                ids.push(card.post_id());
                labels.push(feed_label(&card.render()));
            }

            let title = match topic {
                Some(topic) => format!("r/{}", topic),
                None => HOME_FEED.to_string(),
            };
            let Some(choice) = ask(Select::new(&title, labels).with_page_size(12).raw_prompt())?
            else {
                return Ok(());
            };
            self.post_page(ids[choice.index]).await?;
        }
    }

    async fn post_page(&self, post_id: i64) -> Result<(), DomainError> {
        let mut changes = self.changes.subscribe();
        let mut view = self.view(post_id, ViewMode::Detail);
        view.refresh().await;
        let mut draft = CommentDraft::default();

        loop {
            drain_changes(&mut changes, &mut view).await;

            let render = view.render();
            println!();
            for line in render_lines(&render, Utc::now()) {
                println!("{}", line);
            }
            println!();

            let mut actions = Vec::new();
            if let PostState::Ready(post) = view.state() {
                debug!(permalink = %post.permalink(), "showing post");
                actions.extend([UPVOTE, DOWNVOTE]);
                if view.viewer().is_some() {
                    actions.push(COMMENT);
                }
            }
            actions.extend([REFRESH, BACK]);

            let Some(action) = ask(Select::new("Post", actions).prompt())? else {
                return Ok(());
            };
            match action {
                UPVOTE | DOWNVOTE => {
                    let direction = if action == UPVOTE {
                        Direction::Up
                    } else {
                        Direction::Down
                    };
                    // Failures were already surfaced as notices.
                    if let Err(e) = view.vote(direction).await {
                        debug!(post_id, error = %e, "vote not applied");
                    }
                }
                COMMENT => {
                    let answer = Text::new("Comment:")
                        .with_initial_value(draft.text())
                        .prompt();
                    let Some(text) = ask(answer)? else {
                        continue;
                    };
                    draft.set_text(text);
                    if draft.text().trim().is_empty() {
                        println!("Nothing to post.");
                        continue;
                    }
                    if let Err(e) = view.submit_comment(&mut draft).await {
                        debug!(post_id, error = %e, "comment not posted; draft kept");
                    }
                }
                REFRESH => view.refresh().await,
                _ => return Ok(()),
            }
        }
    }

    async fn browse_community(&self) -> Result<(), DomainError> {
        let Some(topic) = ask(Text::new("Community (without r/):").prompt())? else {
            return Ok(());
        };
        let topic = topic.trim().trim_start_matches("r/").to_string();
        match self.feed.subreddit(&topic).await? {
            Some(subreddit) => self.browse_feed(Some(&subreddit.topic)).await,
            None => {
                println!("r/{} does not exist.", topic);
                Ok(())
            }
        }
    }

    async fn top_communities(&self) -> Result<(), DomainError> {
        let subreddits = self.feed.top_subreddits(self.top_communities).await?;
        if subreddits.is_empty() {
            println!("No communities yet.");
            return Ok(());
        }
        let labels: Vec<String> = subreddits
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. r/{}", i + 1, s.topic))
            .collect();
        let Some(choice) = ask(Select::new(TOP_COMMUNITIES, labels).raw_prompt())? else {
            return Ok(());
        };
        self.browse_feed(Some(&subreddits[choice.index].topic)).await
    }

    fn sign_in(&self) -> Result<(), DomainError> {
        if let Some(name) = ask(Text::new("Username:").prompt())? {
            self.session.sign_in(&name);
        }
        Ok(())
    }
}

/// Apply every queued store change to the view. A lagged receiver re-reads
/// everything.
async fn drain_changes(changes: &mut Receiver<crate::domain::StoreChange>, view: &mut PostView) {
    loop {
        match changes.try_recv() {
            Ok(change) => view.on_change(&change).await,
            Err(TryRecvError::Lagged(skipped)) => {
                debug!(skipped, "change feed lagged; refreshing");
                view.refresh().await;
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        loop {
            let signed_in = self.session.current_identity().is_some();
            let options = vec![
                HOME_FEED,
                BROWSE_COMMUNITY,
                TOP_COMMUNITIES,
                if signed_in { SIGN_OUT } else { SIGN_IN },
                QUIT,
            ];
            let Some(choice) = ask(Select::new(&self.home_prompt(), options).prompt())? else {
                break;
            };
            match choice {
                HOME_FEED => self.browse_feed(None).await?,
                BROWSE_COMMUNITY => self.browse_community().await?,
                TOP_COMMUNITIES => self.top_communities().await?,
                SIGN_IN => self.sign_in()?,
                SIGN_OUT => self.session.sign_out(),
                _ => break,
            }
        }
        info!("bye");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_maps_cancel_to_none() {
        let cancelled: Result<String, InquireError> = Err(InquireError::OperationCanceled);
        assert_eq!(ask(cancelled).unwrap(), None);
        let ok: Result<u8, InquireError> = Ok(3);
        assert_eq!(ask(ok).unwrap(), Some(3));
        let broken: Result<u8, InquireError> = Err(InquireError::NotTTY);
        assert!(matches!(ask(broken), Err(DomainError::Ui(_))));
    }
}

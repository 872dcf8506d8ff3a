//! Turns a post render model into terminal lines.
//!
//! Layout mirrors the web card: vote column, community header, title/body,
//! footer with the comment count, and in detail mode the comment thread.

use crate::domain::Direction;
use crate::usecases::{PlaceholderKind, PostCard, PostRender};
use chrono::{DateTime, Utc};
use crossterm::style::Stylize;

/// Relative age such as "5 minutes ago".
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    if secs < 45 {
        return "just now".to_string();
    }
    let (value, unit) = match secs {
        s if s < 3_600 => ((s + 30) / 60, "minute"),
        s if s < 86_400 => (s / 3_600, "hour"),
        s if s < 2_592_000 => (s / 86_400, "day"),
        s if s < 31_536_000 => (s / 2_592_000, "month"),
        s => (s / 31_536_000, "year"),
    };
    let value = value.max(1);
    if value == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", value, unit)
    }
}

fn vote_column(card: &PostCard) -> String {
    let up = if card.own_vote == Some(Direction::Up) {
        "▲".red().bold().to_string()
    } else {
        "▲".dark_grey().to_string()
    };
    let down = if card.own_vote == Some(Direction::Down) {
        "▼".blue().bold().to_string()
    } else {
        "▼".dark_grey().to_string()
    };
    let tally = card
        .tally
        .map(|t| t.to_string())
        .unwrap_or_else(|| "·".to_string());
    let pending = if card.vote_pending { " …" } else { "" };
    format!("{} {} {}{}", up, tally.bold(), down, pending)
}

/// Lines for one post. `now` is injected so output is deterministic in tests.
pub fn render_lines(render: &PostRender, now: DateTime<Utc>) -> Vec<String> {
    let card = match render {
        PostRender::Placeholder(PlaceholderKind::Loading) => {
            return vec!["Loading…".dark_yellow().to_string()];
        }
        PostRender::Placeholder(PlaceholderKind::NotFound) => {
            return vec!["This post could not be found.".dark_grey().to_string()];
        }
        PostRender::Card(card) => card,
    };

    let topic = card.topic.as_deref().unwrap_or("unknown");
    let mut lines = vec![
        format!(
            "{}  r/{} · Post by u/{} {}",
            vote_column(card),
            topic,
            card.author,
            time_ago(card.created_at, now)
        ),
        format!("    {}", card.title.as_str().bold()),
    ];
    if !card.body.is_empty() {
        lines.push(format!("    {}", card.body));
    }
    if let Some(image) = &card.image {
        lines.push(format!("    [image] {}", image));
    }
    lines.push(format!("    {} Comments", card.comment_count));

    if let Some(thread) = &card.thread {
        lines.push(String::new());
        match &thread.commenter {
            Some(name) => lines.push(format!("    Comment as {}", name.as_str().red())),
            None => lines.push("    Please sign in to comment".dark_grey().to_string()),
        }
        for comment in &thread.comments {
            lines.push(format!(
                "      {} · {}",
                comment.author.as_str().bold(),
                time_ago(comment.created_at, now)
            ));
            lines.push(format!("        {}", comment.text));
        }
    }
    lines
}

/// One-line summary used in feed menus.
pub fn feed_label(render: &PostRender) -> String {
    match render {
        PostRender::Placeholder(PlaceholderKind::Loading) => "Loading…".to_string(),
        PostRender::Placeholder(PlaceholderKind::NotFound) => "(missing post)".to_string(),
        PostRender::Card(card) => {
            let tally = card
                .tally
                .map(|t| format!("{:>4}", t))
                .unwrap_or_else(|| "   ·".to_string());
            format!(
                "{} | r/{} | {} ({} comments)",
                tally,
                card.topic.as_deref().unwrap_or("unknown"),
                card.title,
                card.comment_count
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Comment, Identity};
    use crate::usecases::Thread;
    use chrono::Duration;

    fn card(thread: Option<Thread>) -> PostRender {
        let now = Utc::now();
        PostRender::Card(Box::new(PostCard {
            post_id: 1,
            title: "Hello".into(),
            body: "World".into(),
            image: None,
            topic: Some("rust".into()),
            author: Identity::new("op"),
            created_at: now - Duration::hours(2),
            tally: Some(-1),
            own_vote: Some(Direction::Down),
            vote_pending: false,
            comment_count: thread.as_ref().map(|t| t.comments.len()).unwrap_or(0),
            permalink: "/r/rust/post/1".into(),
            page_title: "Hello | r/rust".into(),
            thread,
        }))
    }

    #[test]
    fn test_time_ago_buckets() {
        let now = Utc::now();
        assert_eq!(time_ago(now, now), "just now");
        assert_eq!(time_ago(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(time_ago(now - Duration::minutes(5), now), "5 minutes ago");
        assert_eq!(time_ago(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(time_ago(now - Duration::days(2), now), "2 days ago");
        assert_eq!(time_ago(now - Duration::days(800), now), "2 years ago");
    }

    #[test]
    fn test_placeholders() {
        let now = Utc::now();
        let loading = render_lines(&PostRender::Placeholder(PlaceholderKind::Loading), now);
        assert_eq!(loading.len(), 1);
        assert!(loading[0].contains("Loading"));
        let missing = render_lines(&PostRender::Placeholder(PlaceholderKind::NotFound), now);
        assert!(missing[0].contains("could not be found"));
    }

    #[test]
    fn test_card_lines() {
        let lines = render_lines(&card(None), Utc::now());
        assert!(lines[0].contains("r/rust · Post by u/op 2 hours ago"));
        assert!(lines.iter().any(|l| l.contains("0 Comments")));
        assert!(!lines.iter().any(|l| l.contains("Comment as")));
    }

    #[test]
    fn test_detail_thread_lines() {
        let now = Utc::now();
        let thread = Thread {
            comments: vec![Comment {
                id: 9,
                post_id: 1,
                author: Identity::new("bob"),
                text: "nice post".into(),
                created_at: now,
            }],
            can_comment: false,
            commenter: None,
        };
        let lines = render_lines(&card(Some(thread)), now);
        assert!(lines.iter().any(|l| l.contains("Please sign in to comment")));
        assert!(lines.iter().any(|l| l.contains("nice post")));
    }

    #[test]
    fn test_feed_label() {
        let label = feed_label(&card(None));
        assert!(label.contains("r/rust"));
        assert!(label.contains("Hello (0 comments)"));
        assert!(label.trim_start().starts_with("-1"));
    }
}

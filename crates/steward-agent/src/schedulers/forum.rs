// SPDX-License-Identifier: MIT OR Apache-2.0
//! The forum scheduler: one `draft_forum_reply` per feed post with an id.
//!
//! Feed items arrive raw from the adapter and name their fields loosely;
//! the id may be `id` or `post_id`, the text `content`, `body`, or `text`.

use super::MAX_INTENTS_PER_TICK;
use steward_core::{Domain, Intent};

/// Cap on post content carried in an intent payload.
const MAX_CONTENT_CHARS: usize = 2000;

/// Proposes `draft_forum_reply` intents over the forum feed.
pub struct ForumScheduler<'a> {
    posts: &'a [serde_json::Value],
}

impl<'a> ForumScheduler<'a> {
    /// A scheduler over the tick's feed state.
    pub fn new(posts: &'a [serde_json::Value]) -> Self {
        Self { posts }
    }

    /// Propose candidate intents for this tick.
    pub fn propose(&self) -> Vec<Intent> {
        let mut intents = Vec::new();
        for post in self.posts.iter().take(MAX_INTENTS_PER_TICK) {
            let post_id = first_str(post, &["id", "post_id"]);
            if post_id.is_empty() {
                continue;
            }
            let title = first_str(post, &["title"]);
            let content: String = first_str(post, &["content", "body", "text"])
                .chars()
                .take(MAX_CONTENT_CHARS)
                .collect();

            intents.push(
                Intent::new(Domain::Forum, "draft_forum_reply")
                    .with_scores(0.4, 0.3, 120)
                    .with_payload("post_id", post_id)
                    .with_payload("title", title)
                    .with_payload("content", content)
                    .with_preconditions(vec!["has_forum_feed".to_string()]),
            );
        }
        intents
    }
}

/// First non-empty string among the named fields, stringifying numbers.
fn first_str(value: &serde_json::Value, keys: &[&str]) -> String {
    for key in keys {
        match &value[*key] {
            serde_json::Value::String(s) if !s.is_empty() => return s.clone(),
            serde_json::Value::Number(n) => return n.to_string(),
            _ => {}
        }
    }
    String::new()
}

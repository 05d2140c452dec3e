// SPDX-License-Identifier: MIT OR Apache-2.0
//! Input state bundles.
//!
//! Produced by out-of-scope reader adapters; everything in here is untrusted
//! until it passes the sanitizer. A reader failure yields an empty bundle
//! and the tick continues.

use serde::{Deserialize, Serialize};

/// One inbox thread, as normalized by the mail reader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadSummary {
    /// Thread identifier.
    pub thread_id: String,
    /// Latest message identifier.
    #[serde(default)]
    pub message_id: String,
    /// Raw `From:` header of the latest message.
    #[serde(default)]
    pub from: String,
    /// Subject line.
    #[serde(default)]
    pub subject: String,
    /// Short body excerpt.
    #[serde(default)]
    pub snippet: String,
    /// Whether the thread has unread messages.
    #[serde(default)]
    pub unread: bool,
    /// Whether the thread is flagged important.
    #[serde(default)]
    pub important: bool,
}

/// One upcoming calendar event, as normalized by the calendar reader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    /// Event identifier.
    pub event_id: String,
    /// Event title.
    #[serde(default)]
    pub title: String,
    /// Human-readable time description.
    #[serde(default)]
    pub when: String,
    /// Event description.
    #[serde(default)]
    pub description: String,
}

/// Everything the schedulers see on one tick.
#[derive(Debug, Clone, Default)]
pub struct TickInputs {
    /// Inbox threads.
    pub threads: Vec<ThreadSummary>,
    /// Upcoming events.
    pub events: Vec<EventSummary>,
    /// Configured repository paths.
    pub repos: Vec<String>,
    /// Forum feed items, raw as the feed returned them.
    pub posts: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_summary_tolerates_sparse_json() {
        let t: ThreadSummary =
            serde_json::from_value(serde_json::json!({"thread_id": "t1"})).unwrap();
        assert_eq!(t.thread_id, "t1");
        assert!(!t.unread);
        assert!(t.subject.is_empty());
    }

    #[test]
    fn default_inputs_are_empty() {
        let inputs = TickInputs::default();
        assert!(inputs.threads.is_empty());
        assert!(inputs.events.is_empty());
        assert!(inputs.repos.is_empty());
        assert!(inputs.posts.is_empty());
    }
}

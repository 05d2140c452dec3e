// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed action specs: the minimal description of one external side effect.
//!
//! The queue file stores specs as plain JSON maps; the typed forms here are
//! reconstructed at the controller/executor/approval boundaries. The stored
//! map is always exactly the serialized typed spec, so the `spec_hash`
//! invariant (hash of the canonical form of the embedded spec) holds by
//! construction.

use crate::{QueueError, QueueItem};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use steward_core::fingerprint;

/// Everything needed to re-send one email deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SendEmailSpec {
    /// Queue id this spec belongs to.
    pub qid: String,
    /// Source inbox thread.
    #[serde(default)]
    pub thread_id: String,
    /// Recipient address. May be empty when header parsing failed; policy
    /// and executor both reject empty recipients.
    #[serde(default)]
    pub to: String,
    /// Subject line.
    #[serde(default)]
    pub subject: String,
    /// Path of the markdown body draft.
    #[serde(default)]
    pub body_md_path: String,
    /// Message id being replied to, if any.
    #[serde(default)]
    pub reply_to_message_id: Option<String>,
}

/// Everything needed to insert one calendar event deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CreateEventSpec {
    /// Queue id this spec belongs to.
    pub qid: String,
    /// Target calendar.
    #[serde(default)]
    pub calendar_id: String,
    /// Event title.
    #[serde(default)]
    pub title: String,
    /// Start instant, ISO-8601.
    #[serde(default)]
    pub start_iso: String,
    /// End instant, ISO-8601.
    #[serde(default)]
    pub end_iso: String,
    /// Path of the markdown description draft.
    #[serde(default)]
    pub description_md_path: String,
    /// Attendee addresses; must be empty for auto-approval.
    #[serde(default)]
    pub attendees: Vec<String>,
}

/// Everything needed to publish one forum post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CreatePostSpec {
    /// Queue id this spec belongs to.
    pub qid: String,
    /// Post title.
    #[serde(default)]
    pub title: String,
    /// Path of the markdown body draft.
    #[serde(default)]
    pub body_md_path: String,
}

/// Everything needed to publish one forum reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReplyPostSpec {
    /// Queue id this spec belongs to.
    pub qid: String,
    /// The post being replied to.
    #[serde(default)]
    pub post_id: String,
    /// Path of the markdown body draft.
    #[serde(default)]
    pub body_md_path: String,
}

/// The closed set of side-effectful actions a queue item may describe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Send an email.
    SendEmail,
    /// Insert a calendar event.
    CreateEvent,
    /// Publish a forum post.
    CreatePost,
    /// Publish a forum reply.
    ReplyPost,
}

impl ActionKind {
    /// The token type an approval for this action must carry.
    pub fn token_type(&self) -> &'static str {
        match self {
            ActionKind::SendEmail => "send_email",
            ActionKind::CreateEvent => "create_event",
            ActionKind::CreatePost => "forum_post",
            ActionKind::ReplyPost => "forum_reply",
        }
    }

    /// The lowercase wire tag of this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::SendEmail => "send_email",
            ActionKind::CreateEvent => "create_event",
            ActionKind::CreatePost => "create_post",
            ActionKind::ReplyPost => "reply_post",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed spec together with its action kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ActionSpec {
    /// A send-email spec.
    SendEmail(SendEmailSpec),
    /// A create-event spec.
    CreateEvent(CreateEventSpec),
    /// A create-post spec.
    CreatePost(CreatePostSpec),
    /// A reply-post spec.
    ReplyPost(ReplyPostSpec),
}

impl ActionSpec {
    /// The action kind of this spec.
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionSpec::SendEmail(_) => ActionKind::SendEmail,
            ActionSpec::CreateEvent(_) => ActionKind::CreateEvent,
            ActionSpec::CreatePost(_) => ActionKind::CreatePost,
            ActionSpec::ReplyPost(_) => ActionKind::ReplyPost,
        }
    }

    /// The queue id carried inside the spec.
    pub fn qid(&self) -> &str {
        match self {
            ActionSpec::SendEmail(s) => &s.qid,
            ActionSpec::CreateEvent(s) => &s.qid,
            ActionSpec::CreatePost(s) => &s.qid,
            ActionSpec::ReplyPost(s) => &s.qid,
        }
    }

    /// Reconstruct the typed spec from a queue item's embedded map.
    ///
    /// # Errors
    ///
    /// [`QueueError::SpecInvalid`] when the map is missing required fields
    /// for the item's action.
    pub fn from_item(item: &QueueItem) -> Result<Self, QueueError> {
        let invalid = |e: serde_json::Error| QueueError::SpecInvalid {
            qid: item.qid.clone(),
            detail: e.to_string(),
        };
        let spec = item.spec.clone();
        Ok(match item.action {
            ActionKind::SendEmail => {
                ActionSpec::SendEmail(serde_json::from_value(spec).map_err(invalid)?)
            }
            ActionKind::CreateEvent => {
                ActionSpec::CreateEvent(serde_json::from_value(spec).map_err(invalid)?)
            }
            ActionKind::CreatePost => {
                ActionSpec::CreatePost(serde_json::from_value(spec).map_err(invalid)?)
            }
            ActionKind::ReplyPost => {
                ActionSpec::ReplyPost(serde_json::from_value(spec).map_err(invalid)?)
            }
        })
    }

    /// The wire form stored inside a queue item.
    pub fn to_value(&self) -> Result<serde_json::Value, QueueError> {
        Ok(serde_json::to_value(self).map_err(steward_core::ContractError::from)?)
    }

    /// The SHA-256 fingerprint of this spec's canonical JSON form.
    pub fn hash(&self) -> Result<String, QueueError> {
        Ok(fingerprint(self)?)
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Queue items and their status state machine.

use crate::{ActionKind, ActionSpec, QueueError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a queue item.
///
/// `pending` is the only non-terminal status. Transitions:
/// `pending → done | rejected | error` (terminal, no resurrection); a manual
/// spec edit keeps `pending` while resetting the token fields.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    /// Awaiting approval and execution.
    Pending,
    /// Executed successfully.
    Done,
    /// Refused by the executor (bad or expired token, bind mismatch).
    Rejected,
    /// The external writer failed.
    Error,
}

impl QueueStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, QueueStatus::Pending)
    }

    /// The lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::Done => "done",
            QueueStatus::Rejected => "rejected",
            QueueStatus::Error => "error",
        }
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who attached the current approval token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApprovedBy {
    /// The auto-approval engine.
    Auto,
    /// A human through the control surface.
    Manual,
}

/// One row in a per-domain approval queue file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QueueItem {
    /// Unique id within the queue file.
    pub qid: String,

    /// What executing this item does.
    pub action: ActionKind,

    /// The embedded spec in wire form (exactly the serialized typed spec).
    pub spec: serde_json::Value,

    /// SHA-256 fingerprint of the canonical form of `spec`.
    #[serde(default)]
    pub spec_hash: Option<String>,

    /// Approval token, when one has been attached.
    #[serde(default)]
    pub approval_token: Option<String>,

    /// Provenance of the token.
    #[serde(default)]
    pub approved_by: Option<ApprovedBy>,

    /// When the token was attached, ISO-8601 UTC.
    #[serde(default)]
    pub approved_at: Option<String>,

    /// Lifecycle status.
    pub status: QueueStatus,

    /// Reason for a terminal status, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl QueueItem {
    /// Build a fresh pending item from a typed spec, with the fingerprint
    /// computed and no token attached.
    pub fn pending(spec: &ActionSpec) -> Result<Self, QueueError> {
        Ok(Self {
            qid: spec.qid().to_string(),
            action: spec.kind(),
            spec: spec.to_value()?,
            spec_hash: Some(spec.hash()?),
            approval_token: None,
            approved_by: None,
            approved_at: None,
            status: QueueStatus::Pending,
            reason: None,
        })
    }

    /// Whether the executor may consider this item at all.
    pub fn is_pending(&self) -> bool {
        self.status == QueueStatus::Pending
    }

    /// Move to a terminal status with a reason, clearing nothing else.
    pub fn finish(&mut self, status: QueueStatus, reason: Option<String>) {
        debug_assert!(status.is_terminal());
        self.status = status;
        self.reason = reason;
    }

    /// Clear the three token fields (used when a spec is edited).
    pub fn clear_approval(&mut self) {
        self.approval_token = None;
        self.approved_by = None;
        self.approved_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SendEmailSpec;

    fn spec() -> ActionSpec {
        ActionSpec::SendEmail(SendEmailSpec {
            qid: "send_t1".to_string(),
            thread_id: "t1".to_string(),
            to: "me@example.com".to_string(),
            subject: "Hi".to_string(),
            body_md_path: "b.md".to_string(),
            reply_to_message_id: None,
        })
    }

    #[test]
    fn pending_item_has_hash_and_no_token() {
        let item = QueueItem::pending(&spec()).unwrap();
        assert_eq!(item.status, QueueStatus::Pending);
        assert_eq!(item.qid, "send_t1");
        assert!(item.approval_token.is_none());
        assert!(item.approved_by.is_none());
        assert_eq!(item.spec_hash.as_deref(), Some(spec().hash().unwrap().as_str()));
    }

    #[test]
    fn embedded_spec_fingerprint_matches_stored_hash() {
        let item = QueueItem::pending(&spec()).unwrap();
        let recomputed = ActionSpec::from_item(&item).unwrap().hash().unwrap();
        assert_eq!(item.spec_hash.as_deref(), Some(recomputed.as_str()));
    }

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!QueueStatus::Pending.is_terminal());
        for s in [QueueStatus::Done, QueueStatus::Rejected, QueueStatus::Error] {
            assert!(s.is_terminal());
        }
    }

    #[test]
    fn reason_is_omitted_from_wire_until_set() {
        let item = QueueItem::pending(&spec()).unwrap();
        let wire = serde_json::to_value(&item).unwrap();
        assert!(!wire.as_object().unwrap().contains_key("reason"));
        assert!(wire["approval_token"].is_null());

        let mut item = item;
        item.finish(QueueStatus::Rejected, Some("token_bind_mismatch".to_string()));
        let wire = serde_json::to_value(&item).unwrap();
        assert_eq!(wire["reason"], "token_bind_mismatch");
        assert_eq!(wire["status"], "rejected");
    }

    #[test]
    fn clear_approval_resets_all_three_fields() {
        let mut item = QueueItem::pending(&spec()).unwrap();
        item.approval_token = Some("tok".to_string());
        item.approved_by = Some(ApprovedBy::Auto);
        item.approved_at = Some("2026-01-01T00:00:00Z".to_string());

        item.clear_approval();
        assert!(item.approval_token.is_none());
        assert!(item.approved_by.is_none());
        assert!(item.approved_at.is_none());
        assert_eq!(item.status, QueueStatus::Pending);
    }

    #[test]
    fn items_tolerate_minimal_wire_form() {
        // Hand-written queue entries may omit every optional field.
        let raw = serde_json::json!({
            "qid": "send_1",
            "action": "send_email",
            "spec": {"qid": "send_1", "to": "me@example.com"},
            "status": "pending"
        });
        let item: QueueItem = serde_json::from_value(raw).unwrap();
        assert!(item.spec_hash.is_none());
        assert!(item.approval_token.is_none());
        assert!(item.is_pending());
    }
}

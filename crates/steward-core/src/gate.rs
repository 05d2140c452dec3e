// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stateless admission filter for intents.
//!
//! Schedulers are not trusted to respect the allow-list; everything they
//! propose passes through here before a controller sees it.

use crate::{Decision, Domain, Intent};
use std::collections::BTreeSet;

/// Intent types admitted by the default gate policy.
pub const ALLOWED_INTENT_TYPES: &[&str] = &[
    // message drafts + enqueue
    "draft_reply",
    "triage_summary",
    "ask_clarifying_question",
    "enqueue_send_draft",
    // calendar drafts + enqueue
    "agenda_draft",
    "conflict_report",
    "propose_slots",
    "enqueue_event_draft",
    // coding drafts
    "run_tests",
    "draft_patch",
    // forum drafts + enqueue
    "draft_forum_reply",
    "draft_forum_post",
];

/// What the gate admits: allow-listed types and permitted domains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatePolicy {
    /// Intent types that may pass.
    pub allow_types: BTreeSet<String>,
    /// Domains that may pass.
    pub allow_domains: BTreeSet<Domain>,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            allow_types: ALLOWED_INTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allow_domains: Domain::ALL.into_iter().collect(),
        }
    }
}

/// The admission gate. Consults no state beyond its policy.
#[derive(Debug, Clone, Default)]
pub struct Gate {
    policy: GatePolicy,
}

impl Gate {
    /// A gate with the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// A gate with a custom policy.
    pub fn with_policy(policy: GatePolicy) -> Self {
        Self { policy }
    }

    /// Validate one intent's shape.
    ///
    /// Reason codes on rejection: `type_not_allowlisted`, `unknown_domain`,
    /// `bad_priority` (value/urgency out of [0,1]), `bad_effort`
    /// (effort out of [0,3600]).
    pub fn decide(&self, intent: Intent) -> Decision {
        if !self.policy.allow_types.contains(&intent.kind) {
            return Decision::reject(intent, "type_not_allowlisted");
        }
        if !self.policy.allow_domains.contains(&intent.domain) {
            return Decision::reject(intent, "unknown_domain");
        }
        if !((0.0..=1.0).contains(&intent.value) && (0.0..=1.0).contains(&intent.urgency)) {
            return Decision::reject(intent, "bad_priority");
        }
        if intent.effort_s > 3600 {
            return Decision::reject(intent, "bad_effort");
        }
        Decision::accept(intent)
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! steward-core
//!
//! The stable contract for steward: intent and decision types shared by the
//! orchestrator, the approval engine, and the executor daemon.
//!
//! If you only take one dependency, take this one.
#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Single-winner intent selection.
pub mod arbiter;
/// Canonical JSON encoding and SHA-256 fingerprints.
pub mod fingerprint;
/// Stateless intent admission.
pub mod gate;

pub use arbiter::GlobalArbiter;
pub use fingerprint::{canonical_json, fingerprint, sha256_hex};
pub use gate::{Gate, GatePolicy};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Errors produced when contract types fail to serialize.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    /// JSON (de)serialization failure.
    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// The closed set of domains a proposal may target.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Inbox threads and outbound mail drafts.
    Messages,
    /// Calendar events and agenda drafts.
    Calendar,
    /// Local repositories (test runs, patch drafts).
    Coding,
    /// The social forum feed, posts, and replies.
    Forum,
}

impl Domain {
    /// All domains, in declaration order.
    pub const ALL: [Domain; 4] = [
        Domain::Messages,
        Domain::Calendar,
        Domain::Coding,
        Domain::Forum,
    ];

    /// The lowercase wire name of this domain.
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Messages => "messages",
            Domain::Calendar => "calendar",
            Domain::Coding => "coding",
            Domain::Forum => "forum",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "messages" => Ok(Domain::Messages),
            "calendar" => Ok(Domain::Calendar),
            "coding" => Ok(Domain::Coding),
            "forum" => Ok(Domain::Forum),
            other => Err(format!("unknown domain '{other}'")),
        }
    }
}

/// Risk descriptor attached to an intent.
///
/// Advisory at the gate; the approval queues are what actually hold
/// side-effectful work behind tokens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Risk {
    /// The action touches a system outside this host.
    #[serde(default)]
    pub external_effect: bool,

    /// The action cannot be undone once performed.
    #[serde(default)]
    pub irreversible: bool,

    /// The action handles sensitive data.
    #[serde(default)]
    pub sensitive: bool,

    /// Token types the action would require at execution time.
    #[serde(default)]
    pub requires_token: Vec<String>,
}

/// A typed proposal to do something in one domain.
///
/// Intents are immutable once constructed; schedulers produce them, the gate
/// validates their shape, and the arbiter picks at most one per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Intent {
    /// Stable identifier (uuid v4).
    pub id: String,

    /// Target domain.
    pub domain: Domain,

    /// Free-form intent type; must be on the gate's allow-list to pass.
    #[serde(rename = "type")]
    pub kind: String,

    /// Untrusted property bag carried from the scheduler to the controller.
    #[serde(default)]
    pub payload: BTreeMap<String, serde_json::Value>,

    /// Expected value in [0.0, 1.0].
    pub value: f64,

    /// Urgency in [0.0, 1.0].
    pub urgency: f64,

    /// Estimated effort in seconds, in [0, 3600].
    pub effort_s: u32,

    /// Risk descriptor.
    #[serde(default)]
    pub risk: Risk,

    /// Human-readable precondition labels (advisory).
    #[serde(default)]
    pub preconditions: Vec<String>,
}

impl Intent {
    /// Create an intent with a fresh id and neutral scores
    /// (`value=0.5`, `urgency=0.5`, `effort_s=60`).
    pub fn new(domain: Domain, kind: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            domain,
            kind: kind.into(),
            payload: BTreeMap::new(),
            value: 0.5,
            urgency: 0.5,
            effort_s: 60,
            risk: Risk::default(),
            preconditions: Vec::new(),
        }
    }

    /// Insert a payload entry.
    pub fn with_payload(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Set the scoring triple.
    pub fn with_scores(mut self, value: f64, urgency: f64, effort_s: u32) -> Self {
        self.value = value;
        self.urgency = urgency;
        self.effort_s = effort_s;
        self
    }

    /// Set the precondition labels.
    pub fn with_preconditions(mut self, preconditions: Vec<String>) -> Self {
        self.preconditions = preconditions;
        self
    }

    /// Fetch a payload field as a string, empty when absent or non-string.
    pub fn payload_str(&self, key: &str) -> &str {
        self.payload.get(key).and_then(|v| v.as_str()).unwrap_or("")
    }
}

/// The gate's verdict on a single intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Decision {
    /// The intent that was judged.
    pub intent: Intent,
    /// Whether the intent may proceed to a controller.
    pub accepted: bool,
    /// One-word reason code (`ok` on acceptance).
    pub reason: String,
}

impl Decision {
    /// An accepting decision with reason `ok`.
    pub fn accept(intent: Intent) -> Self {
        Self {
            intent,
            accepted: true,
            reason: "ok".to_string(),
        }
    }

    /// A rejecting decision with the given reason code.
    pub fn reject(intent: Intent, reason: impl Into<String>) -> Self {
        Self {
            intent,
            accepted: false,
            reason: reason.into(),
        }
    }
}

/// Outcome status of a controller execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExecStatus {
    /// The controller produced its artifacts.
    Ok,
    /// The controller ran but the work failed.
    Fail,
    /// The intent was not applicable to this controller.
    Skipped,
}

impl fmt::Display for ExecStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecStatus::Ok => "ok",
            ExecStatus::Fail => "fail",
            ExecStatus::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// What a controller did with an accepted intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExecutionResult {
    /// Outcome status.
    pub status: ExecStatus,
    /// Paths of artifacts written during execution.
    #[serde(default)]
    pub artifacts: Vec<PathBuf>,
    /// Short operator-facing note.
    #[serde(default)]
    pub note: String,
}

impl ExecutionResult {
    /// A successful result.
    pub fn ok(artifacts: Vec<PathBuf>, note: impl Into<String>) -> Self {
        Self {
            status: ExecStatus::Ok,
            artifacts,
            note: note.into(),
        }
    }

    /// A failed result.
    pub fn fail(artifacts: Vec<PathBuf>, note: impl Into<String>) -> Self {
        Self {
            status: ExecStatus::Fail,
            artifacts,
            note: note.into(),
        }
    }

    /// A skipped result (no artifacts).
    pub fn skipped(note: impl Into<String>) -> Self {
        Self {
            status: ExecStatus::Skipped,
            artifacts: Vec::new(),
            note: note.into(),
        }
    }
}

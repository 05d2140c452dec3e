// SPDX-License-Identifier: MIT OR Apache-2.0
//! steward-queue
//!
//! Durable approval queues. Each domain owns one JSON-array file of queue
//! items; controllers append pending items, the approval engine stamps
//! tokens, and the executor daemon drives items to a terminal status. All
//! overwrites are atomic and merge against a fresh reload by `qid`, so the
//! orchestrator and the executor can share a file without dropping each
//! other's writes.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod dedupe;
mod item;
mod spec;
mod store;

pub use dedupe::DedupeStore;
pub use item::{ApprovedBy, QueueItem, QueueStatus};
pub use spec::{
    ActionKind, ActionSpec, CreateEventSpec, CreatePostSpec, ReplyPostSpec, SendEmailSpec,
};
pub use store::{ApprovalStamp, Finish, QueueStore};

use std::path::PathBuf;

/// Errors raised by the queue layer.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The queue file exists but is not a valid JSON array of items.
    ///
    /// Callers treat the queue as empty for the rest of the pass and must
    /// not overwrite the file, so the corrupt bytes survive for inspection.
    #[error("queue file {path} is corrupt: {detail}")]
    Corrupt {
        /// Path of the unreadable file.
        path: PathBuf,
        /// Parse error detail.
        detail: String,
    },

    /// Filesystem failure while reading or replacing a queue file.
    #[error("queue io on {path} failed: {source}")]
    Io {
        /// Path involved in the failed operation.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A value could not be serialized.
    #[error("queue serialization failed: {0}")]
    Encode(#[from] steward_core::ContractError),

    /// An embedded spec map is missing required fields for its action.
    #[error("spec for {qid} is invalid: {detail}")]
    SpecInvalid {
        /// The queue item's id.
        qid: String,
        /// What was wrong with the embedded map.
        detail: String,
    },

    /// Token minting failed during a manual approval.
    #[error(transparent)]
    Token(#[from] steward_token::TokenError),
}

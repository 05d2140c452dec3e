// SPDX-License-Identifier: MIT OR Apache-2.0
//! steward-exec
//!
//! The privileged half of the system. The daemon polls the approval queues,
//! verifies each pending item's token under the shared secret, checks the
//! binding against the item's `qid` and `spec_hash`, and only then hands the
//! spec to an external writer. Every outcome is terminal, recorded in both
//! the queue file and the dedupe store, so an action executes at most once
//! no matter how often the daemon restarts.
#![deny(unsafe_code)]
#![warn(missing_docs)]

/// The polling daemon.
pub mod daemon;
/// The forum HTTP client.
pub mod forum;
/// External writer implementations.
pub mod writers;

pub use daemon::{ExecutorDaemon, PassSummary};
pub use writers::{ActionWriter, DefaultWriters};

/// Errors that abort an executor pass (not per-item outcomes).
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The shared secret is empty; the daemon refuses to start.
    #[error("STEWARD_EXEC_SECRET is empty; executor refuses to start")]
    EmptySecret,

    /// Queue read/replace failure.
    #[error(transparent)]
    Queue(#[from] steward_queue::QueueError),

    /// Ledger append failure.
    #[error(transparent)]
    Ledger(#[from] steward_ledger::LedgerError),
}

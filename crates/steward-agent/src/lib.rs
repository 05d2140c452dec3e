// SPDX-License-Identifier: MIT OR Apache-2.0
//! steward-agent
//!
//! The orchestrator side of the system: per-domain schedulers turn input
//! state into candidate intents, the gate and arbiter pick one winner per
//! tick, and per-domain controllers realize it as draft artifacts and queue
//! entries. Nothing in this crate performs an external side effect or mints
//! a token; that privilege belongs to the approval engine and the executor
//! daemon.
#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Per-domain controllers.
pub mod controllers;
/// Per-domain schedulers.
pub mod schedulers;
/// Input state bundles consumed by the schedulers.
pub mod state;
/// The tick loop.
pub mod tick;

pub use state::{EventSummary, ThreadSummary, TickInputs};
pub use tick::{EmptyStateProvider, Orchestrator, StateProvider};

/// Errors raised by controllers and the tick loop.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Draft artifact I/O failure.
    #[error("artifact io on {path} failed: {source}")]
    Io {
        /// Path involved in the failed operation.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Queue append/read failure.
    #[error(transparent)]
    Queue(#[from] steward_queue::QueueError),

    /// Ledger append failure.
    #[error(transparent)]
    Ledger(#[from] steward_ledger::LedgerError),

    /// Approval engine failure at the end of a tick.
    #[error(transparent)]
    Approve(#[from] steward_approve::ApproveError),
}

impl AgentError {
    pub(crate) fn io(path: impl Into<std::path::PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

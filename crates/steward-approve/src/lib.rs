// SPDX-License-Identifier: MIT OR Apache-2.0
//! steward-approve
//!
//! The auto-approval layer: pure policy predicates over typed specs, and the
//! per-tick engine that scans the queues, mints short-lived tokens for items
//! the policy accepts, and stamps them back atomically. Forum items are
//! never auto-approved; they wait for a human.
#![deny(unsafe_code)]
#![warn(missing_docs)]

/// The per-tick approval engine.
pub mod engine;
/// Pure policy predicates.
pub mod policy;

pub use engine::auto_approve_once;
pub use policy::{can_auto_approve_event, can_auto_approve_send};

/// Errors raised by the approval engine.
#[derive(Debug, thiserror::Error)]
pub enum ApproveError {
    /// Queue read/replace failure.
    #[error(transparent)]
    Queue(#[from] steward_queue::QueueError),

    /// Token minting failure.
    #[error(transparent)]
    Token(#[from] steward_token::TokenError),

    /// Ledger append failure.
    #[error(transparent)]
    Ledger(#[from] steward_ledger::LedgerError),
}

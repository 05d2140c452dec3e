// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-domain controllers: realize one accepted intent as draft artifacts
//! and (for side-effectful intents) a pending queue entry.
//!
//! Controllers sanitize whatever they persist, never call an external
//! service, and never mint a token.

mod calendar;
mod coding;
mod forum;
mod messages;

pub use calendar::CalendarController;
pub use coding::CodingController;
pub use forum::ForumController;
pub use messages::MessagesController;

use crate::AgentError;
use std::path::Path;

/// Write a UTF-8 draft artifact, creating parent directories.
pub(crate) fn write_draft(path: &Path, content: &str) -> Result<(), AgentError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| AgentError::io(path, e))?;
    }
    std::fs::write(path, content).map_err(|e| AgentError::io(path, e))
}

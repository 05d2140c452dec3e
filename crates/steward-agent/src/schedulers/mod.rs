// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-domain schedulers: input state in, candidate intents out.
//!
//! Schedulers propose at most [`MAX_INTENTS_PER_TICK`] intents each and are
//! not trusted to respect the allow-list; everything still passes the gate.

mod calendar;
mod coding;
mod forum;
mod messages;

pub use calendar::CalendarScheduler;
pub use coding::{CodingScheduler, DEFAULT_SUITE};
pub use forum::ForumScheduler;
pub use messages::MessagesScheduler;

/// Cap on intents one scheduler may propose per tick.
pub const MAX_INTENTS_PER_TICK: usize = 10;

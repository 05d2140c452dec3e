// SPDX-License-Identifier: MIT OR Apache-2.0
//! The calendar scheduler: one `agenda_draft` per upcoming event.

use super::MAX_INTENTS_PER_TICK;
use crate::state::EventSummary;
use steward_core::{Domain, Intent};

/// Proposes `agenda_draft` intents over upcoming events.
pub struct CalendarScheduler<'a> {
    events: &'a [EventSummary],
}

impl<'a> CalendarScheduler<'a> {
    /// A scheduler over the tick's calendar state.
    pub fn new(events: &'a [EventSummary]) -> Self {
        Self { events }
    }

    /// Propose candidate intents for this tick.
    pub fn propose(&self) -> Vec<Intent> {
        self.events
            .iter()
            .take(MAX_INTENTS_PER_TICK)
            .map(|ev| {
                Intent::new(Domain::Calendar, "agenda_draft")
                    .with_scores(0.6, 0.4, 120)
                    .with_payload("event_id", ev.event_id.clone())
                    .with_payload("title", ev.title.clone())
                    .with_payload("when", ev.when.clone())
                    .with_payload("description", ev.description.clone())
                    .with_preconditions(vec!["has_calendar_data".to_string()])
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_agenda_draft_per_event() {
        let events = vec![
            EventSummary {
                event_id: "e1".to_string(),
                title: "Standup".to_string(),
                when: "Mon 9:00".to_string(),
                description: String::new(),
            },
            EventSummary {
                event_id: "e2".to_string(),
                title: "Review".to_string(),
                when: "Tue 14:00".to_string(),
                description: "quarterly".to_string(),
            },
        ];
        let intents = CalendarScheduler::new(&events).propose();
        assert_eq!(intents.len(), 2);
        for it in &intents {
            assert_eq!(it.kind, "agenda_draft");
            assert_eq!(it.domain, Domain::Calendar);
            assert_eq!((it.value, it.urgency, it.effort_s), (0.6, 0.4, 120));
        }
        assert_eq!(intents[1].payload_str("event_id"), "e2");
    }

    #[test]
    fn caps_at_ten() {
        let events: Vec<EventSummary> = (0..15)
            .map(|i| EventSummary {
                event_id: format!("e{i}"),
                ..EventSummary::default()
            })
            .collect();
        assert_eq!(CalendarScheduler::new(&events).propose().len(), 10);
    }

    #[test]
    fn no_events_no_intents() {
        assert!(CalendarScheduler::new(&[]).propose().is_empty());
    }
}

//! Event and outcome entities.
//!
//! An event is a single market: a title, a trading window, a resolution kind,
//! and a fixed set of outcomes declared at creation. Only two things about an
//! event ever change after creation: each outcome's cached display cost, and
//! the one-way `finalized` flag set by settlement.

use crate::pricing::cold_start_price;
use crate::types::{EventId, EventKind, OutcomeId, Price, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One possible resolution of an event.
///
/// `value` is the integer tag a settlement call declares as the winner.
/// `cost` is the last-computed marginal price, cached purely for display;
/// real pricing always goes back to the ledger totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub id: OutcomeId,
    pub event_id: EventId,
    pub description: String,
    pub value: i64,
    pub cost: Price,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub kind: EventKind,
    /// Declared unit count representing one full market.
    pub value: u32,
    pub finalized: bool,
    pub outcomes: Vec<Outcome>,
}

impl Event {
    pub fn outcome(&self, outcome_id: &OutcomeId) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| &o.id == outcome_id)
    }

    pub(crate) fn outcome_mut(&mut self, outcome_id: &OutcomeId) -> Option<&mut Outcome> {
        self.outcomes.iter_mut().find(|o| &o.id == outcome_id)
    }

    /// Look up an outcome by its declared winner tag.
    pub fn outcome_by_value(&self, value: i64) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.value == value)
    }

    pub fn outcome_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn in_window(&self, now: Timestamp) -> bool {
        self.start_time <= now && now <= self.end_time
    }

    /// Whether purchases are currently accepted.
    pub fn is_open(&self, now: Timestamp) -> bool {
        !self.finalized && self.in_window(now)
    }
}

/// Outcome description submitted at event creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeDraft {
    pub description: String,
    pub value: i64,
}

/// Everything a market operator supplies to open a new event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub kind: EventKind,
    pub value: u32,
    pub outcomes: Vec<OutcomeDraft>,
}

impl EventDraft {
    pub fn validate(&self) -> Result<(), EventError> {
        if self.end_time <= self.start_time {
            return Err(EventError::InvalidWindow {
                start: self.start_time,
                end: self.end_time,
            });
        }
        if self.value == 0 {
            return Err(EventError::ZeroValue);
        }
        let mut seen = HashSet::new();
        for outcome in &self.outcomes {
            if !seen.insert(outcome.value) {
                return Err(EventError::DuplicateOutcomeValue(outcome.value));
            }
        }
        Ok(())
    }

    /// Materialize the draft into an event with fresh ids. Each outcome's
    /// display cost starts at the cold-start prior so listings show a sane
    /// price before the first trade.
    pub(crate) fn build(self) -> Event {
        let event_id = EventId::generate();
        let prior = cold_start_price(self.outcomes.len());
        let outcomes = self
            .outcomes
            .into_iter()
            .map(|draft| Outcome {
                id: OutcomeId::generate(),
                event_id: event_id.clone(),
                description: draft.description,
                value: draft.value,
                cost: prior,
            })
            .collect();

        Event {
            id: event_id,
            title: self.title,
            start_time: self.start_time,
            end_time: self.end_time,
            kind: self.kind,
            value: self.value,
            finalized: false,
            outcomes,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EventError {
    #[error("trading window ends ({end:?}) before it starts ({start:?})")]
    InvalidWindow { start: Timestamp, end: Timestamp },

    #[error("event value must be positive")]
    ZeroValue,

    #[error("duplicate outcome value {0}")]
    DuplicateOutcomeValue(i64),
}

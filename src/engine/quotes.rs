//! Read-only price quotes.

use super::core::Engine;
use super::results::EngineError;
use crate::quote::{simulate_purchase, PriceQuote};
use crate::types::{EventId, OutcomeId};

impl Engine {
    /// Quote the price path for buying `units` of an outcome against current
    /// ledger totals. Touches no state; quoting twice with no intervening
    /// trades always returns the same sequence a purchase would charge.
    pub fn quote(
        &self,
        event_id: &EventId,
        outcome_id: &OutcomeId,
        units: u32,
    ) -> Result<PriceQuote, EngineError> {
        if units == 0 {
            return Err(EngineError::InvalidQuantity);
        }

        let event = self
            .events
            .get(event_id)
            .ok_or_else(|| EngineError::EventNotFound(event_id.clone()))?;
        let outcome = event
            .outcome(outcome_id)
            .ok_or_else(|| EngineError::OutcomeNotFound(outcome_id.clone()))?;

        Ok(simulate_purchase(
            self.ledger.outcome_units(&outcome.id),
            self.ledger.event_units(event_id),
            event.outcome_count(),
            units,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use crate::event::{EventDraft, OutcomeDraft};
    use crate::types::{EventKind, Price, Timestamp};
    use rust_decimal_macros::dec;

    fn engine_with_event(outcomes: usize) -> (Engine, EventId, Vec<OutcomeId>) {
        let mut engine = Engine::new(EngineConfig::default());
        engine.set_time(Timestamp::from_millis(5_000));
        let event_id = engine
            .create_event(EventDraft {
                title: "Quoted".to_string(),
                start_time: Timestamp::from_millis(0),
                end_time: Timestamp::from_millis(100_000),
                kind: EventKind::MultipleChoice,
                value: 20,
                outcomes: (0..outcomes)
                    .map(|i| OutcomeDraft {
                        description: format!("Option {i}"),
                        value: i as i64,
                    })
                    .collect(),
            })
            .unwrap();
        let ids = engine
            .get_event(&event_id)
            .unwrap()
            .outcomes
            .iter()
            .map(|o| o.id.clone())
            .collect();
        (engine, event_id, ids)
    }

    #[test]
    fn cold_start_quotes_uniform_prior() {
        let (engine, event_id, outcomes) = engine_with_event(4);
        let quote = engine.quote(&event_id, &outcomes[2], 1).unwrap();
        assert_eq!(quote.prices[0].value(), dec!(0.25));
    }

    #[test]
    fn quote_is_idempotent() {
        let (engine, event_id, outcomes) = engine_with_event(2);
        let first = engine.quote(&event_id, &outcomes[0], 5).unwrap();
        let second = engine.quote(&event_id, &outcomes[0], 5).unwrap();
        assert_eq!(first, second);
        // quoting simulates but never persists
        assert_eq!(engine.ledger().event_units(&event_id), 0);
    }

    #[test]
    fn quote_matches_subsequent_purchase() {
        let (mut engine, event_id, outcomes) = engine_with_event(2);
        let account_id = engine.create_funded_account();

        let quoted = engine.quote(&event_id, &outcomes[0], 3).unwrap();
        let bought = engine
            .buy(&event_id, &outcomes[0], 3, Price::ceiling(), &account_id)
            .unwrap();

        let quoted_prices: Vec<_> = quoted.prices.iter().map(|p| p.as_money()).collect();
        assert_eq!(quoted_prices, bought.unit_prices());
        assert_eq!(quoted.total_cost, bought.total_cost);
    }

    #[test]
    fn quote_errors() {
        let (engine, event_id, outcomes) = engine_with_event(2);
        assert!(matches!(
            engine.quote(&EventId::new("ghost"), &outcomes[0], 1),
            Err(EngineError::EventNotFound(_))
        ));
        assert!(matches!(
            engine.quote(&event_id, &OutcomeId::new("ghost"), 1),
            Err(EngineError::OutcomeNotFound(_))
        ));
        assert!(matches!(
            engine.quote(&event_id, &outcomes[0], 0),
            Err(EngineError::InvalidQuantity)
        ));
    }
}

// 5.0: gateway.rs: the surface an API layer calls when requests arrive
// concurrently. engine methods take &mut self and are deterministic; this
// wrapper adds the serialization story.
//
// purchases run optimistically: the quote half executes under a read lock
// against a versioned snapshot, the commit half under a write lock that
// only lands if the event's version is unchanged. a stale commit re-prepares
// from scratch, bounded by the engine's retry budget, then surfaces
// TransactionConflict. settlement holds the write lock for its entire
// sequence, so no purchase can slip in after finalization begins and the
// payout pass sees the complete share set.

use crate::engine::{CommitError, Engine, EngineError, PurchaseResult, SettlementReport};
use crate::event::EventDraft;
use crate::quote::PriceQuote;
use crate::types::{AccountId, EventId, Money, OutcomeId, Price};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug)]
pub struct MarketGateway {
    engine: RwLock<Engine>,
}

impl MarketGateway {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine: RwLock::new(engine),
        }
    }

    pub fn into_inner(self) -> Engine {
        self.engine.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> RwLockReadGuard<'_, Engine> {
        self.engine.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Engine> {
        self.engine.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a closure against the engine under the read lock. Used for
    /// listings and assertions; cannot mutate.
    pub fn with_engine<R>(&self, f: impl FnOnce(&Engine) -> R) -> R {
        f(&self.read())
    }

    pub fn create_event(&self, draft: EventDraft) -> Result<EventId, EngineError> {
        self.write().create_event(draft)
    }

    pub fn create_funded_account(&self) -> AccountId {
        self.write().create_funded_account()
    }

    pub fn deposit(&self, account_id: &AccountId, amount: Money) -> Result<(), EngineError> {
        self.write().deposit(account_id, amount)
    }

    pub fn quote(
        &self,
        event_id: &EventId,
        outcome_id: &OutcomeId,
        units: u32,
    ) -> Result<PriceQuote, EngineError> {
        self.read().quote(event_id, outcome_id, units)
    }

    /// Concurrent-safe purchase: optimistic prepare under the read lock,
    /// version-checked commit under the write lock.
    pub fn buy(
        &self,
        event_id: &EventId,
        outcome_id: &OutcomeId,
        units: u32,
        max_price: Price,
        account_id: &AccountId,
    ) -> Result<PurchaseResult, EngineError> {
        let attempts = self.read().config().max_commit_retries.max(1);

        for _ in 0..attempts {
            // bind the result so the read guard (a temporary in the call)
            // is dropped before the match arms take the write lock
            let prep_result =
                self.read()
                    .prepare_purchase(event_id, outcome_id, units, max_price, account_id);
            let prepared = match prep_result {
                Ok(prepared) => prepared,
                Err(err) => {
                    self.write().audit_rejection(event_id, account_id, &err);
                    return Err(err);
                }
            };

            let mut engine = self.write();
            match engine.commit_purchase(prepared) {
                Ok(result) => return Ok(result),
                Err(CommitError::Stale) => continue,
                Err(CommitError::Rejected(err)) => {
                    engine.audit_rejection(event_id, account_id, &err);
                    return Err(err);
                }
            }
        }

        Err(EngineError::TransactionConflict(event_id.clone()))
    }

    /// Settlement takes the write lock across the whole resolve-and-pay
    /// sequence.
    pub fn close(
        &self,
        event_id: &EventId,
        winning_value: i64,
        operator: bool,
    ) -> Result<SettlementReport, EngineError> {
        self.write().close(event_id, winning_value, operator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use crate::event::OutcomeDraft;
    use crate::types::{EventKind, Timestamp};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::thread;

    fn gateway_with_event(outcomes: usize) -> (MarketGateway, EventId, Vec<OutcomeId>) {
        let mut engine = Engine::new(EngineConfig::default());
        engine.set_time(Timestamp::from_millis(5_000));
        let gateway = MarketGateway::new(engine);

        let event_id = gateway
            .create_event(EventDraft {
                title: "Concurrent".to_string(),
                start_time: Timestamp::from_millis(0),
                end_time: Timestamp::from_millis(1_000_000),
                kind: EventKind::MultipleChoice,
                value: 100,
                outcomes: (0..outcomes)
                    .map(|i| OutcomeDraft {
                        description: format!("Option {i}"),
                        value: i as i64,
                    })
                    .collect(),
            })
            .unwrap();

        let outcome_ids = gateway.with_engine(|e| {
            e.get_event(&event_id)
                .unwrap()
                .outcomes
                .iter()
                .map(|o| o.id.clone())
                .collect()
        });
        (gateway, event_id, outcome_ids)
    }

    #[test]
    fn single_threaded_flow_through_gateway() {
        let (gateway, event_id, outcomes) = gateway_with_event(2);
        let account = gateway.create_funded_account();

        let quote = gateway.quote(&event_id, &outcomes[0], 3).unwrap();
        assert_eq!(quote.total_cost.value(), dec!(2.48));

        let bought = gateway
            .buy(&event_id, &outcomes[0], 3, Price::ceiling(), &account)
            .unwrap();
        assert_eq!(bought.total_cost, quote.total_cost);

        let report = gateway.close(&event_id, 0, true).unwrap();
        assert_eq!(report.shares_paid, 3);
        let balance = gateway.with_engine(|e| e.get_account(&account).unwrap().balance);
        assert_eq!(balance.value(), dec!(100.52));
    }

    #[test]
    fn gateway_rejections_reach_the_audit_trail() {
        use crate::audit::AuditPayload;

        let (gateway, event_id, outcomes) = gateway_with_event(2);
        let account = gateway.create_funded_account();

        // second unit prices at the ceiling, far above a 0.50 cap
        let result = gateway.buy(
            &event_id,
            &outcomes[0],
            2,
            Price::clamped(dec!(0.50)),
            &account,
        );
        assert!(matches!(result, Err(EngineError::SlippageExceeded { .. })));

        gateway.with_engine(|engine| {
            let rejection = engine
                .audit_records()
                .iter()
                .find(|r| matches!(r.payload, AuditPayload::PurchaseRejected(_)));
            assert!(rejection.is_some());
        });
    }

    #[test]
    fn concurrent_buyers_conserve_value() {
        let (gateway, event_id, outcomes) = gateway_with_event(2);
        let buyers: Vec<AccountId> = (0..8).map(|_| gateway.create_funded_account()).collect();

        thread::scope(|scope| {
            for (i, account) in buyers.iter().enumerate() {
                let outcome = outcomes[i % 2].clone();
                let event_id = &event_id;
                let gateway = &gateway;
                scope.spawn(move || {
                    for _ in 0..5 {
                        // conflicts and floor-priced rejections are fine;
                        // partial commits are not
                        let _ = gateway.buy(event_id, &outcome, 1, Price::ceiling(), account);
                    }
                });
            }
        });

        gateway.with_engine(|engine| {
            let committed_units = engine.ledger().event_units(&event_id);
            let committed_cost: Decimal = engine
                .ledger()
                .shares()
                .iter()
                .map(|s| s.price_paid.value())
                .sum();

            let spent: Decimal = buyers
                .iter()
                .map(|b| dec!(100) - engine.get_account(b).unwrap().balance.value())
                .sum();

            // every committed unit was paid for exactly once
            assert_eq!(committed_cost, spent);
            assert_eq!(committed_units, engine.ledger().shares().len() as u64);
        });
    }

    #[test]
    fn settlement_excludes_late_purchases() {
        let (gateway, event_id, outcomes) = gateway_with_event(2);
        let account = gateway.create_funded_account();
        gateway
            .buy(&event_id, &outcomes[0], 1, Price::ceiling(), &account)
            .unwrap();

        gateway.close(&event_id, 0, true).unwrap();
        let result = gateway.buy(&event_id, &outcomes[0], 1, Price::ceiling(), &account);
        assert!(matches!(result, Err(EngineError::MarketUnavailable(_))));
    }
}

// 4.3 engine/settlement.rs: close a market and pay winners exactly once.
//
// settlement is deliberately not idempotent: a second close is an operator
// mistake and fails loudly with AlreadyFinalized instead of being swallowed.
// payout is flat par (1.0 per unit) regardless of price paid; the purchase
// price determines the holder's net profit, not the payout.

use super::core::Engine;
use super::results::{CommitError, EngineError, SettlementReport};
use crate::audit::{AuditPayload, EventFinalizedRecord, PayoutCreditedRecord};
use crate::ledger::{LedgerInstruction, UnitOfWork};
use crate::types::{AccountId, EventId, Money};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::info;

/// Payout per winning unit.
fn par_payout() -> Money {
    Money::one()
}

impl Engine {
    /// Finalize an event, declaring the outcome whose `value` tag matches
    /// `winning_value` as the winner, and credit all of its holders. The
    /// finalize flag and every credit commit as one atomic unit.
    ///
    /// `operator` is the caller's already-verified operator capability;
    /// credential checking happens outside the engine.
    pub fn close(
        &mut self,
        event_id: &EventId,
        winning_value: i64,
        operator: bool,
    ) -> Result<SettlementReport, EngineError> {
        if !operator {
            return Err(EngineError::Forbidden);
        }

        let event = self
            .events
            .get(event_id)
            .ok_or_else(|| EngineError::EventNotFound(event_id.clone()))?;
        if event.finalized {
            return Err(EngineError::AlreadyFinalized(event_id.clone()));
        }

        let winner = event
            .outcome_by_value(winning_value)
            .ok_or_else(|| EngineError::NoMatchingOutcome {
                event_id: event_id.clone(),
                value: winning_value,
            })?;
        let winning_outcome_id = winner.id.clone();
        let winning_description = winner.description.clone();

        // aggregate winning units per holder
        let mut payouts: HashMap<AccountId, u64> = HashMap::new();
        let mut units_paid: u64 = 0;
        for share in self.ledger.shares_for_outcome(&winning_outcome_id) {
            *payouts.entry(share.account_id.clone()).or_insert(0) += u64::from(share.units);
            units_paid += u64::from(share.units);
        }

        let mut uow = UnitOfWork::new(event_id.clone(), self.ledger.version(event_id));
        uow.push(LedgerInstruction::FinalizeEvent);
        for (account_id, units) in &payouts {
            uow.push(LedgerInstruction::CreditAccount {
                account_id: account_id.clone(),
                amount: par_payout().mul(Decimal::from(*units)),
            });
        }

        match self.apply(uow) {
            Ok(()) => {}
            // under exclusive access the snapshot cannot go stale between
            // the reads above and this commit
            Err(CommitError::Stale) => {
                return Err(EngineError::TransactionConflict(event_id.clone()))
            }
            Err(CommitError::Rejected(err)) => return Err(err),
        }

        let total_paid = par_payout().mul(Decimal::from(units_paid));
        info!(
            event = %event_id,
            winner = %winning_outcome_id,
            units = units_paid,
            accounts = payouts.len(),
            "event settled"
        );

        for (account_id, units) in &payouts {
            let new_balance = self
                .accounts
                .get(account_id)
                .map(|a| a.balance)
                .unwrap_or_else(Money::zero);
            self.emit_audit(AuditPayload::PayoutCredited(PayoutCreditedRecord {
                event_id: event_id.clone(),
                account_id: account_id.clone(),
                amount: par_payout().mul(Decimal::from(*units)),
                new_balance,
            }));
        }
        self.emit_audit(AuditPayload::EventFinalized(EventFinalizedRecord {
            event_id: event_id.clone(),
            winning_outcome_id: winning_outcome_id.clone(),
            shares_paid: units_paid as usize,
            total_paid,
        }));

        Ok(SettlementReport {
            event_id: event_id.clone(),
            winning_outcome_id,
            winning_description,
            shares_paid: units_paid as usize,
            accounts_credited: payouts.len(),
            total_paid,
        })
    }
}

// 3.0: the ledger. committed share records plus the unit-of-work type every
// state-changing operation commits through.
//
// aggregate demand totals are never stored as counters. they are recomputed
// by summing committed share records, inside the same commit boundary that
// appends new ones, so the totals cannot drift from the records. each event
// carries a version that bumps on every commit touching it; a snapshot taken
// at quote time is only allowed to commit against an unchanged version.

use crate::share::Share;
use crate::types::{AccountId, EventId, Money, OutcomeId, Price};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct Ledger {
    shares: Vec<Share>,
    versions: HashMap<EventId, u64>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit version of an event. Starts at 0, bumps on every commit that
    /// touches the event.
    pub fn version(&self, event_id: &EventId) -> u64 {
        self.versions.get(event_id).copied().unwrap_or(0)
    }

    /// Cumulative committed unit count for one outcome, by aggregation.
    pub fn outcome_units(&self, outcome_id: &OutcomeId) -> u64 {
        self.shares
            .iter()
            .filter(|s| &s.outcome_id == outcome_id)
            .map(|s| u64::from(s.units))
            .sum()
    }

    /// Cumulative committed unit count across a whole event, by aggregation.
    pub fn event_units(&self, event_id: &EventId) -> u64 {
        self.shares
            .iter()
            .filter(|s| &s.event_id == event_id)
            .map(|s| u64::from(s.units))
            .sum()
    }

    pub fn shares(&self) -> &[Share] {
        &self.shares
    }

    pub fn shares_for_outcome<'a>(
        &'a self,
        outcome_id: &'a OutcomeId,
    ) -> impl Iterator<Item = &'a Share> {
        self.shares.iter().filter(move |s| &s.outcome_id == outcome_id)
    }

    pub fn shares_for_account<'a>(
        &'a self,
        account_id: &'a AccountId,
    ) -> impl Iterator<Item = &'a Share> {
        self.shares.iter().filter(move |s| &s.account_id == account_id)
    }

    pub(crate) fn record_share(&mut self, share: Share) {
        self.shares.push(share);
    }

    pub(crate) fn bump_version(&mut self, event_id: &EventId) {
        *self.versions.entry(event_id.clone()).or_insert(0) += 1;
    }
}

/// One mutation inside a unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LedgerInstruction {
    CreateShare(Share),
    DebitAccount { account_id: AccountId, amount: Money },
    CreditAccount { account_id: AccountId, amount: Money },
    SetOutcomeCost { outcome_id: OutcomeId, cost: Price },
    FinalizeEvent,
}

/// An atomic batch of mutations against one event.
///
/// Commit is validate-all-then-apply-all: if any instruction fails
/// validation, or the event's version no longer matches the snapshot the
/// batch was built from, nothing is applied.
#[derive(Debug, Clone)]
pub struct UnitOfWork {
    pub event_id: EventId,
    pub expected_version: u64,
    pub instructions: Vec<LedgerInstruction>,
}

impl UnitOfWork {
    pub fn new(event_id: EventId, expected_version: u64) -> Self {
        Self {
            event_id,
            expected_version,
            instructions: Vec::new(),
        }
    }

    pub fn push(&mut self, instruction: LedgerInstruction) {
        self.instructions.push(instruction);
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Net balance change per account across the batch, used to validate
    /// that no account can be driven negative before anything is applied.
    pub fn net_flows(&self) -> HashMap<AccountId, Money> {
        let mut flows: HashMap<AccountId, Money> = HashMap::new();
        for instruction in &self.instructions {
            match instruction {
                LedgerInstruction::DebitAccount { account_id, amount } => {
                    let entry = flows.entry(account_id.clone()).or_insert_with(Money::zero);
                    *entry = entry.sub(*amount);
                }
                LedgerInstruction::CreditAccount { account_id, amount } => {
                    let entry = flows.entry(account_id.clone()).or_insert_with(Money::zero);
                    *entry = entry.add(*amount);
                }
                LedgerInstruction::CreateShare(_)
                | LedgerInstruction::SetOutcomeCost { .. }
                | LedgerInstruction::FinalizeEvent => {}
            }
        }
        flows
    }
}

/// Failures in the commit machinery itself, distinct from the domain errors
/// a caller can act on. A well-formed engine never produces these.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LedgerError {
    #[error("unit of work references unknown account {0}")]
    UnknownAccount(AccountId),

    #[error("unit of work references unknown event {0}")]
    UnknownEvent(EventId),

    #[error("unit of work references unknown outcome {0}")]
    UnknownOutcome(OutcomeId),

    #[error("empty unit of work")]
    EmptyUnitOfWork,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Price, ShareId, Timestamp};
    use rust_decimal_macros::dec;

    fn share(event: &str, outcome: &str, account: &str) -> Share {
        Share {
            id: ShareId::generate(),
            event_id: EventId::new(event),
            outcome_id: OutcomeId::new(outcome),
            account_id: AccountId::new(account),
            units: 1,
            price_paid: Money::new(dec!(0.5)),
            created_at: Timestamp::from_millis(0),
        }
    }

    #[test]
    fn totals_are_derived_from_records() {
        let mut ledger = Ledger::new();
        assert_eq!(ledger.event_units(&EventId::new("e1")), 0);

        ledger.record_share(share("e1", "a", "u1"));
        ledger.record_share(share("e1", "a", "u2"));
        ledger.record_share(share("e1", "b", "u1"));
        ledger.record_share(share("e2", "c", "u1"));

        assert_eq!(ledger.event_units(&EventId::new("e1")), 3);
        assert_eq!(ledger.outcome_units(&OutcomeId::new("a")), 2);
        assert_eq!(ledger.outcome_units(&OutcomeId::new("b")), 1);
        assert_eq!(ledger.event_units(&EventId::new("e2")), 1);
    }

    #[test]
    fn account_and_outcome_views() {
        let mut ledger = Ledger::new();
        ledger.record_share(share("e1", "a", "u1"));
        ledger.record_share(share("e1", "b", "u1"));
        ledger.record_share(share("e1", "a", "u2"));

        let u1 = AccountId::new("u1");
        assert_eq!(ledger.shares_for_account(&u1).count(), 2);
        let a = OutcomeId::new("a");
        assert_eq!(ledger.shares_for_outcome(&a).count(), 2);
    }

    #[test]
    fn versions_start_at_zero_and_bump() {
        let mut ledger = Ledger::new();
        let e1 = EventId::new("e1");
        assert_eq!(ledger.version(&e1), 0);
        ledger.bump_version(&e1);
        ledger.bump_version(&e1);
        assert_eq!(ledger.version(&e1), 2);
        assert_eq!(ledger.version(&EventId::new("e2")), 0);
    }

    #[test]
    fn net_flows_combine_debits_and_credits() {
        let mut uow = UnitOfWork::new(EventId::new("e1"), 0);
        let buyer = AccountId::new("buyer");
        uow.push(LedgerInstruction::DebitAccount {
            account_id: buyer.clone(),
            amount: Money::new(dec!(2.48)),
        });
        uow.push(LedgerInstruction::CreditAccount {
            account_id: buyer.clone(),
            amount: Money::new(dec!(1)),
        });
        uow.push(LedgerInstruction::SetOutcomeCost {
            outcome_id: OutcomeId::new("a"),
            cost: Price::clamped(dec!(0.75)),
        });

        let flows = uow.net_flows();
        assert_eq!(flows.get(&buyer).unwrap().value(), dec!(-1.48));
    }
}

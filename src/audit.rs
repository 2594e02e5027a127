// 7.0: every committed state change produces an audit record. used for audit
// trails and for asserting engine behavior in tests. the AuditPayload enum
// lists all record types.

use crate::types::{AccountId, EventId, Money, OutcomeId, Price, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AuditId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: AuditId,
    pub timestamp: Timestamp,
    pub payload: AuditPayload,
}

impl AuditRecord {
    pub fn new(id: AuditId, timestamp: Timestamp, payload: AuditPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AuditPayload {
    // lifecycle
    EventCreated(EventCreatedRecord),
    AccountCreated(AccountCreatedRecord),
    Deposited(DepositedRecord),

    // trading
    SharesPurchased(SharesPurchasedRecord),
    PurchaseRejected(PurchaseRejectedRecord),

    // settlement
    EventFinalized(EventFinalizedRecord),
    PayoutCredited(PayoutCreditedRecord),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCreatedRecord {
    pub event_id: EventId,
    pub title: String,
    pub outcome_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountCreatedRecord {
    pub account_id: AccountId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositedRecord {
    pub account_id: AccountId,
    pub amount: Money,
    pub new_balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharesPurchasedRecord {
    pub event_id: EventId,
    pub outcome_id: OutcomeId,
    pub account_id: AccountId,
    pub units: u32,
    pub total_cost: Money,
    pub last_price: Price,
    pub new_balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRejectedRecord {
    pub event_id: EventId,
    pub account_id: AccountId,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventFinalizedRecord {
    pub event_id: EventId,
    pub winning_outcome_id: OutcomeId,
    pub shares_paid: usize,
    pub total_paid: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutCreditedRecord {
    pub event_id: EventId,
    pub account_id: AccountId,
    pub amount: Money,
    pub new_balance: Money,
}

// 4.0.2: result types and errors for engine operations.

use crate::account::AccountError;
use crate::event::EventError;
use crate::ledger::LedgerError;
use crate::share::Share;
use crate::types::{AccountId, EventId, Money, OutcomeId, Price};

/// Outcome of a committed purchase: the newly created share records, one per
/// unit, each carrying the exact price charged for that unit.
#[derive(Debug, Clone)]
pub struct PurchaseResult {
    pub shares: Vec<Share>,
    pub total_cost: Money,
}

impl PurchaseResult {
    pub fn unit_prices(&self) -> Vec<Money> {
        self.shares.iter().map(|s| s.price_paid).collect()
    }
}

/// Outcome of closing an event.
#[derive(Debug, Clone)]
pub struct SettlementReport {
    pub event_id: EventId,
    pub winning_outcome_id: OutcomeId,
    pub winning_description: String,
    /// Unit count paid out at par.
    pub shares_paid: usize,
    pub accounts_credited: usize,
    pub total_paid: Money,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("event {0} not found")]
    EventNotFound(EventId),

    #[error("outcome {0} not found on event")]
    OutcomeNotFound(OutcomeId),

    #[error("account {0} not found")]
    AccountNotFound(AccountId),

    #[error("event {0} is not open for trading")]
    MarketUnavailable(EventId),

    #[error("purchase quantity must be at least 1")]
    InvalidQuantity,

    #[error("slippage exceeded: last unit priced {quoted}, buyer ceiling {ceiling}")]
    SlippageExceeded { quoted: Price, ceiling: Price },

    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Money, available: Money },

    #[error("event {0} is already finalized")]
    AlreadyFinalized(EventId),

    #[error("no outcome of event {event_id} carries value {value}")]
    NoMatchingOutcome { event_id: EventId, value: i64 },

    #[error("concurrent trading on event {0}, commit retries exhausted")]
    TransactionConflict(EventId),

    #[error("caller lacks operator authority")]
    Forbidden,

    #[error("event error: {0}")]
    Event(#[from] EventError),

    #[error("account error: {0}")]
    Account(#[from] AccountError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Internal commit verdict. `Stale` means the event changed since the
/// snapshot was taken and the caller should re-prepare; `Rejected` carries a
/// domain error to surface as-is.
#[derive(Debug)]
pub(crate) enum CommitError {
    Stale,
    Rejected(EngineError),
}

// 4.2 engine/purchases.rs: the transaction executor. turns a quote into a
// committed, balance-consistent trade.
//
// the flow is prepare (read-only: resolve, quote, slippage and balance
// checks against a versioned snapshot) then commit (atomic unit of work).
// a stale snapshot at commit time triggers a bounded re-prepare loop before
// surfacing a conflict, which is what keeps two concurrent purchases on the
// same event from both pricing off the same pre-trade totals.

use super::core::Engine;
use super::results::{CommitError, EngineError, PurchaseResult};
use crate::audit::{AuditPayload, PurchaseRejectedRecord, SharesPurchasedRecord};
use crate::ledger::{LedgerInstruction, UnitOfWork};
use crate::pricing::marginal_price;
use crate::quote::{simulate_purchase, PriceQuote};
use crate::share::Share;
use crate::types::{AccountId, EventId, OutcomeId, Price};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info};

/// Tolerance applied to the buyer's price ceiling so an exact-ceiling quote
/// is never rejected over representation noise.
pub const SLIPPAGE_TOLERANCE: Decimal = dec!(0.01);

/// A validated purchase, priced against one ledger snapshot. Only commits
/// if the event's version still matches that snapshot.
#[derive(Debug, Clone)]
pub(crate) struct PreparedPurchase {
    pub(crate) event_id: EventId,
    pub(crate) outcome_id: OutcomeId,
    pub(crate) account_id: AccountId,
    pub(crate) version: u64,
    pub(crate) quote: PriceQuote,
    pub(crate) post_trade_cost: Price,
}

impl Engine {
    /// Execute a purchase end to end: quote, validate, commit atomically.
    ///
    /// Fails without side effects on any validation error. Retries
    /// internally on snapshot staleness up to the configured bound, then
    /// reports a transaction conflict.
    pub fn buy(
        &mut self,
        event_id: &EventId,
        outcome_id: &OutcomeId,
        units: u32,
        max_price: Price,
        account_id: &AccountId,
    ) -> Result<PurchaseResult, EngineError> {
        let mut attempts = self.config.max_commit_retries.max(1);
        loop {
            let prepared =
                match self.prepare_purchase(event_id, outcome_id, units, max_price, account_id) {
                    Ok(prepared) => prepared,
                    Err(err) => {
                        self.audit_rejection(event_id, account_id, &err);
                        return Err(err);
                    }
                };

            match self.commit_purchase(prepared) {
                Ok(result) => return Ok(result),
                Err(CommitError::Stale) => {
                    attempts -= 1;
                    if attempts == 0 {
                        return Err(EngineError::TransactionConflict(event_id.clone()));
                    }
                    debug!(event = %event_id, "purchase snapshot went stale, re-preparing");
                }
                Err(CommitError::Rejected(err)) => {
                    self.audit_rejection(event_id, account_id, &err);
                    return Err(err);
                }
            }
        }
    }

    /// Read-only half of a purchase: resolve entities, simulate the price
    /// path, enforce the slippage ceiling and the buyer's balance.
    pub(crate) fn prepare_purchase(
        &self,
        event_id: &EventId,
        outcome_id: &OutcomeId,
        units: u32,
        max_price: Price,
        account_id: &AccountId,
    ) -> Result<PreparedPurchase, EngineError> {
        if units == 0 {
            return Err(EngineError::InvalidQuantity);
        }

        // a missing event reads the same as a closed one to a buyer:
        // the market is not available for trading
        let event = self
            .events
            .get(event_id)
            .ok_or_else(|| EngineError::MarketUnavailable(event_id.clone()))?;
        if !event.is_open(self.current_time) {
            return Err(EngineError::MarketUnavailable(event_id.clone()));
        }

        let outcome = event
            .outcome(outcome_id)
            .ok_or_else(|| EngineError::OutcomeNotFound(outcome_id.clone()))?;

        let account = self
            .accounts
            .get(account_id)
            .ok_or_else(|| EngineError::AccountNotFound(account_id.clone()))?;

        let outcome_units = self.ledger.outcome_units(&outcome.id);
        let event_units = self.ledger.event_units(event_id);
        let outcome_count = event.outcome_count();

        let quote = simulate_purchase(outcome_units, event_units, outcome_count, units);
        let Some(last_price) = quote.last_price() else {
            return Err(EngineError::InvalidQuantity);
        };

        if last_price.value() > max_price.value() + SLIPPAGE_TOLERANCE {
            return Err(EngineError::SlippageExceeded {
                quoted: last_price,
                ceiling: max_price,
            });
        }

        if !account.can_cover(quote.total_cost) {
            return Err(EngineError::InsufficientBalance {
                required: quote.total_cost,
                available: account.balance,
            });
        }

        let post_trade_cost = marginal_price(
            outcome_units + u64::from(units),
            event_units + u64::from(units),
            outcome_count,
        );

        Ok(PreparedPurchase {
            event_id: event_id.clone(),
            outcome_id: outcome_id.clone(),
            account_id: account_id.clone(),
            version: self.ledger.version(event_id),
            quote,
            post_trade_cost,
        })
    }

    /// Mutating half: stamp one share per quoted unit and commit debit,
    /// shares, and display-price refresh as a single unit of work.
    pub(crate) fn commit_purchase(
        &mut self,
        prepared: PreparedPurchase,
    ) -> Result<PurchaseResult, CommitError> {
        let shares: Vec<Share> = prepared
            .quote
            .prices
            .iter()
            .map(|price| {
                Share::new(
                    prepared.event_id.clone(),
                    prepared.outcome_id.clone(),
                    prepared.account_id.clone(),
                    *price,
                    self.current_time,
                )
            })
            .collect();

        let mut uow = UnitOfWork::new(prepared.event_id.clone(), prepared.version);
        uow.push(LedgerInstruction::DebitAccount {
            account_id: prepared.account_id.clone(),
            amount: prepared.quote.total_cost,
        });
        for share in &shares {
            uow.push(LedgerInstruction::CreateShare(share.clone()));
        }
        uow.push(LedgerInstruction::SetOutcomeCost {
            outcome_id: prepared.outcome_id.clone(),
            cost: prepared.post_trade_cost,
        });

        self.apply(uow)?;

        let new_balance = self
            .accounts
            .get(&prepared.account_id)
            .map(|a| a.balance)
            .unwrap_or_else(crate::types::Money::zero);

        let last_price = prepared
            .quote
            .last_price()
            .unwrap_or_else(Price::ceiling);
        info!(
            event = %prepared.event_id,
            outcome = %prepared.outcome_id,
            account = %prepared.account_id,
            units = shares.len(),
            total = %prepared.quote.total_cost,
            "purchase committed"
        );
        self.emit_audit(AuditPayload::SharesPurchased(SharesPurchasedRecord {
            event_id: prepared.event_id,
            outcome_id: prepared.outcome_id,
            account_id: prepared.account_id,
            units: shares.len() as u32,
            total_cost: prepared.quote.total_cost,
            last_price,
            new_balance,
        }));

        Ok(PurchaseResult {
            shares,
            total_cost: prepared.quote.total_cost,
        })
    }

    pub(crate) fn audit_rejection(
        &mut self,
        event_id: &EventId,
        account_id: &AccountId,
        err: &EngineError,
    ) {
        // only live trade rejections are audit-worthy; lookup misses are not
        if matches!(
            err,
            EngineError::SlippageExceeded { .. } | EngineError::InsufficientBalance { .. }
        ) {
            self.emit_audit(AuditPayload::PurchaseRejected(PurchaseRejectedRecord {
                event_id: event_id.clone(),
                account_id: account_id.clone(),
                reason: err.to_string(),
            }));
        }
    }
}

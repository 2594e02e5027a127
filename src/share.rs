//! Immutable share purchase records.

use crate::types::{AccountId, EventId, Money, OutcomeId, Price, ShareId, Timestamp};
use serde::{Deserialize, Serialize};

/// One purchased unit of exposure to an outcome.
///
/// Created only by the transaction executor, one record per unit, each
/// stamped with the exact price charged for that unit. Never mutated or
/// deleted after commit; aggregate demand totals are derived by summing
/// these records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Share {
    pub id: ShareId,
    pub event_id: EventId,
    pub outcome_id: OutcomeId,
    pub account_id: AccountId,
    /// Unit count this record represents. The executor always writes 1;
    /// the field exists so ledger aggregation sums units, not rows.
    pub units: u32,
    pub price_paid: Money,
    pub created_at: Timestamp,
}

impl Share {
    pub fn new(
        event_id: EventId,
        outcome_id: OutcomeId,
        account_id: AccountId,
        price_paid: Price,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: ShareId::generate(),
            event_id,
            outcome_id,
            account_id,
            units: 1,
            price_paid: price_paid.as_money(),
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn share_records_exact_unit_price() {
        let share = Share::new(
            EventId::new("evt"),
            OutcomeId::new("out"),
            AccountId::new("acct"),
            Price::clamped(dec!(0.37)),
            Timestamp::from_millis(42),
        );
        assert_eq!(share.units, 1);
        assert_eq!(share.price_paid.value(), dec!(0.37));
        assert_eq!(share.created_at.as_millis(), 42);
    }
}

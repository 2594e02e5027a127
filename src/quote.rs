// 2.1: the quote engine. simulates buying n units one at a time against a
// snapshot of ledger totals, without touching any state. the same function
// backs read-only price quotes and the pricing step of a real purchase, which
// is what makes quote/execute equivalence hold by construction.

use crate::pricing::marginal_price;
use crate::types::{Money, Price};
use serde::{Deserialize, Serialize};

/// Result of simulating a sequential purchase: one price per unit, in
/// charge order, plus their sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub prices: Vec<Price>,
    pub total_cost: Money,
}

impl PriceQuote {
    /// Price of the final unit, the number a buyer's slippage ceiling is
    /// checked against.
    pub fn last_price(&self) -> Option<Price> {
        self.prices.last().copied()
    }

    pub fn units(&self) -> u32 {
        self.prices.len() as u32
    }
}

/// Simulate purchasing `units` sequential units of one outcome.
///
/// `outcome_units` / `event_units` are the committed totals at quote time;
/// both running totals advance by one per simulated unit. Deterministic:
/// identical inputs always produce an identical quote.
pub fn simulate_purchase(
    outcome_units: u64,
    event_units: u64,
    outcome_count: usize,
    units: u32,
) -> PriceQuote {
    let mut prices = Vec::with_capacity(units as usize);
    let mut total = Money::zero();

    for i in 0..u64::from(units) {
        let price = marginal_price(outcome_units + i, event_units + i, outcome_count);
        total = total.add(price.as_money());
        prices.push(price);
    }

    PriceQuote {
        prices,
        total_cost: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn cold_start_three_units_two_outcomes() {
        // first unit prices at the 1/2 prior, then demand is all on this
        // outcome so the ratio clamps at the ceiling
        let quote = simulate_purchase(0, 0, 2, 3);
        let values: Vec<_> = quote.prices.iter().map(|p| p.value()).collect();
        assert_eq!(values, vec![dec!(0.5), dec!(0.99), dec!(0.99)]);
        assert_eq!(quote.total_cost.value(), dec!(2.48));
        assert_eq!(quote.last_price().unwrap().value(), dec!(0.99));
    }

    #[test]
    fn zero_units_is_an_empty_quote() {
        let quote = simulate_purchase(3, 10, 2, 0);
        assert!(quote.prices.is_empty());
        assert_eq!(quote.total_cost, Money::zero());
        assert_eq!(quote.last_price(), None);
    }

    #[test]
    fn total_is_sum_of_sequence() {
        let quote = simulate_purchase(2, 10, 3, 5);
        let sum: Money = quote.prices.iter().map(|p| p.as_money()).sum();
        assert_eq!(quote.total_cost, sum);
        assert_eq!(quote.units(), 5);
    }

    #[test]
    fn quote_is_deterministic() {
        let a = simulate_purchase(7, 31, 4, 6);
        let b = simulate_purchase(7, 31, 4, 6);
        assert_eq!(a, b);
    }

    #[test]
    fn later_units_never_get_cheaper() {
        let quote = simulate_purchase(1, 9, 3, 20);
        for pair in quote.prices.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }
}

// 2.0: the price model. pure function from cumulative demand to the marginal
// price of the next single unit. everything above (quotes, purchases) is built
// by repeated application of this one function.
//
// the model is a discrete relative-popularity market maker: an outcome's price
// tracks its share of total event demand. before any trading the price is the
// uniform prior 1/k over the event's k outcomes (0.5 if the event has no
// outcomes at all), and every result is clamped into [0.01, 0.99] so no
// outcome ever prices as impossible or certain.

use crate::types::Price;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Marginal price of the next unit of an outcome.
///
/// `outcome_units` is the cumulative committed unit count for the outcome,
/// `event_units` the cumulative count across the whole event, and
/// `outcome_count` the number of outcomes the event was created with.
pub fn marginal_price(outcome_units: u64, event_units: u64, outcome_count: usize) -> Price {
    if event_units == 0 {
        return cold_start_price(outcome_count);
    }
    let ratio = Decimal::from(outcome_units) / Decimal::from(event_units);
    Price::clamped(ratio)
}

/// Uniform prior used before any unit has traded on the event.
pub fn cold_start_price(outcome_count: usize) -> Price {
    if outcome_count == 0 {
        return Price::clamped(dec!(0.5));
    }
    Price::clamped(Decimal::ONE / Decimal::from(outcome_count as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_start_is_uniform_prior() {
        assert_eq!(marginal_price(0, 0, 2).value(), dec!(0.5));
        assert_eq!(marginal_price(0, 0, 4).value(), dec!(0.25));
        // degenerate event with no outcomes
        assert_eq!(marginal_price(0, 0, 0).value(), dec!(0.5));
    }

    #[test]
    fn price_tracks_demand_share() {
        assert_eq!(marginal_price(1, 4, 2).value(), dec!(0.25));
        assert_eq!(marginal_price(3, 4, 2).value(), dec!(0.75));
        assert_eq!(marginal_price(1, 2, 2).value(), dec!(0.5));
    }

    #[test]
    fn dominant_outcome_saturates_at_ceiling() {
        // o == t means all demand is on this outcome; raw ratio 1.0 clamps
        assert_eq!(marginal_price(5, 5, 3), Price::ceiling());
        assert_eq!(marginal_price(1, 1, 2), Price::ceiling());
    }

    #[test]
    fn unloved_outcome_floors() {
        assert_eq!(marginal_price(0, 100, 3), Price::floor());
        assert_eq!(marginal_price(1, 1000, 3), Price::floor());
    }

    #[test]
    fn price_is_monotone_in_outcome_units() {
        let t = 100;
        let mut last = marginal_price(0, t, 2);
        for o in 1..=t {
            let next = marginal_price(o, t, 2);
            assert!(next >= last, "price regressed at o={o}");
            last = next;
        }
        assert_eq!(last, Price::ceiling());
    }
}

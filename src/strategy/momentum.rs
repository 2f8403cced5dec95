use super::Strategy;
use crate::models::{QuoteTick, TradeAction};

/// Two-tick momentum rule operating on one instrument.
///
/// Stages a sell when the last two traded prices both sit at or above the
/// current best ask, and a buy when both sit at or below the current best
/// bid. Entries only; the engine owns exits.
#[derive(Debug, Clone, Default)]
pub struct TwoTickMomentum;

impl Strategy for TwoTickMomentum {
    fn evaluate(&self, history: &[f64], tick: &QuoteTick) -> Option<TradeAction> {
        if history.len() < self.min_history() {
            return None;
        }
        let recent = &history[history.len() - self.min_history()..];

        if recent.iter().all(|price| *price >= tick.ask_price) {
            Some(TradeAction::Sell)
        } else if recent.iter().all(|price| *price <= tick.bid_price) {
            Some(TradeAction::Buy)
        } else {
            None
        }
    }

    fn name(&self) -> &str {
        "two-tick-momentum"
    }

    fn min_history(&self) -> usize {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn tick(bid: f64, ask: f64) -> QuoteTick {
        QuoteTick {
            instrument_id: "rb2410".to_string(),
            bid_price: bid,
            ask_price: ask,
            last_price: bid,
            volume: 1,
            received_at: Local::now(),
        }
    }

    #[test]
    fn test_sell_when_both_prices_at_or_above_ask() {
        let strategy = TwoTickMomentum;

        assert_eq!(
            strategy.evaluate(&[105.0, 106.0], &tick(103.0, 104.0)),
            Some(TradeAction::Sell)
        );
        // Equality counts
        assert_eq!(
            strategy.evaluate(&[104.0, 104.0], &tick(103.0, 104.0)),
            Some(TradeAction::Sell)
        );
    }

    #[test]
    fn test_buy_when_both_prices_at_or_below_bid() {
        let strategy = TwoTickMomentum;

        assert_eq!(
            strategy.evaluate(&[100.0, 101.0], &tick(102.0, 103.0)),
            Some(TradeAction::Buy)
        );
        assert_eq!(
            strategy.evaluate(&[102.0, 102.0], &tick(102.0, 103.0)),
            Some(TradeAction::Buy)
        );
    }

    #[test]
    fn test_no_signal_on_mixed_prices() {
        let strategy = TwoTickMomentum;

        // One price above the ask, one below the bid
        assert_eq!(strategy.evaluate(&[105.0, 100.0], &tick(102.0, 103.0)), None);
        // Both inside the spread
        assert_eq!(
            strategy.evaluate(&[102.5, 102.6], &tick(102.0, 103.0)),
            None
        );
    }

    #[test]
    fn test_no_signal_with_short_history() {
        let strategy = TwoTickMomentum;

        assert_eq!(strategy.evaluate(&[], &tick(102.0, 103.0)), None);
        assert_eq!(strategy.evaluate(&[105.0], &tick(102.0, 103.0)), None);
    }

    #[test]
    fn test_only_latest_two_prices_considered() {
        let strategy = TwoTickMomentum;

        // The older third price would block the signal if it were considered
        assert_eq!(
            strategy.evaluate(&[90.0, 105.0, 106.0], &tick(103.0, 104.0)),
            Some(TradeAction::Sell)
        );
    }
}

//! Physiological stock accumulator.

use serde::{Deserialize, Serialize};

/// A single physiological stock (protein, fat, base weight, ...) that remembers
/// its most recent increment.
///
/// The stock never goes negative: a withdrawal larger than the current amount
/// empties it, and [`TrackingItem::change`] reports the delta actually applied,
/// so `previous() == amount() - change()` always recovers the value held before
/// the last adjustment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingItem {
    amount: f64,
    change: f64,
}

impl TrackingItem {
    /// Create a stock holding `amount` with no recorded change.
    pub fn new(amount: f64) -> Self {
        Self {
            amount: amount.max(0.0),
            change: 0.0,
        }
    }

    /// Current stock.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Signed delta applied by the last adjustment.
    pub fn change(&self) -> f64 {
        self.change
    }

    /// Stock held before the last adjustment.
    pub fn previous(&self) -> f64 {
        self.amount - self.change
    }

    /// Apply `delta`, clamping the stock at zero.
    pub fn adjust(&mut self, delta: f64) {
        if !delta.is_finite() {
            log::warn!("ignored non-finite stock adjustment {delta}");
            return;
        }
        let old = self.amount;
        self.amount = (old + delta).max(0.0);
        self.change = self.amount - old;
    }

    /// Move the stock to `value`, recording the difference as the change.
    pub fn set(&mut self, value: f64) {
        self.adjust(value - self.amount);
    }

    /// Empty the stock, folding the removed amount into the change.
    pub fn reset(&mut self) {
        self.change = -self.amount;
        self.amount = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previous_recovers_value_before_adjustment() {
        let mut item = TrackingItem::new(10.0);
        for delta in [2.5, -4.0, 0.0, 7.25, -1.0] {
            let before = item.amount();
            item.adjust(delta);
            assert_eq!(item.previous(), item.amount() - item.change());
            assert!((item.previous() - before).abs() < 1e-12);
        }
    }

    #[test]
    fn withdrawal_beyond_stock_clamps_to_zero() {
        let mut item = TrackingItem::new(3.0);
        item.adjust(-5.0);
        assert_eq!(item.amount(), 0.0);
        assert_eq!(item.change(), -3.0);
        assert_eq!(item.previous(), 3.0);
    }

    #[test]
    fn large_addition_is_not_capped() {
        let mut item = TrackingItem::new(2.0);
        item.adjust(10.0);
        assert_eq!(item.amount(), 12.0);
        assert_eq!(item.change(), 10.0);
    }

    #[test]
    fn reset_folds_amount_into_change() {
        let mut item = TrackingItem::new(4.0);
        item.adjust(1.0);
        item.reset();
        assert_eq!(item.amount(), 0.0);
        assert_eq!(item.change(), -5.0);
        assert_eq!(item.previous(), 5.0);
    }

    #[test]
    fn set_records_difference() {
        let mut item = TrackingItem::new(1.0);
        item.set(6.0);
        assert_eq!(item.amount(), 6.0);
        assert_eq!(item.change(), 5.0);
    }

    #[test]
    fn non_finite_delta_is_ignored() {
        let mut item = TrackingItem::new(1.0);
        item.adjust(f64::NAN);
        assert_eq!(item.amount(), 1.0);
        assert_eq!(item.change(), 0.0);
    }
}

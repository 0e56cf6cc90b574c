//! Mass-weighted nutrient pools.

use crate::feed::{FeedType, NutrientPacket};
use crate::utils::check_mass;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Material of one feed category held since the last reset.
///
/// `details.amount` is the sum of every amount added (less any amount
/// removed) and each per-unit quality attribute is the mass-weighted mean of
/// the contributions. The protein totals are absolute masses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientPool {
    details: NutrientPacket,
    crude_protein: f64,
    degradable_protein: f64,
}

impl NutrientPool {
    pub fn new(feed_type: FeedType) -> Self {
        Self {
            details: NutrientPacket {
                feed_type,
                ..NutrientPacket::default()
            },
            ..Self::default()
        }
    }

    /// Blended packet describing the pool.
    pub fn details(&self) -> &NutrientPacket {
        &self.details
    }

    pub fn amount(&self) -> f64 {
        self.details.amount
    }

    pub fn feed_type(&self) -> FeedType {
        self.details.feed_type
    }

    /// Crude protein mass (kg).
    pub fn crude_protein(&self) -> f64 {
        self.crude_protein
    }

    /// Rumen degradable crude protein mass (kg).
    pub fn degradable_protein(&self) -> f64 {
        self.degradable_protein
    }

    /// Undegradable crude protein mass (kg).
    pub fn undegradable_protein(&self) -> f64 {
        (self.crude_protein - self.degradable_protein).max(0.0)
    }

    /// Blend `packet` into the pool.
    ///
    /// A zero-mass packet is a no-op. The pool is left untouched when the
    /// packet is invalid or of a different feed category.
    pub fn add(&mut self, packet: &NutrientPacket) -> Result<()> {
        packet.validate().context("invalid packet")?;
        if packet.amount == 0.0 {
            return Ok(());
        }
        if self.details.amount == 0.0 {
            self.details.feed_type = packet.feed_type;
        } else if packet.feed_type != self.details.feed_type {
            bail!(
                "cannot blend {:?} into a {:?} pool",
                packet.feed_type,
                self.details.feed_type
            );
        }

        self.details.blend(packet);
        self.crude_protein += packet.crude_protein();
        self.degradable_protein += packet.degradable_protein();
        Ok(())
    }

    /// Withdraw up to `max_amount`, returning what was taken with the pool's
    /// quality. Protein totals shrink in proportion.
    pub fn remove(&mut self, max_amount: f64) -> Result<NutrientPacket> {
        check_mass(max_amount).context("invalid withdrawal")?;
        let taken = max_amount.min(self.details.amount);
        let packet = self.details.with_amount(taken);
        if taken > 0.0 {
            let remaining = (self.details.amount - taken) / self.details.amount;
            self.details.amount -= taken;
            self.crude_protein *= remaining;
            self.degradable_protein *= remaining;
        }
        Ok(packet)
    }

    /// Scale both protein totals by `factor`.
    pub fn reduce_degradable_protein(&mut self, factor: f64) -> Result<()> {
        check_mass(factor).context("invalid reduction factor")?;
        self.crude_protein *= factor;
        self.degradable_protein *= factor;
        Ok(())
    }

    /// Empty the pool, keeping its category.
    pub fn reset(&mut self) {
        *self = Self::new(self.details.feed_type);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pasture(amount: f64, dmd: f64) -> NutrientPacket {
        NutrientPacket {
            amount,
            dmd,
            fat_percent: 2.0,
            nitrogen_percent: 1.6,
            rdp_percent: 65.0,
            ..NutrientPacket::default()
        }
    }

    #[test]
    fn equal_masses_average_quality() {
        let mut pool = NutrientPool::new(FeedType::PastureTemperate);
        pool.add(&pasture(10.0, 0.6)).unwrap();
        pool.add(&pasture(10.0, 0.8)).unwrap();
        assert!((pool.amount() - 20.0).abs() < 1e-12);
        assert!((pool.details().dmd - 0.7).abs() < 1e-12);
    }

    #[test]
    fn amount_is_conserved() {
        let mut pool = NutrientPool::new(FeedType::PastureTemperate);
        let amounts = [0.3, 12.0, 0.0, 4.7, 1e-3, 250.0];
        for (i, &amount) in amounts.iter().enumerate() {
            pool.add(&pasture(amount, 0.4 + 0.05 * i as f64)).unwrap();
        }
        let sum: f64 = amounts.iter().sum();
        assert!((pool.amount() - sum).abs() < 1e-9);
    }

    #[test]
    fn zero_mass_packet_changes_nothing() {
        let mut pool = NutrientPool::new(FeedType::PastureTemperate);
        pool.add(&pasture(5.0, 0.55)).unwrap();
        let before = pool.clone();
        pool.add(&pasture(0.0, 0.9)).unwrap();
        assert_eq!(pool, before);
    }

    #[test]
    fn protein_totals_are_absolute_masses() {
        let mut pool = NutrientPool::new(FeedType::PastureTemperate);
        let a = pasture(2.0, 0.6);
        let b = pasture(6.0, 0.7);
        pool.add(&a).unwrap();
        pool.add(&b).unwrap();
        let cp = a.crude_protein() + b.crude_protein();
        let dp = a.degradable_protein() + b.degradable_protein();
        assert!((pool.crude_protein() - cp).abs() < 1e-12);
        assert!((pool.degradable_protein() - dp).abs() < 1e-12);

        pool.reduce_degradable_protein(0.5).unwrap();
        assert!((pool.crude_protein() - 0.5 * cp).abs() < 1e-12);
        assert!((pool.degradable_protein() - 0.5 * dp).abs() < 1e-12);
    }

    #[test]
    fn invalid_input_leaves_pool_untouched() {
        let mut pool = NutrientPool::new(FeedType::PastureTemperate);
        pool.add(&pasture(5.0, 0.55)).unwrap();
        let before = pool.clone();

        assert!(pool.add(&pasture(-1.0, 0.5)).is_err());
        let conc = NutrientPacket {
            feed_type: FeedType::Concentrate,
            ..pasture(1.0, 0.8)
        };
        assert!(pool.add(&conc).is_err());
        assert!(pool.reduce_degradable_protein(-0.1).is_err());
        assert_eq!(pool, before);
    }

    #[test]
    fn remove_takes_at_most_available() {
        let mut pool = NutrientPool::new(FeedType::PastureTemperate);
        pool.add(&pasture(8.0, 0.6)).unwrap();
        let cp = pool.crude_protein();

        let taken = pool.remove(6.0).unwrap();
        assert_eq!(taken.amount, 6.0);
        assert!((taken.dmd - 0.6).abs() < 1e-12);
        assert!((pool.amount() - 2.0).abs() < 1e-12);
        assert!((pool.crude_protein() - 0.25 * cp).abs() < 1e-12);

        let rest = pool.remove(10.0).unwrap();
        assert!((rest.amount - 2.0).abs() < 1e-12);
        assert_eq!(pool.amount(), 0.0);
    }

    #[test]
    fn reset_keeps_category() {
        let mut pool = NutrientPool::new(FeedType::HaySilage);
        pool.add(&NutrientPacket {
            feed_type: FeedType::HaySilage,
            ..pasture(3.0, 0.5)
        })
        .unwrap();
        pool.reset();
        assert_eq!(pool.amount(), 0.0);
        assert_eq!(pool.crude_protein(), 0.0);
        assert_eq!(pool.feed_type(), FeedType::HaySilage);
    }
}

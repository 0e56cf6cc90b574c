//! Feed supply seam and the shared pasture.

use crate::config::PastureConfig;
use crate::feed::NutrientPacket;
use crate::pool::NutrientPool;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// How feed reaches an animal.
pub trait FeedSupply {
    /// Offer `packet` (kg DM/day); returns the amount actually eaten.
    fn offer(&mut self, packet: &NutrientPacket) -> Result<f64>;

    /// Graze at most `max_amount` (kg DM/day) from `pool`, returning what was eaten.
    fn graze_from(&mut self, pool: &mut NutrientPool, max_amount: f64) -> Result<NutrientPacket>;
}

/// Standing pasture shared by the herd.
///
/// Grazing withdraws from the pool serially, before any animal partitions
/// its intake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pasture {
    pool: NutrientPool,
    growth: NutrientPacket,
    decay: f64,
}

impl Pasture {
    pub fn new(cfg: &PastureConfig) -> Result<Self> {
        if !cfg.initial.feed_type.is_forage() {
            bail!("pasture must be a forage, not {:?}", cfg.initial.feed_type);
        }
        if cfg.growth.feed_type != cfg.initial.feed_type {
            bail!(
                "pasture growth {:?} differs from pasture {:?}",
                cfg.growth.feed_type,
                cfg.initial.feed_type
            );
        }
        let mut pool = NutrientPool::new(cfg.initial.feed_type);
        pool.add(&cfg.initial).context("failed to add initial pasture")?;
        Ok(Self {
            pool,
            growth: cfg.growth.clone(),
            decay: cfg.decay,
        })
    }

    /// Advance the pasture by `days`: decay the standing biomass, then add new growth.
    pub fn grow(&mut self, days: f64) -> Result<()> {
        let lost = self.pool.amount() * (1.0 - (1.0 - self.decay).powf(days));
        self.pool.remove(lost).context("failed to decay pasture")?;

        let growth = self.growth.with_amount(self.growth.amount * days);
        self.pool.add(&growth).context("failed to add pasture growth")?;
        log::debug!("pasture holds {:.1} kg DM", self.pool.amount());
        Ok(())
    }

    /// Withdraw the whole standing biomass as a daily allowance over `days`.
    ///
    /// Animals graze the returned pool in kg/day; hand what is left back with
    /// [`return_unused`](Self::return_unused).
    pub fn daily_allowance(&mut self, days: f64) -> Result<NutrientPool> {
        let standing = self
            .pool
            .remove(self.pool.amount())
            .context("failed to withdraw standing pasture")?;
        let mut daily = NutrientPool::new(self.pool.feed_type());
        daily
            .add(&standing.with_amount(standing.amount / days))
            .context("failed to build daily allowance")?;
        Ok(daily)
    }

    /// Return an ungrazed daily allowance for the rest of the `days`.
    pub fn return_unused(&mut self, daily: &NutrientPool, days: f64) -> Result<()> {
        let rest = daily.details().with_amount(daily.amount() * days);
        self.pool
            .add(&rest)
            .context("failed to return ungrazed pasture")
    }

    pub fn available(&self) -> f64 {
        self.pool.amount()
    }

    pub fn pool(&self) -> &NutrientPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut NutrientPool {
        &mut self.pool
    }
}

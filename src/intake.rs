//! Per-animal intake ledger.

use crate::feed::{FeedType, NutrientPacket};
use crate::pool::NutrientPool;
use crate::utils::{check_mass, div_or};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Expected and obtained daily intake (kg/day).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IntakeTarget {
    pub expected: f64,
    pub actual: f64,
}

impl IntakeTarget {
    /// Intake still wanted to reach the expectation.
    pub fn shortfall(&self) -> f64 {
        (self.expected - self.actual).max(0.0)
    }

    /// Obtained as a proportion of expected; zero when nothing is expected.
    pub fn proportion_achieved(&self) -> f64 {
        div_or(self.actual, self.expected, 0.0)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Everything an animal consumed during the current time step, per day.
///
/// Solid feed is kept in one pool per category and blended into a single
/// mixture on request. Milk is tracked apart from solids because it converts
/// nitrogen to protein with a different factor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntakeLedger {
    stores: BTreeMap<FeedType, NutrientPool>,
    me_from_feed: f64,
    milk_amount: f64,
    me_from_milk: f64,
    milk_crude_protein: f64,
    pub solids_daily: IntakeTarget,
    pub milk_daily: IntakeTarget,
}

impl IntakeLedger {
    /// Record a packet eaten per day. Milk packets are routed to the milk totals.
    pub fn add_feed(&mut self, packet: &NutrientPacket) -> Result<()> {
        if packet.feed_type == FeedType::Milk {
            return self.add_milk(
                packet.amount,
                packet.me_content(),
                packet.crude_protein_content(),
            );
        }
        packet.validate().context("invalid feed packet")?;
        if packet.amount == 0.0 {
            return Ok(());
        }
        self.stores
            .entry(packet.feed_type)
            .or_insert_with(|| NutrientPool::new(packet.feed_type))
            .add(packet)
            .context("failed to add feed to store")?;
        self.me_from_feed += packet.metabolisable_energy();
        self.solids_daily.actual += packet.amount;
        Ok(())
    }

    /// Record milk drunk per day (kg) with its energy (MJ/kg) and protein (kg/kg) contents.
    pub fn add_milk(&mut self, amount: f64, energy_content: f64, protein_content: f64) -> Result<()> {
        check_mass(amount).context("invalid milk amount")?;
        check_mass(energy_content).context("invalid milk energy content")?;
        check_mass(protein_content).context("invalid milk protein content")?;
        self.milk_amount += amount;
        self.me_from_milk += amount * energy_content;
        self.milk_crude_protein += amount * protein_content;
        self.milk_daily.actual += amount;
        Ok(())
    }

    /// Clear the step's intake. Expectations are kept: they are set before feeding.
    pub fn reset(&mut self) {
        self.stores.clear();
        self.me_from_feed = 0.0;
        self.milk_amount = 0.0;
        self.me_from_milk = 0.0;
        self.milk_crude_protein = 0.0;
        self.solids_daily.actual = 0.0;
        self.milk_daily.actual = 0.0;
    }

    pub fn store(&self, feed_type: FeedType) -> Option<&NutrientPool> {
        self.stores.get(&feed_type)
    }

    pub fn stores(&self) -> impl Iterator<Item = &NutrientPool> {
        self.stores.values()
    }

    pub fn stores_mut(&mut self) -> impl Iterator<Item = &mut NutrientPool> {
        self.stores.values_mut()
    }

    /// All solid feed blended into one packet, labelled with the category
    /// contributing the most mass.
    pub fn combined(&self) -> NutrientPacket {
        let mut mix = NutrientPacket::default();
        let mut major = (FeedType::default(), 0.0);
        for store in self.stores.values() {
            mix.blend(store.details());
            if store.amount() > major.1 {
                major = (store.feed_type(), store.amount());
            }
        }
        mix.feed_type = major.0;
        mix
    }

    /// Solid feed eaten (kg DM/day).
    pub fn solids(&self) -> f64 {
        self.stores.values().map(|s| s.amount()).sum()
    }

    /// Milk drunk (kg/day).
    pub fn milk(&self) -> f64 {
        self.milk_amount
    }

    pub fn dmd(&self) -> f64 {
        self.combined().dmd
    }

    pub fn fat_percent(&self) -> f64 {
        self.combined().fat_percent
    }

    pub fn nitrogen_percent(&self) -> f64 {
        self.combined().nitrogen_percent
    }

    pub fn rdp_percent(&self) -> f64 {
        self.combined().rdp_percent
    }

    pub fn me_from_feed(&self) -> f64 {
        self.me_from_feed
    }

    pub fn me_from_milk(&self) -> f64 {
        self.me_from_milk
    }

    pub fn total_me(&self) -> f64 {
        self.me_from_feed + self.me_from_milk
    }

    /// Mean ME content of the solid feed (M/D, MJ/kg DM).
    pub fn md_solid(&self) -> f64 {
        div_or(self.me_from_feed, self.solids(), 0.0)
    }

    /// Share of ME intake supplied by milk.
    pub fn proportion_milk(&self) -> f64 {
        div_or(self.me_from_milk, self.total_me(), 0.0)
    }

    /// Fermentable ME from solids (MJ/day).
    pub fn fermentable_energy(&self) -> f64 {
        self.stores
            .values()
            .map(|s| s.details().fermentable_energy())
            .sum()
    }

    /// Crude protein from solids (kg/day).
    pub fn feed_crude_protein(&self) -> f64 {
        self.stores.values().map(|s| s.crude_protein()).sum()
    }

    pub fn milk_crude_protein(&self) -> f64 {
        self.milk_crude_protein
    }

    pub fn crude_protein(&self) -> f64 {
        self.feed_crude_protein() + self.milk_crude_protein
    }

    /// Rumen degradable protein from solids (kg/day).
    pub fn degradable_protein(&self) -> f64 {
        self.stores.values().map(|s| s.degradable_protein()).sum()
    }

    /// Undegradable protein from solids (kg/day).
    pub fn undegradable_protein(&self) -> f64 {
        self.stores.values().map(|s| s.undegradable_protein()).sum()
    }

    pub fn proportion_of_potential_obtained(&self) -> f64 {
        let expected = self.solids_daily.expected + self.milk_daily.expected;
        div_or(self.solids_daily.actual + self.milk_daily.actual, expected, 0.0)
    }
}

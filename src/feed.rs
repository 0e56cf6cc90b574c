//! Feed categories and nutrient packets.

use crate::utils::{check_mass, check_percent, check_prob, check_positive};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Crude protein to nitrogen conversion factor for feed.
pub const FEED_PROTEIN_TO_NITROGEN: f64 = 6.25;
/// Crude protein to nitrogen conversion factor for milk.
pub const MILK_PROTEIN_TO_NITROGEN: f64 = 6.38;
/// Proportion of milk gross energy that is metabolisable.
pub const MILK_METABOLISABILITY: f64 = 0.94;
/// Energy content of fat (MJ/kg).
pub const FAT_ENERGY_CONTENT: f64 = 39.3;
/// Energy content of protein (MJ/kg).
pub const PROTEIN_ENERGY_CONTENT: f64 = 23.6;

/// Broad category of a feed, selecting the quality formulas applied to it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedType {
    #[default]
    PastureTemperate,
    PastureTropical,
    HaySilage,
    Concentrate,
    Milk,
}

impl FeedType {
    pub fn is_forage(self) -> bool {
        matches!(
            self,
            FeedType::PastureTemperate | FeedType::PastureTropical | FeedType::HaySilage
        )
    }

    pub fn protein_to_nitrogen(self) -> f64 {
        match self {
            FeedType::Milk => MILK_PROTEIN_TO_NITROGEN,
            _ => FEED_PROTEIN_TO_NITROGEN,
        }
    }
}

/// A quantity of feed and its intrinsic quality.
///
/// Amounts are kg dry matter, energy contents MJ/kg DM, digestibility a
/// proportion and the remaining quality attributes percentages. Every
/// derived metric is a pure function of the stored attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutrientPacket {
    pub feed_type: FeedType,
    pub amount: f64,
    pub gross_energy_content: f64,
    /// Metabolisable energy content; derived from digestibility when absent.
    pub me_content: Option<f64>,
    pub dmd: f64,
    pub fat_percent: f64,
    pub nitrogen_percent: f64,
    /// Rumen degradable protein as a percentage of crude protein.
    pub rdp_percent: f64,
    /// Acid detergent insoluble protein as a percentage of crude protein.
    pub adip_percent: f64,
}

impl Default for NutrientPacket {
    fn default() -> Self {
        Self {
            feed_type: FeedType::default(),
            amount: 0.0,
            gross_energy_content: 18.4,
            me_content: None,
            dmd: 0.0,
            fat_percent: 0.0,
            nitrogen_percent: 0.0,
            rdp_percent: 0.0,
            adip_percent: 0.0,
        }
    }
}

impl NutrientPacket {
    /// Validate amount and quality ranges.
    pub fn validate(&self) -> Result<()> {
        check_mass(self.amount).context("invalid amount")?;
        check_positive(self.gross_energy_content).context("invalid gross energy content")?;
        if let Some(me) = self.me_content {
            check_mass(me).context("invalid metabolisable energy content")?;
        }
        check_prob(self.dmd).context("invalid dry matter digestibility")?;
        check_percent(self.fat_percent).context("invalid fat percent")?;
        check_percent(self.nitrogen_percent).context("invalid nitrogen percent")?;
        check_percent(self.rdp_percent).context("invalid degradable protein percent")?;
        check_percent(self.adip_percent).context("invalid insoluble protein percent")?;
        Ok(())
    }

    /// Copy of this packet holding a different amount.
    pub fn with_amount(&self, amount: f64) -> Self {
        Self {
            amount,
            ..self.clone()
        }
    }

    /// Metabolisable energy content (MJ/kg DM).
    pub fn me_content(&self) -> f64 {
        if let Some(me) = self.me_content {
            return me;
        }
        let dmd = self.dmd * 100.0;
        match self.feed_type {
            FeedType::PastureTemperate | FeedType::PastureTropical | FeedType::HaySilage => {
                (0.172 * dmd - 1.707).max(0.0)
            }
            FeedType::Concentrate => (0.134 * dmd + 0.235 * self.fat_percent + 1.23).max(0.0),
            FeedType::Milk => self.gross_energy_content * MILK_METABOLISABILITY,
        }
    }

    /// Metabolisable energy available to rumen microbes (MJ/kg DM).
    pub fn fme_content(&self) -> f64 {
        match self.feed_type {
            FeedType::Milk => 0.0,
            _ => (self.me_content() - 0.01 * FAT_ENERGY_CONTENT * self.fat_percent).max(0.0),
        }
    }

    /// Crude protein content (kg/kg DM).
    pub fn crude_protein_content(&self) -> f64 {
        self.nitrogen_percent / 100.0 * self.feed_type.protein_to_nitrogen()
    }

    /// Undegradable crude protein content (kg/kg DM).
    pub fn udp_content(&self) -> f64 {
        self.crude_protein_content() * (1.0 - self.rdp_percent / 100.0)
    }

    /// Acid detergent insoluble protein content (kg/kg DM).
    pub fn adip_content(&self) -> f64 {
        self.crude_protein_content() * self.adip_percent / 100.0
    }

    pub fn metabolisable_energy(&self) -> f64 {
        self.me_content() * self.amount
    }

    pub fn fermentable_energy(&self) -> f64 {
        self.fme_content() * self.amount
    }

    /// Crude protein mass (kg).
    pub fn crude_protein(&self) -> f64 {
        self.crude_protein_content() * self.amount
    }

    /// Rumen degradable protein mass (kg).
    pub fn degradable_protein(&self) -> f64 {
        self.crude_protein() * self.rdp_percent / 100.0
    }

    /// Blend `other` into this packet, weighting every per-unit attribute by
    /// mass. The feed category is left untouched.
    pub(crate) fn blend(&mut self, other: &NutrientPacket) {
        if other.amount <= 0.0 {
            return;
        }
        let (m1, m2) = (self.amount, other.amount);
        let mean = |a1: f64, a2: f64| (a1 * m1 + a2 * m2) / (m1 + m2);

        self.gross_energy_content = mean(self.gross_energy_content, other.gross_energy_content);
        self.me_content = Some(mean(self.me_content(), other.me_content()));
        self.dmd = mean(self.dmd, other.dmd);
        self.fat_percent = mean(self.fat_percent, other.fat_percent);
        self.nitrogen_percent = mean(self.nitrogen_percent, other.nitrogen_percent);
        self.rdp_percent = mean(self.rdp_percent, other.rdp_percent);
        self.adip_percent = mean(self.adip_percent, other.adip_percent);
        self.amount = m1 + m2;
    }
}

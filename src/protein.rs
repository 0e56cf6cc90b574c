//! Protein supply and partitioning.
//!
//! Runs alongside the energy cascade once energy has been partitioned. Supply
//! is digestible protein leaving the stomach (DPLS), built from microbial
//! protein, digestible undegradable feed protein and milk protein. Demands are
//! met in the same order as energy. What remains caps tissue gain and can limit
//! milk output.

use crate::feed::{FeedType, NutrientPacket};
use crate::intake::IntakeLedger;
use crate::params::ProteinParams;
use crate::utils::div_or;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Protein required by the non-maintenance demands (kg/day).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProteinDemand {
    pub pregnancy: f64,
    pub lactation: f64,
    pub wool: f64,
}

/// Digestibility of undegradable protein in `packet`.
///
/// Forage: `5.5 CP - 0.178` bounded to 0.05..=0.85. Concentrate:
/// `0.9 (1 - ADIP/UDP)`, zero without undegradable protein and never negative.
/// Milk has none.
pub fn dudp(packet: &NutrientPacket) -> f64 {
    match packet.feed_type {
        FeedType::PastureTemperate | FeedType::PastureTropical | FeedType::HaySilage => {
            (5.5 * packet.crude_protein_content() - 0.178).clamp(0.05, 0.85)
        }
        FeedType::Concentrate => {
            let udp = packet.udp_content();
            if udp > 0.0 {
                (0.9 * (1.0 - packet.adip_content() / udp)).max(0.0)
            } else {
                0.0
            }
        }
        FeedType::Milk => 0.0,
    }
}

/// Rumen degradable protein required by the microbes (kg/day) for a given
/// fermentable ME intake and feeding level.
pub fn rdp_requirement(fermentable_energy: f64, feeding_level: f64, params: &ProteinParams) -> f64 {
    let level = params.rdp_intercept
        + params.rdp_slope * (1.0 - (-params.rdp_exponent * (feeding_level + 1.0)).exp());
    level * fermentable_energy
}

/// Scale each store's protein for faster rumen passage above maintenance.
pub fn reduce_degradability(
    intake: &mut IntakeLedger,
    feeding_level: f64,
    params: &ProteinParams,
) -> Result<()> {
    if feeding_level <= 0.0 {
        return Ok(());
    }
    for store in intake.stores_mut() {
        let reduction = match store.feed_type() {
            FeedType::Milk => continue,
            FeedType::Concentrate => params.degradability_concentrate,
            _ => params.degradability_intercept - params.degradability_slope * store.details().dmd,
        };
        let factor = (1.0 - reduction * feeding_level).max(0.0);
        store
            .reduce_degradable_protein(factor)
            .with_context(|| format!("failed to reduce {:?} degradability", store.feed_type()))?;
    }
    Ok(())
}

/// Working state of the protein cascade for one animal (kg/day).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProteinLedger {
    rdp_required: f64,
    rdp_supplied: f64,
    udp: f64,
    dudp: f64,
    from_microbes: f64,
    from_undegradable: f64,
    from_milk: f64,
    /// Efficiency of DPLS use.
    efficiency: f64,
    endogenous_urinary: f64,
    endogenous_faecal: f64,
    dermal: f64,
    for_pregnancy: f64,
    for_lactation: f64,
    for_wool: f64,
    for_gain: f64,
}

impl ProteinLedger {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Compute DPLS from what the animal ate this step.
    pub fn supply(&mut self, intake: &IntakeLedger, feeding_level: f64, params: &ProteinParams) {
        self.rdp_required =
            rdp_requirement(intake.fermentable_energy(), feeding_level, params).max(0.0);
        self.rdp_supplied = intake.degradable_protein();
        self.udp = intake.undegradable_protein();

        self.from_undegradable = intake
            .stores()
            .map(|s| dudp(s.details()) * s.undegradable_protein())
            .sum();
        self.dudp = div_or(self.from_undegradable, self.udp, 0.0);
        self.from_microbes = params.microbial_dpls * self.rdp_supplied.min(self.rdp_required);
        self.from_milk = params.milk_digestibility * intake.milk_crude_protein();

        let milk_share = div_or(self.from_milk, self.dpls(), 0.0);
        self.efficiency = params.dpls_efficiency
            / (1.0 + (params.dpls_efficiency / params.dpls_efficiency_milk - 1.0) * milk_share);
    }

    /// Endogenous urinary, faecal and dermal losses for an animal of
    /// `live_weight` eating `dry_matter` kg/day.
    pub fn set_maintenance(&mut self, live_weight: f64, dry_matter: f64, params: &ProteinParams) {
        self.endogenous_urinary = if live_weight > 0.0 {
            (params.urinary_factor1 * live_weight.ln() - params.urinary_factor2).max(0.0)
        } else {
            0.0
        };
        self.endogenous_faecal = params.faecal_factor * dry_matter.max(0.0);
        self.dermal = params.dermal_loss * live_weight.max(0.0).powf(0.75);
    }

    pub fn set_demands(&mut self, demand: ProteinDemand) {
        self.for_pregnancy = demand.pregnancy.max(0.0);
        self.for_lactation = demand.lactation.max(0.0);
        self.for_wool = demand.wool.max(0.0);
    }

    /// Replace the milk protein allocation after a shortfall limits yield.
    pub fn revise_lactation(&mut self, for_lactation: f64) {
        self.for_lactation = for_lactation.max(0.0);
    }

    pub fn set_for_gain(&mut self, for_gain: f64) {
        self.for_gain = for_gain;
    }

    pub fn rdp_required(&self) -> f64 {
        self.rdp_required
    }

    pub fn rdp_supplied(&self) -> f64 {
        self.rdp_supplied
    }

    pub fn udp(&self) -> f64 {
        self.udp
    }

    /// Mass-weighted digestibility of undegradable protein eaten.
    pub fn dudp(&self) -> f64 {
        self.dudp
    }

    /// Digestible protein leaving the stomach.
    pub fn dpls(&self) -> f64 {
        self.from_microbes + self.from_undegradable + self.from_milk
    }

    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }

    /// Net protein available before any demand.
    pub fn available(&self) -> f64 {
        self.efficiency * self.dpls()
    }

    pub fn for_maintenance(&self) -> f64 {
        self.endogenous_urinary + self.endogenous_faecal + self.dermal
    }

    pub fn for_pregnancy(&self) -> f64 {
        self.for_pregnancy
    }

    pub fn for_lactation(&self) -> f64 {
        self.for_lactation
    }

    pub fn for_wool(&self) -> f64 {
        self.for_wool
    }

    pub fn for_gain(&self) -> f64 {
        self.for_gain
    }

    pub fn after_maintenance(&self) -> f64 {
        self.available() - self.for_maintenance()
    }

    pub fn after_pregnancy(&self) -> f64 {
        self.after_maintenance() - self.for_pregnancy
    }

    pub fn after_lactation(&self) -> f64 {
        self.after_pregnancy() - self.for_lactation
    }

    /// Protein left for tissue gain; negative when demands exceed supply.
    pub fn after_wool(&self) -> f64 {
        self.after_lactation() - self.for_wool
    }
}

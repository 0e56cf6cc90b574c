//! Metabolisable energy partitioning.
//!
//! An animal's daily ME intake is allocated in a fixed order: maintenance,
//! pregnancy, lactation, fibre and finally tissue gain. The ledger stores the
//! allocation of each stage and derives every remainder on demand, so an
//! `after_*` figure is always the preceding remainder minus that stage's
//! allocation. Remainders may go negative; a deficit is left for the gain
//! stage to meet from body reserves.

use crate::intake::IntakeLedger;
use crate::params::Efficiency;
use crate::protein::ProteinDemand;
use crate::utils::div_or;
use serde::{Deserialize, Serialize};

/// Stages of the cascade, in the order they are completed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnergyStage {
    #[default]
    Intake,
    Maintenance,
    Pregnancy,
    Lactation,
    Fibre,
    Gain,
}

/// Maintenance components (MJ ME/day).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceDemand {
    pub basal: f64,
    /// Heat of product formation and visceral activity this step, before smoothing.
    pub product_formation: f64,
    pub movement: f64,
    pub grazing: f64,
}

/// Energy demand sub-models queried by the cascade, stage by stage.
///
/// Each method sees the ledger as completed so far. Stages an animal does
/// not have default to no demand.
pub trait EnergyDemands {
    fn maintenance(&mut self, ledger: &EnergyLedger) -> MaintenanceDemand;

    fn pregnancy(&mut self, _ledger: &EnergyLedger) -> f64 {
        0.0
    }

    fn lactation(&mut self, _ledger: &EnergyLedger) -> f64 {
        0.0
    }

    fn fibre(&mut self, _ledger: &EnergyLedger) -> f64 {
        0.0
    }

    /// Protein needed by the pregnancy, lactation and fibre allocations granted.
    fn protein(&self) -> ProteinDemand {
        ProteinDemand::default()
    }
}

/// Working state of the energy cascade for one animal (MJ/day).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyLedger {
    stage: EnergyStage,
    from_intake: f64,
    for_basal_metabolism: f64,
    for_product_formation: f64,
    for_product_formation_average: f64,
    to_move: f64,
    to_graze: f64,
    for_fetus: f64,
    for_lactation: f64,
    for_wool: f64,
    net_for_gain: f64,
    /// Efficiency of ME use for maintenance.
    pub km: f64,
    /// Efficiency of ME use for growth, or of tissue use when mobilising.
    pub kg: f64,
    /// Efficiency of ME use for lactation.
    pub kl: f64,
}

impl EnergyLedger {
    /// Zero every allocation for a new step. The product formation running
    /// average and the efficiencies carry over.
    pub fn reset(&mut self) {
        *self = Self {
            for_product_formation_average: self.for_product_formation_average,
            km: self.km,
            kg: self.kg,
            kl: self.kl,
            ..Self::default()
        };
    }

    /// Run the cascade from `intake_me` through the fibre stage.
    pub fn partition<D: EnergyDemands>(&mut self, intake_me: f64, demands: &mut D) {
        self.reset();
        self.from_intake = sanitize(intake_me);

        let maintenance = demands.maintenance(self);
        self.for_basal_metabolism = sanitize(maintenance.basal);
        self.for_product_formation = sanitize(maintenance.product_formation);
        self.to_move = sanitize(maintenance.movement);
        self.to_graze = sanitize(maintenance.grazing);
        self.update_product_formation_average();
        self.stage = EnergyStage::Maintenance;

        self.for_fetus = sanitize(demands.pregnancy(self));
        self.stage = EnergyStage::Pregnancy;

        self.for_lactation = sanitize(demands.lactation(self));
        self.stage = EnergyStage::Lactation;

        self.for_wool = sanitize(demands.fibre(self));
        self.stage = EnergyStage::Fibre;

        log::trace!(
            "energy cascade: intake {:.3} maintenance {:.3} fetus {:.3} lactation {:.3} wool {:.3}",
            self.from_intake,
            self.for_maintenance(),
            self.for_fetus,
            self.for_lactation,
            self.for_wool
        );
    }

    /// Two-step running average damping single-step spikes in product formation heat.
    fn update_product_formation_average(&mut self) {
        self.for_product_formation_average = if self.for_product_formation_average == 0.0 {
            self.for_product_formation
        } else {
            (self.for_product_formation_average + self.for_product_formation) / 2.0
        };
    }

    /// Replace the lactation allocation after a protein shortfall limits milk output.
    pub fn revise_lactation(&mut self, for_lactation: f64) {
        debug_assert!(self.stage < EnergyStage::Gain, "lactation revised after gain");
        self.for_lactation = sanitize(for_lactation);
    }

    /// Record the net energy retained in (or mobilised from) tissue.
    pub fn set_net_for_gain(&mut self, net_for_gain: f64) {
        self.net_for_gain = if net_for_gain.is_finite() {
            net_for_gain
        } else {
            0.0
        };
        self.stage = EnergyStage::Gain;
    }

    /// Set `km` and `kl` from the diet's M/D, blending in milk where drunk.
    pub fn set_efficiencies(&mut self, intake: &IntakeLedger, eff: &Efficiency) {
        let md = intake.md_solid();
        let km_solid = eff.km_intercept + eff.km_slope * md;
        let milk_share = intake.proportion_milk();
        self.km = (milk_share * eff.km_milk + (1.0 - milk_share) * km_solid) * eff.maintenance_scalar;
        self.kl = (eff.kl_intercept + eff.kl_slope * md) * eff.lactation_scalar;
    }

    /// Choose `kg` once the remainder after fibre is known: growth efficiency
    /// for a surplus, tissue mobilisation efficiency for a deficit.
    pub fn select_kg(&mut self, intake: &IntakeLedger, eff: &Efficiency) {
        let surplus = self.after_wool() >= 0.0;
        let kg_solid = if self.for_lactation > 0.0 {
            if surplus { 0.95 * self.kl } else { self.kl / 0.84 }
        } else if surplus {
            eff.kg_intercept + eff.kg_slope * intake.md_solid()
        } else {
            self.km / 0.8
        };
        let milk_share = intake.proportion_milk();
        self.kg = if surplus {
            milk_share * eff.kg_milk + (1.0 - milk_share) * kg_solid
        } else {
            kg_solid
        };
    }

    pub fn stage(&self) -> EnergyStage {
        self.stage
    }

    pub fn from_intake(&self) -> f64 {
        self.from_intake
    }

    pub fn for_basal_metabolism(&self) -> f64 {
        self.for_basal_metabolism
    }

    pub fn for_product_formation(&self) -> f64 {
        self.for_product_formation
    }

    /// Smoothed product formation heat counted in maintenance.
    pub fn for_hp_viscera(&self) -> f64 {
        self.for_product_formation_average
    }

    pub fn to_move(&self) -> f64 {
        self.to_move
    }

    pub fn to_graze(&self) -> f64 {
        self.to_graze
    }

    pub fn for_maintenance(&self) -> f64 {
        self.for_basal_metabolism + self.for_product_formation_average + self.to_move + self.to_graze
    }

    pub fn for_fetus(&self) -> f64 {
        self.for_fetus
    }

    pub fn for_lactation(&self) -> f64 {
        self.for_lactation
    }

    pub fn for_wool(&self) -> f64 {
        self.for_wool
    }

    pub fn net_for_gain(&self) -> f64 {
        self.net_for_gain
    }

    pub fn after_maintenance(&self) -> f64 {
        self.from_intake - self.for_maintenance()
    }

    pub fn after_pregnancy(&self) -> f64 {
        self.after_maintenance() - self.for_fetus
    }

    pub fn after_lactation(&self) -> f64 {
        self.after_pregnancy() - self.for_lactation
    }

    pub fn after_wool(&self) -> f64 {
        self.after_lactation() - self.for_wool
    }

    /// Feeding level relative to maintenance (MEI/MEm - 1), or -1 without a requirement.
    pub fn feeding_level(&self) -> f64 {
        div_or(self.from_intake, self.for_maintenance(), 0.0) - 1.0
    }
}

fn sanitize(demand: f64) -> f64 {
    if demand.is_finite() { demand.max(0.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        maintenance: f64,
        fetus: f64,
        lactation: f64,
        wool: f64,
        seen_after_maintenance: Option<f64>,
    }

    impl Fixed {
        fn new(maintenance: f64, fetus: f64, lactation: f64, wool: f64) -> Self {
            Self {
                maintenance,
                fetus,
                lactation,
                wool,
                seen_after_maintenance: None,
            }
        }
    }

    impl EnergyDemands for Fixed {
        fn maintenance(&mut self, ledger: &EnergyLedger) -> MaintenanceDemand {
            assert_eq!(ledger.stage(), EnergyStage::Intake);
            MaintenanceDemand {
                basal: self.maintenance,
                ..MaintenanceDemand::default()
            }
        }

        fn pregnancy(&mut self, ledger: &EnergyLedger) -> f64 {
            assert_eq!(ledger.stage(), EnergyStage::Maintenance);
            self.seen_after_maintenance = Some(ledger.after_maintenance());
            self.fetus
        }

        fn lactation(&mut self, ledger: &EnergyLedger) -> f64 {
            assert_eq!(ledger.stage(), EnergyStage::Pregnancy);
            self.lactation
        }

        fn fibre(&mut self, ledger: &EnergyLedger) -> f64 {
            assert_eq!(ledger.stage(), EnergyStage::Lactation);
            self.wool
        }
    }

    #[test]
    fn cascade_subtracts_each_stage_in_order() {
        let mut ledger = EnergyLedger::default();
        let mut demands = Fixed::new(40.0, 5.0, 10.0, 2.0);
        ledger.partition(60.0, &mut demands);

        assert_eq!(demands.seen_after_maintenance, Some(20.0));
        assert_eq!(ledger.after_maintenance(), 20.0);
        assert_eq!(ledger.after_pregnancy(), 15.0);
        assert_eq!(ledger.after_lactation(), 5.0);
        assert_eq!(ledger.after_wool(), 3.0);
        assert_eq!(ledger.stage(), EnergyStage::Fibre);
    }

    #[test]
    fn deficits_are_not_clamped() {
        let mut ledger = EnergyLedger::default();
        ledger.partition(30.0, &mut Fixed::new(40.0, 0.0, 5.0, 1.0));
        assert_eq!(ledger.after_wool(), -16.0);
    }

    #[test]
    fn unset_stages_default_to_no_demand() {
        struct MaintenanceOnly;
        impl EnergyDemands for MaintenanceOnly {
            fn maintenance(&mut self, _ledger: &EnergyLedger) -> MaintenanceDemand {
                MaintenanceDemand {
                    basal: 12.0,
                    movement: 1.0,
                    grazing: 2.0,
                    ..MaintenanceDemand::default()
                }
            }
        }
        let mut ledger = EnergyLedger::default();
        ledger.partition(20.0, &mut MaintenanceOnly);
        assert_eq!(ledger.for_maintenance(), 15.0);
        assert_eq!(ledger.after_wool(), ledger.after_maintenance());
    }

    #[test]
    fn revised_lactation_updates_downstream_remainders() {
        let mut ledger = EnergyLedger::default();
        ledger.partition(60.0, &mut Fixed::new(40.0, 5.0, 10.0, 2.0));
        ledger.revise_lactation(4.0);
        assert_eq!(ledger.after_lactation(), 11.0);
        assert_eq!(ledger.after_wool(), 9.0);
    }

    #[test]
    fn product_formation_average_converges_from_cold_start() {
        struct Heat(f64);
        impl EnergyDemands for Heat {
            fn maintenance(&mut self, _ledger: &EnergyLedger) -> MaintenanceDemand {
                MaintenanceDemand {
                    product_formation: self.0,
                    ..MaintenanceDemand::default()
                }
            }
        }

        let mut ledger = EnergyLedger::default();
        let x = 6.0;
        for _ in 0..3 {
            ledger.partition(50.0, &mut Heat(x));
        }
        assert!((ledger.for_hp_viscera() - x).abs() < 1e-12);
        assert_eq!(ledger.for_maintenance(), x);
    }

    #[test]
    fn product_formation_average_damps_spikes() {
        struct Heat(f64);
        impl EnergyDemands for Heat {
            fn maintenance(&mut self, _ledger: &EnergyLedger) -> MaintenanceDemand {
                MaintenanceDemand {
                    product_formation: self.0,
                    ..MaintenanceDemand::default()
                }
            }
        }

        let mut ledger = EnergyLedger::default();
        ledger.partition(50.0, &mut Heat(4.0));
        ledger.partition(50.0, &mut Heat(12.0));
        assert_eq!(ledger.for_hp_viscera(), 8.0);
        assert_eq!(ledger.for_product_formation(), 12.0);
    }

    #[test]
    fn non_finite_demands_count_as_zero() {
        let mut ledger = EnergyLedger::default();
        ledger.partition(10.0, &mut Fixed::new(f64::NAN, -3.0, 0.0, 0.0));
        assert_eq!(ledger.for_maintenance(), 0.0);
        assert_eq!(ledger.after_wool(), 10.0);
        assert_eq!(ledger.feeding_level(), -1.0);
    }

    #[test]
    fn kg_switches_to_mobilisation_in_deficit() {
        let intake = IntakeLedger::default();
        let eff = Efficiency::default();

        let mut ledger = EnergyLedger::default();
        ledger.set_efficiencies(&intake, &eff);
        ledger.partition(10.0, &mut Fixed::new(20.0, 0.0, 0.0, 0.0));
        ledger.select_kg(&intake, &eff);
        assert!(ledger.km > 0.0);
        assert!((ledger.kg - ledger.km / 0.8).abs() < 1e-12);

        ledger.set_efficiencies(&intake, &eff);
        ledger.partition(30.0, &mut Fixed::new(20.0, 0.0, 0.0, 0.0));
        ledger.select_kg(&intake, &eff);
        assert!((ledger.kg - eff.kg_intercept).abs() < 1e-12);
    }

    #[test]
    fn efficiencies_survive_the_cascade() {
        struct SeesKm(f64);
        impl EnergyDemands for SeesKm {
            fn maintenance(&mut self, ledger: &EnergyLedger) -> MaintenanceDemand {
                self.0 = ledger.km;
                MaintenanceDemand {
                    basal: 10.0 / ledger.km,
                    ..MaintenanceDemand::default()
                }
            }
        }

        let mut ledger = EnergyLedger::default();
        ledger.set_efficiencies(&IntakeLedger::default(), &Efficiency::default());
        let (km, kl) = (ledger.km, ledger.kl);
        assert!(km > 0.0 && kl > 0.0);

        let mut demands = SeesKm(0.0);
        ledger.partition(40.0, &mut demands);
        assert_eq!(demands.0, km);
        assert_eq!(ledger.km, km);
        assert_eq!(ledger.kl, kl);
        assert!((ledger.for_basal_metabolism() - 10.0 / km).abs() < 1e-12);
    }
}

//! Growth curve, intake and the standard energy and protein demand sub-models.

use crate::energy::{EnergyDemands, EnergyLedger, MaintenanceDemand};
use crate::feed::PROTEIN_ENERGY_CONTENT;
use crate::params::{BreedParams, GainParams, LactationParams, PregnancyParams};
use crate::protein::ProteinDemand;
use crate::utils::div_or;
use serde::{Deserialize, Serialize};

/// An ongoing pregnancy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PregnancyStatus {
    pub days: f64,
    pub n_fetuses: u32,
}

impl PregnancyStatus {
    /// Proportion of gestation completed, at most one.
    pub fn proportion(&self, params: &PregnancyParams) -> f64 {
        (self.days / params.gestation_days).clamp(0.0, 1.0)
    }
}

/// An ongoing lactation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LactationStatus {
    pub days: f64,
    /// Relative condition when the female gave birth.
    pub rc_at_parturition: f64,
}

pub fn birth_weight(params: &BreedParams, srw: f64) -> f64 {
    params.birth_weight_ratio * srw
}

/// Normalised weight for an animal `age_days` old currently weighing `base`.
///
/// Animals below the curve are pulled toward their own weight so that a
/// setback in growth lowers the expected size.
pub fn normalised_weight_for_age(params: &BreedParams, srw: f64, age_days: f64, base: f64) -> f64 {
    let curve = &params.growth;
    let bw = birth_weight(params, srw);
    let norm_max = srw
        - (srw - bw) * (-curve.age_growth_rate * age_days / srw.powf(curve.srw_growth_scalar)).exp();
    if base < norm_max {
        curve.slow_growth_factor * norm_max + (1.0 - curve.slow_growth_factor) * base
    } else {
        norm_max
    }
}

/// Potential intake of solid feed (kg DM/day).
pub fn potential_intake(
    params: &BreedParams,
    srw: f64,
    relative_size: f64,
    relative_condition: f64,
    lactation: Option<&LactationStatus>,
) -> f64 {
    let p = &params.intake;
    let z = relative_size.clamp(0.0, 1.0);

    let condition_factor = if p.condition_effect > 1.0 && relative_condition > 1.0 {
        (relative_condition * (p.condition_effect - relative_condition) / (p.condition_effect - 1.0))
            .max(0.0)
    } else {
        1.0
    };

    let lactation_factor = match lactation {
        Some(lact) if lact.days > 0.0 => {
            let m = lact.days / p.peak_lactation_day;
            1.0 + p.peak_lactation_level
                * m.powf(p.lactation_curvature)
                * (p.lactation_curvature * (1.0 - m)).exp()
        }
        _ => 1.0,
    };

    (p.scalar * srw * z * (p.relative_size_limit - z) * condition_factor * lactation_factor).max(0.0)
}

/// Milk an unweaned animal `age_days` old will drink (kg/day); none once weaned.
pub fn potential_milk_intake(params: &BreedParams, age_days: f64) -> f64 {
    let p = &params.intake;
    if age_days >= p.weaning_age_days {
        return 0.0;
    }
    let age = age_days.max(0.0);
    params.lactation.milk_energy_content
        * age.powf(0.75)
        * (p.milk_intake_limit1 + p.milk_intake_limit2 * (-p.milk_intake_curve * age).exp())
}

/// Energy (MJ/kg) and protein (kg/kg) content of empty body gain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainComposition {
    pub energy: f64,
    pub protein: f64,
}

pub fn gain_composition(
    params: &GainParams,
    relative_size: f64,
    relative_condition: f64,
    feeding_level: f64,
) -> GainComposition {
    let size_factor = 1.0 / (1.0 + (-params.curvature * (relative_size - params.midpoint)).exp());
    let condition_factor = ((relative_size - params.condition_no_effect)
        / (params.condition_max_effect - params.condition_no_effect))
        .clamp(0.0, 1.0);
    let level = params.energy_level_slope * feeding_level;
    let condition = relative_condition - 1.0;

    let energy = params.energy_intercept
        + level
        + (params.energy_mature - level) * size_factor
        + condition_factor * params.energy_condition_slope * condition;
    let protein = (params.protein_intercept - params.protein_level_slope * level)
        - (params.protein_mature - params.protein_level_slope * level) * size_factor
        - condition_factor * params.protein_condition_slope * condition;

    GainComposition { energy, protein }
}

fn gestation_term(params: &PregnancyParams, proportion: f64, a: f64, b: f64) -> f64 {
    let t = b * (1.0 - proportion);
    (a * b / params.gestation_days) * (t + a * (1.0 - t.exp())).exp()
}

pub fn fetal_weight(params: &PregnancyParams, birth_weight: f64, preg: &PregnancyStatus) -> f64 {
    let p = preg.proportion(params);
    let n = preg.n_fetuses as f64;
    n * birth_weight * (params.fetal_weight1 * (1.0 - (params.fetal_weight2 * (1.0 - p)).exp())).exp()
}

pub fn conceptus_weight(params: &PregnancyParams, birth_weight: f64, preg: &PregnancyStatus) -> f64 {
    let p = preg.proportion(params);
    let term = preg.n_fetuses as f64 * params.conceptus_weight_ratio * birth_weight;
    term * (params.conceptus_weight1 * (1.0 - (params.conceptus_weight2 * (1.0 - p)).exp())).exp()
}

/// ME required for conceptus growth (MJ/day).
pub fn conceptus_energy(params: &PregnancyParams, birth_weight: f64, preg: &PregnancyStatus) -> f64 {
    let term = preg.n_fetuses as f64 * params.conceptus_weight_ratio * birth_weight;
    let rate = gestation_term(
        params,
        preg.proportion(params),
        params.conceptus_energy1,
        params.conceptus_energy2,
    );
    params.conceptus_energy_content * term * rate / params.efficiency
}

/// Protein deposited in the conceptus (kg/day).
pub fn conceptus_protein(params: &PregnancyParams, birth_weight: f64, preg: &PregnancyStatus) -> f64 {
    let term = preg.n_fetuses as f64 * params.conceptus_weight_ratio * birth_weight;
    let rate = gestation_term(
        params,
        preg.proportion(params),
        params.conceptus_protein1,
        params.conceptus_protein2,
    );
    params.conceptus_protein_content * term * rate
}

/// Potential milk energy output (MJ/day) on the lactation curve.
pub fn potential_milk(
    params: &LactationParams,
    srw: f64,
    relative_size: f64,
    lact: &LactationStatus,
) -> f64 {
    if lact.days >= params.lactation_days {
        return 0.0;
    }
    let m = (lact.days + params.offset_day) / params.peak_day;
    (params.peak_yield_scalar
        * srw.powf(0.75)
        * relative_size
        * lact.rc_at_parturition
        * m.powf(params.curve)
        * (params.curve * (1.0 - m)).exp())
    .max(0.0)
}

/// Per-step inputs of the standard demand models.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemandContext {
    pub entire_male: bool,
    pub age_days: f64,
    pub live_weight: f64,
    pub relative_size: f64,
    pub standard_reference_weight: f64,
    /// Dry matter eaten from pasture (kg/day).
    pub pasture_intake: f64,
    pub pasture_dmd: f64,
    pub walking_km: f64,
    /// Share of ME intake supplied by milk.
    pub milk_proportion: f64,
    /// Solid dry matter eaten (kg/day).
    pub solids: f64,
    pub pregnancy: Option<PregnancyStatus>,
    pub lactation: Option<LactationStatus>,
}

/// Energy and protein demands for a ruminant.
#[derive(Debug, Clone)]
pub struct StandardDemands<'a> {
    params: &'a BreedParams,
    ctx: DemandContext,
    protein: ProteinDemand,
    milk_energy: f64,
}

impl<'a> StandardDemands<'a> {
    pub fn new(params: &'a BreedParams, ctx: DemandContext) -> Self {
        Self {
            params,
            ctx,
            protein: ProteinDemand::default(),
            milk_energy: 0.0,
        }
    }

    /// Milk energy produced (MJ/day) at the granted lactation allocation.
    pub fn milk_energy(&self) -> f64 {
        self.milk_energy
    }
}

impl EnergyDemands for StandardDemands<'_> {
    fn maintenance(&mut self, ledger: &EnergyLedger) -> MaintenanceDemand {
        let m = &self.params.metabolism;
        let ctx = &self.ctx;
        let sex_effect = if ctx.entire_male {
            m.male_sex_effect
        } else {
            1.0
        };
        let age_effect = (-m.age_exponent * ctx.age_days).exp().max(m.age_effect_min);
        let basal = m.fasting_heat
            * sex_effect
            * ctx.live_weight.max(0.0).powf(0.75)
            * age_effect
            * (1.0 + m.milk_scalar * ctx.milk_proportion);
        let grazing = m.grazing_cost
            * ctx.live_weight
            * ctx.pasture_intake
            * (0.9 - ctx.pasture_dmd).max(0.0);
        let movement = m.movement_cost * ctx.live_weight * ctx.walking_km;

        MaintenanceDemand {
            basal: div_or(basal, ledger.km, 0.0),
            product_formation: m.viscera_heat * ledger.from_intake(),
            movement: div_or(movement, ledger.km, 0.0),
            grazing: div_or(grazing, ledger.km, 0.0),
        }
    }

    fn pregnancy(&mut self, _ledger: &EnergyLedger) -> f64 {
        let Some(preg) = self.ctx.pregnancy else {
            return 0.0;
        };
        let p = &self.params.pregnancy;
        let bw = birth_weight(self.params, self.params.standard_reference_weight);
        self.protein.pregnancy = conceptus_protein(p, bw, &preg);
        conceptus_energy(p, bw, &preg)
    }

    fn lactation(&mut self, ledger: &EnergyLedger) -> f64 {
        let Some(lact) = self.ctx.lactation else {
            return 0.0;
        };
        let p = &self.params.lactation;
        let max = potential_milk(p, self.ctx.standard_reference_weight, self.ctx.relative_size, &lact);
        if max <= 0.0 {
            return 0.0;
        }
        let ratio = ledger.after_pregnancy() * p.milk_metabolisability * ledger.kl / max;
        let limited =
            p.energy_deficit * max / (1.0 + (-(-p.yield_parameter + p.yield_me_effect * ratio)).exp());
        self.milk_energy = limited.min(max).max(0.0);
        self.protein.lactation = p.milk_protein_content * self.milk_energy / p.milk_energy_content;
        div_or(self.milk_energy, p.milk_metabolisability * ledger.kl, 0.0)
    }

    fn fibre(&mut self, _ledger: &EnergyLedger) -> f64 {
        let Some(fibre) = &self.params.fibre else {
            return 0.0;
        };
        let growth = fibre.coefficient * self.ctx.solids;
        self.protein.wool = growth;
        growth * PROTEIN_ENERGY_CONTENT / fibre.efficiency
    }

    fn protein(&self) -> ProteinDemand {
        self.protein
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::FibreParams;

    #[test]
    fn newborn_sits_at_birth_weight() {
        let params = BreedParams::default();
        let srw = params.standard_reference_weight;
        let bw = birth_weight(&params, srw);
        assert!((normalised_weight_for_age(&params, srw, 0.0, bw) - bw).abs() < 1e-9);
    }

    #[test]
    fn normalised_weight_approaches_srw() {
        let params = BreedParams::default();
        let srw = 450.0;
        let young = normalised_weight_for_age(&params, srw, 365.0, 1000.0);
        let old = normalised_weight_for_age(&params, srw, 3650.0, 1000.0);
        assert!(young < old);
        assert!(old < srw);
        assert!(srw - old < 5.0);
    }

    #[test]
    fn slow_growers_are_pulled_toward_own_weight() {
        let params = BreedParams::default();
        let on_curve = normalised_weight_for_age(&params, 450.0, 730.0, 1000.0);
        let light = normalised_weight_for_age(&params, 450.0, 730.0, 200.0);
        let expected = 0.4 * on_curve + 0.6 * 200.0;
        assert!((light - expected).abs() < 1e-9);
    }

    #[test]
    fn intake_peaks_at_full_size_and_rises_in_lactation() {
        let params = BreedParams::default();
        let dry = potential_intake(&params, 450.0, 1.0, 1.0, None);
        assert!((dry - 0.025 * 450.0 * 0.7).abs() < 1e-9);

        let fat = potential_intake(&params, 450.0, 1.0, 1.2, None);
        assert!(fat < dry);

        let peak = LactationStatus {
            days: 62.0,
            rc_at_parturition: 1.0,
        };
        let lactating = potential_intake(&params, 450.0, 1.0, 1.0, Some(&peak));
        assert!((lactating / dry - 1.416).abs() < 1e-9);
    }

    #[test]
    fn milk_intake_stops_at_weaning() {
        let params = BreedParams::default();
        let calf = potential_milk_intake(&params, 30.0);
        let expected = 3.1 * 30.0f64.powf(0.75) * (0.42 + 0.58 * (-18.0f64).exp());
        assert!((calf - expected).abs() < 1e-9);
        assert!(potential_milk_intake(&params, 90.0) > calf);
        assert_eq!(potential_milk_intake(&params, params.intake.weaning_age_days), 0.0);
    }

    #[test]
    fn gain_is_fatter_in_mature_animals() {
        let params = GainParams::default();
        let young = gain_composition(&params, 0.3, 1.0, 0.5);
        let mature = gain_composition(&params, 1.0, 1.0, 0.5);
        assert!(mature.energy > young.energy);
        assert!(mature.protein < young.protein);
        assert!(mature.protein > 0.0);
    }

    #[test]
    fn conceptus_grows_to_term() {
        let params = PregnancyParams::default();
        let bw = 31.5;
        let early = PregnancyStatus {
            days: 30.0,
            n_fetuses: 1,
        };
        let term = PregnancyStatus {
            days: params.gestation_days,
            n_fetuses: 1,
        };
        assert!(conceptus_weight(&params, bw, &early) < 1.0);
        assert!((conceptus_weight(&params, bw, &term) - params.conceptus_weight_ratio * bw).abs() < 1e-9);
        assert!((fetal_weight(&params, bw, &term) - bw).abs() < 1e-9);
        assert!(conceptus_energy(&params, bw, &term) > conceptus_energy(&params, bw, &early));
        assert!(conceptus_protein(&params, bw, &term) > 0.0);
    }

    #[test]
    fn twins_double_conceptus() {
        let params = PregnancyParams::default();
        let single = PregnancyStatus {
            days: 200.0,
            n_fetuses: 1,
        };
        let twins = PregnancyStatus {
            n_fetuses: 2,
            ..single
        };
        let ratio = conceptus_energy(&params, 30.0, &twins) / conceptus_energy(&params, 30.0, &single);
        assert!((ratio - 2.0).abs() < 1e-12);
    }

    #[test]
    fn milk_curve_peaks_and_ends() {
        let params = LactationParams::default();
        let at = |days| {
            potential_milk(
                &params,
                450.0,
                1.0,
                &LactationStatus {
                    days,
                    rc_at_parturition: 1.0,
                },
            )
        };
        let peak = at(params.peak_day - params.offset_day);
        assert!(peak > at(10.0));
        assert!(peak > at(200.0));
        assert_eq!(at(params.lactation_days), 0.0);
    }

    #[test]
    fn standard_maintenance_scales_with_km() {
        let params = BreedParams::default();
        let ctx = DemandContext {
            age_days: 1500.0,
            live_weight: 400.0,
            relative_size: 1.0,
            standard_reference_weight: 450.0,
            ..DemandContext::default()
        };
        let mut demands = StandardDemands::new(&params, ctx);
        let mut ledger = EnergyLedger::default();
        ledger.km = 0.7;
        let m = demands.maintenance(&ledger);
        ledger.km = 0.35;
        let doubled = demands.maintenance(&ledger);
        assert!((doubled.basal / m.basal - 2.0).abs() < 1e-12);
        assert_eq!(m.grazing, 0.0);
    }

    #[test]
    fn fibre_demand_needs_fibre_params() {
        let ctx = DemandContext {
            solids: 2.0,
            ..DemandContext::default()
        };
        let ledger = EnergyLedger::default();

        let params = BreedParams::default();
        assert_eq!(StandardDemands::new(&params, ctx.clone()).fibre(&ledger), 0.0);

        let params = BreedParams {
            fibre: Some(FibreParams::default()),
            ..BreedParams::default()
        };
        let mut demands = StandardDemands::new(&params, ctx);
        let energy = demands.fibre(&ledger);
        assert!((demands.protein().wool - 0.003).abs() < 1e-12);
        assert!((energy - 0.003 * 23.6 / 0.18).abs() < 1e-12);
    }

    #[test]
    fn lactation_demand_converts_milk_energy_through_kl() {
        let params = BreedParams::default();
        let ctx = DemandContext {
            relative_size: 1.0,
            standard_reference_weight: 450.0,
            lactation: Some(LactationStatus {
                days: 50.0,
                rc_at_parturition: 1.0,
            }),
            ..DemandContext::default()
        };
        let mut demands = StandardDemands::new(&params, ctx);
        let mut ledger = EnergyLedger::default();
        ledger.kl = 0.62;
        let demand = demands.lactation(&ledger);
        let milk = demands.milk_energy();
        assert!(milk > 0.0);
        assert!((demand - milk / (0.94 * 0.62)).abs() < 1e-9);
        let protein = demands.protein().lactation;
        assert!((protein - 0.032 * milk / 3.1).abs() < 1e-12);
    }
}

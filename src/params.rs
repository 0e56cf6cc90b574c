//! Per-breed parameters.
//!
//! One immutable [`BreedParams`] value is deserialised from the `[breed]`
//! table of the configuration, validated once and then shared read-only by
//! every animal of the breed. Field defaults are cattle values.

use crate::conception::ConceptionModel;
use crate::utils::{check_mass, check_num, check_positive, check_prob};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreedParams {
    pub name: String,
    /// Mature base weight of an adult female (kg).
    pub standard_reference_weight: f64,
    /// Standard reference weight multiplier applied to entire males.
    pub male_srw_factor: f64,
    /// Birth weight as a proportion of standard reference weight.
    pub birth_weight_ratio: f64,
    /// Live weight of one adult equivalent (kg).
    pub base_animal_equivalent: f64,
    /// Empty body mass to live weight conversion.
    pub ebm_to_live_weight: f64,

    pub growth: GrowthCurve,
    pub efficiency: Efficiency,
    pub intake: IntakeParams,
    pub metabolism: Metabolism,
    pub protein: ProteinParams,
    pub gain: GainParams,
    pub pregnancy: PregnancyParams,
    pub lactation: LactationParams,
    pub reproduction: ReproductionParams,

    pub fibre: Option<FibreParams>,
    pub conception: Option<ConceptionModel>,
}

impl Default for BreedParams {
    fn default() -> Self {
        Self {
            name: "cattle".to_string(),
            standard_reference_weight: 450.0,
            male_srw_factor: 1.2,
            birth_weight_ratio: 0.07,
            base_animal_equivalent: 450.0,
            ebm_to_live_weight: 1.09,
            growth: GrowthCurve::default(),
            efficiency: Efficiency::default(),
            intake: IntakeParams::default(),
            metabolism: Metabolism::default(),
            protein: ProteinParams::default(),
            gain: GainParams::default(),
            pregnancy: PregnancyParams::default(),
            lactation: LactationParams::default(),
            reproduction: ReproductionParams::default(),
            fibre: None,
            conception: None,
        }
    }
}

/// Normalised weight-for-age curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthCurve {
    pub age_growth_rate: f64,
    pub srw_growth_scalar: f64,
    pub slow_growth_factor: f64,
}

impl Default for GrowthCurve {
    fn default() -> Self {
        Self {
            age_growth_rate: 0.0115,
            srw_growth_scalar: 0.27,
            slow_growth_factor: 0.4,
        }
    }
}

/// Energy use efficiencies as linear functions of M/D, plus breed scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Efficiency {
    pub km_intercept: f64,
    pub km_slope: f64,
    pub kg_intercept: f64,
    pub kg_slope: f64,
    pub kl_intercept: f64,
    pub kl_slope: f64,
    /// Efficiency of using milk energy for maintenance.
    pub km_milk: f64,
    /// Efficiency of using milk energy for growth.
    pub kg_milk: f64,
    pub maintenance_scalar: f64,
    pub growth_scalar: f64,
    pub lactation_scalar: f64,
}

impl Default for Efficiency {
    fn default() -> Self {
        Self {
            km_intercept: 0.5,
            km_slope: 0.02,
            kg_intercept: 0.006,
            kg_slope: 0.042,
            kl_intercept: 0.4,
            kl_slope: 0.02,
            km_milk: 0.85,
            kg_milk: 0.7,
            maintenance_scalar: 1.0,
            growth_scalar: 1.0,
            lactation_scalar: 1.0,
        }
    }
}

/// Potential intake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeParams {
    pub scalar: f64,
    pub relative_size_limit: f64,
    pub condition_effect: f64,
    pub peak_lactation_day: f64,
    pub lactation_curvature: f64,
    pub peak_lactation_level: f64,
    /// Age at which young stop drinking milk.
    pub weaning_age_days: f64,
    pub milk_intake_limit1: f64,
    pub milk_intake_limit2: f64,
    pub milk_intake_curve: f64,
}

impl Default for IntakeParams {
    fn default() -> Self {
        Self {
            scalar: 0.025,
            relative_size_limit: 1.7,
            condition_effect: 1.5,
            peak_lactation_day: 62.0,
            lactation_curvature: 1.7,
            peak_lactation_level: 0.416,
            weaning_age_days: 180.0,
            milk_intake_limit1: 0.42,
            milk_intake_limit2: 0.58,
            milk_intake_curve: 0.6,
        }
    }
}

/// Maintenance energy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metabolism {
    pub viscera_heat: f64,
    pub fasting_heat: f64,
    pub age_exponent: f64,
    pub age_effect_min: f64,
    pub milk_scalar: f64,
    pub male_sex_effect: f64,
    /// Energy cost of grazing (MJ per kg live weight per kg DM eaten).
    pub grazing_cost: f64,
    /// Energy cost of walking (MJ per kg live weight per km).
    pub movement_cost: f64,
}

impl Default for Metabolism {
    fn default() -> Self {
        Self {
            viscera_heat: 0.09,
            fasting_heat: 0.26,
            age_exponent: 0.00008,
            age_effect_min: 0.84,
            milk_scalar: 0.23,
            male_sex_effect: 1.15,
            grazing_cost: 0.0025,
            movement_cost: 0.0026,
        }
    }
}

/// Protein supply and maintenance requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProteinParams {
    pub degradability_intercept: f64,
    pub degradability_slope: f64,
    pub degradability_concentrate: f64,
    pub rdp_intercept: f64,
    pub rdp_slope: f64,
    pub rdp_exponent: f64,
    /// Digestible protein leaving the stomach per kg of microbial protein.
    pub microbial_dpls: f64,
    pub milk_digestibility: f64,
    pub dpls_efficiency: f64,
    pub dpls_efficiency_milk: f64,
    pub urinary_factor1: f64,
    pub urinary_factor2: f64,
    pub faecal_factor: f64,
    pub dermal_loss: f64,
}

impl Default for ProteinParams {
    fn default() -> Self {
        Self {
            degradability_intercept: 0.3,
            degradability_slope: 0.25,
            degradability_concentrate: 0.1,
            rdp_intercept: 0.007,
            rdp_slope: 0.005,
            rdp_exponent: 0.35,
            microbial_dpls: 0.6,
            milk_digestibility: 0.92,
            dpls_efficiency: 0.7,
            dpls_efficiency_milk: 0.8,
            urinary_factor1: 0.0161,
            urinary_factor2: 0.0422,
            faecal_factor: 0.0152,
            dermal_loss: 0.00011,
        }
    }
}

/// Composition of empty body gain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GainParams {
    pub curvature: f64,
    pub midpoint: f64,
    pub condition_no_effect: f64,
    pub condition_max_effect: f64,
    pub energy_intercept: f64,
    pub energy_mature: f64,
    pub energy_level_slope: f64,
    pub energy_condition_slope: f64,
    pub protein_intercept: f64,
    pub protein_mature: f64,
    pub protein_level_slope: f64,
    pub protein_condition_slope: f64,
}

impl Default for GainParams {
    fn default() -> Self {
        Self {
            curvature: 6.0,
            midpoint: 0.4,
            condition_no_effect: 0.9,
            condition_max_effect: 0.97,
            energy_intercept: 6.7,
            energy_mature: 20.3,
            energy_level_slope: 2.0,
            energy_condition_slope: 7.0,
            protein_intercept: 0.212,
            protein_mature: 0.140,
            protein_level_slope: 0.004,
            protein_condition_slope: 0.05,
        }
    }
}

/// Fetal and conceptus growth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PregnancyParams {
    pub gestation_days: f64,
    pub fetal_weight1: f64,
    pub fetal_weight2: f64,
    pub conceptus_weight_ratio: f64,
    pub conceptus_weight1: f64,
    pub conceptus_weight2: f64,
    pub conceptus_energy_content: f64,
    pub conceptus_energy1: f64,
    pub conceptus_energy2: f64,
    pub conceptus_protein_content: f64,
    pub conceptus_protein1: f64,
    pub conceptus_protein2: f64,
    /// Efficiency of ME use for conceptus growth.
    pub efficiency: f64,
}

impl Default for PregnancyParams {
    fn default() -> Self {
        Self {
            gestation_days: 285.0,
            fetal_weight1: 2.2,
            fetal_weight2: 1.77,
            conceptus_weight_ratio: 1.8,
            conceptus_weight1: 2.42,
            conceptus_weight2: 1.16,
            conceptus_energy_content: 4.11,
            conceptus_energy1: 343.5,
            conceptus_energy2: 0.0164,
            conceptus_protein_content: 0.134,
            conceptus_protein1: 6.22,
            conceptus_protein2: 0.747,
            efficiency: 0.13,
        }
    }
}

/// Milk production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LactationParams {
    pub lactation_days: f64,
    pub peak_day: f64,
    pub offset_day: f64,
    pub curve: f64,
    pub peak_yield_scalar: f64,
    pub energy_deficit: f64,
    pub yield_parameter: f64,
    pub yield_me_effect: f64,
    /// Energy content of milk (MJ/kg).
    pub milk_energy_content: f64,
    /// Protein content of milk (kg/kg).
    pub milk_protein_content: f64,
    pub milk_metabolisability: f64,
}

impl Default for LactationParams {
    fn default() -> Self {
        Self {
            lactation_days: 300.0,
            peak_day: 62.0,
            offset_day: 4.0,
            curve: 0.6,
            peak_yield_scalar: 0.375,
            energy_deficit: 1.17,
            yield_parameter: 1.6,
            yield_me_effect: 4.0,
            milk_energy_content: 3.1,
            milk_protein_content: 0.032,
            milk_metabolisability: 0.94,
        }
    }
}

/// Eligibility for mating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReproductionParams {
    pub min_age_first_mating_days: f64,
    pub min_days_birth_to_conception: f64,
}

impl Default for ReproductionParams {
    fn default() -> Self {
        Self {
            min_age_first_mating_days: 730.0,
            min_days_birth_to_conception: 60.0,
        }
    }
}

/// Fibre growth for wool or cashmere breeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FibreParams {
    /// Clean fibre grown per kg DM eaten.
    pub coefficient: f64,
    /// Efficiency of ME use for fibre growth.
    pub efficiency: f64,
}

impl Default for FibreParams {
    fn default() -> Self {
        Self {
            coefficient: 0.0015,
            efficiency: 0.18,
        }
    }
}

impl BreedParams {
    pub fn validate(&self) -> Result<()> {
        check_positive(self.standard_reference_weight)
            .context("invalid standard reference weight")?;
        check_positive(self.male_srw_factor).context("invalid male SRW factor")?;
        check_num(self.birth_weight_ratio, 0.0..1.0).context("invalid birth weight ratio")?;
        check_positive(self.base_animal_equivalent).context("invalid base animal equivalent")?;
        check_positive(self.ebm_to_live_weight).context("invalid EBM conversion")?;

        check_positive(self.growth.age_growth_rate).context("invalid age growth rate")?;
        check_prob(self.growth.slow_growth_factor).context("invalid slow growth factor")?;

        let eff = &self.efficiency;
        for (k, what) in [
            (eff.km_milk, "milk maintenance efficiency"),
            (eff.kg_milk, "milk growth efficiency"),
        ] {
            check_num(k, 0.0..=1.0).with_context(|| format!("invalid {what}"))?;
        }
        for (s, what) in [
            (eff.maintenance_scalar, "maintenance scalar"),
            (eff.growth_scalar, "growth scalar"),
            (eff.lactation_scalar, "lactation scalar"),
        ] {
            check_positive(s).with_context(|| format!("invalid {what}"))?;
        }

        check_positive(self.intake.scalar).context("invalid intake scalar")?;
        check_positive(self.intake.peak_lactation_day).context("invalid peak lactation day")?;
        check_mass(self.intake.weaning_age_days).context("invalid weaning age")?;
        check_positive(self.metabolism.fasting_heat).context("invalid fasting heat")?;
        check_prob(self.metabolism.age_effect_min).context("invalid age effect minimum")?;
        check_positive(self.protein.dpls_efficiency).context("invalid DPLS efficiency")?;
        check_positive(self.protein.dpls_efficiency_milk)
            .context("invalid milk DPLS efficiency")?;
        check_prob(self.protein.milk_digestibility).context("invalid milk digestibility")?;
        check_num(
            self.gain.condition_max_effect,
            self.gain.condition_no_effect..,
        )
        .context("invalid condition effect range")?;

        check_num(self.pregnancy.gestation_days, 1.0..=400.0).context("invalid gestation length")?;
        check_positive(self.pregnancy.efficiency).context("invalid conceptus efficiency")?;
        check_positive(self.lactation.peak_day).context("invalid peak lactation day")?;
        check_positive(self.lactation.milk_energy_content)
            .context("invalid milk energy content")?;
        check_num(self.lactation.lactation_days, 1.0..=730.0)
            .context("invalid lactation length")?;

        if let Some(fibre) = &self.fibre {
            check_positive(fibre.efficiency).context("invalid fibre efficiency")?;
            check_num(fibre.coefficient, 0.0..1.0).context("invalid fibre coefficient")?;
        }
        if let Some(conception) = &self.conception {
            conception.validate().context("invalid conception model")?;
        }
        Ok(())
    }

    /// Standard reference weight for an animal of the given sex.
    pub fn srw_for(&self, entire_male: bool) -> f64 {
        if entire_male {
            self.standard_reference_weight * self.male_srw_factor
        } else {
            self.standard_reference_weight
        }
    }

    /// Conception model, required when conception is evaluated.
    pub fn conception_model(&self) -> Result<&ConceptionModel> {
        self.conception
            .as_ref()
            .with_context(|| format!("no conception model defined for breed {:?}", self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        BreedParams::default().validate().unwrap();
    }

    #[test]
    fn partial_table_keeps_defaults() {
        let params: BreedParams = toml::from_str(
            r#"
name = "Brahman"
standard_reference_weight = 500.0

[efficiency]
growth_scalar = 0.9
"#,
        )
        .unwrap();
        assert_eq!(params.name, "Brahman");
        assert_eq!(params.efficiency.growth_scalar, 0.9);
        assert_eq!(params.efficiency.km_intercept, 0.5);
        assert_eq!(params.pregnancy, PregnancyParams::default());
        params.validate().unwrap();
    }

    #[test]
    fn missing_conception_model_is_reported() {
        let params = BreedParams::default();
        let err = params.conception_model().unwrap_err();
        assert!(err.to_string().contains("no conception model"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let params = BreedParams {
            standard_reference_weight: 0.0,
            ..BreedParams::default()
        };
        assert!(params.validate().is_err());
    }
}

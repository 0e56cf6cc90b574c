//! Individual ruminant: intake, partitioning, growth and reproduction.

use crate::energy::{EnergyDemands, EnergyLedger};
use crate::feed::{FAT_ENERGY_CONTENT, FeedType, NutrientPacket, PROTEIN_ENERGY_CONTENT};
use crate::intake::IntakeLedger;
use crate::params::BreedParams;
use crate::physiology::{
    DemandContext, LactationStatus, PregnancyStatus, birth_weight, conceptus_weight, fetal_weight,
    gain_composition, normalised_weight_for_age, potential_intake, potential_milk_intake,
};
use crate::pool::NutrientPool;
use crate::protein::{ProteinLedger, reduce_degradability};
use crate::supply::FeedSupply;
use crate::utils::{check_mass, check_num, check_positive, div_or};
use crate::weight::WeightState;
use anyhow::{Context, Result};
use rand::Rng;
use rand_distr::{Bernoulli, Distribution};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Female,
    Male,
    Castrate,
}

/// Reproductive state of a female.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reproduction {
    pub pregnancy: Option<PregnancyStatus>,
    pub lactation: Option<LactationStatus>,
    pub births: u32,
    pub days_since_birth: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifeEvent {
    Conceived,
    Birth { offspring: u32 },
    LactationEnded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ruminant {
    id: usize,
    sex: Sex,
    age_days: f64,
    pub intake: IntakeLedger,
    pub energy: EnergyLedger,
    pub protein: ProteinLedger,
    pub weight: WeightState,
    reproduction: Reproduction,
    /// Milk produced (kg/day) during the last step.
    milk_produced: f64,
}

impl Ruminant {
    /// Create an animal on its breed's growth curve at `relative_condition`.
    pub fn new(
        id: usize,
        sex: Sex,
        age_days: f64,
        relative_condition: f64,
        params: &BreedParams,
    ) -> Result<Self> {
        check_mass(age_days).context("invalid age")?;
        check_positive(relative_condition).context("invalid relative condition")?;

        let srw = params.srw_for(sex == Sex::Male);
        let norm = normalised_weight_for_age(params, srw, age_days, f64::INFINITY);
        let base = relative_condition * norm;

        let mut weight = WeightState::new(
            base,
            relative_condition,
            params.ebm_to_live_weight,
            params.base_animal_equivalent,
        );
        weight.set_standard_reference_weight(srw);
        weight.set_normal_weight_for_age(norm);

        Ok(Self {
            id,
            sex,
            age_days,
            intake: IntakeLedger::default(),
            energy: EnergyLedger::default(),
            protein: ProteinLedger::default(),
            weight,
            reproduction: Reproduction::default(),
            milk_produced: 0.0,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn age_days(&self) -> f64 {
        self.age_days
    }

    pub fn reproduction(&self) -> &Reproduction {
        &self.reproduction
    }

    pub fn is_pregnant(&self) -> bool {
        self.reproduction.pregnancy.is_some()
    }

    pub fn is_lactating(&self) -> bool {
        self.reproduction.lactation.is_some()
    }

    pub fn milk_produced(&self) -> f64 {
        self.milk_produced
    }

    /// Set the growth curve and intake targets for a new step and clear last step's intake.
    pub fn begin_step(&mut self, params: &BreedParams) {
        self.intake.reset();

        let srw = params.srw_for(self.sex == Sex::Male);
        self.weight.set_standard_reference_weight(srw);
        let norm = normalised_weight_for_age(params, srw, self.age_days, self.weight.base.amount());
        self.weight.set_normal_weight_for_age(norm);

        self.intake.solids_daily.expected = potential_intake(
            params,
            srw,
            self.weight.relative_size(),
            self.weight.relative_condition(),
            self.reproduction.lactation.as_ref(),
        );
        self.intake.milk_daily.expected = potential_milk_intake(params, self.age_days);
    }

    /// Inputs of the standard demand models for this step's intake.
    pub fn demand_context(&self, walking_km: f64) -> DemandContext {
        let mut grazed = NutrientPacket::default();
        for store in self.intake.stores() {
            if matches!(
                store.feed_type(),
                FeedType::PastureTemperate | FeedType::PastureTropical
            ) {
                grazed.blend(store.details());
            }
        }
        DemandContext {
            entire_male: self.sex == Sex::Male,
            age_days: self.age_days,
            live_weight: self.weight.live(),
            relative_size: self.weight.relative_size(),
            standard_reference_weight: self.weight.standard_reference_weight(),
            pasture_intake: grazed.amount,
            pasture_dmd: grazed.dmd,
            walking_km: if grazed.amount > 0.0 { walking_km } else { 0.0 },
            milk_proportion: self.intake.proportion_milk(),
            solids: self.intake.solids(),
            pregnancy: self.reproduction.pregnancy,
            lactation: self.reproduction.lactation,
        }
    }

    /// Partition this step's intake and grow for `days`.
    ///
    /// Energy runs first, then protein, which may limit milk output and caps
    /// the energy retained as tissue.
    pub fn partition<D: EnergyDemands>(
        &mut self,
        params: &BreedParams,
        demands: &mut D,
        days: f64,
    ) -> Result<()> {
        let Self {
            intake,
            energy,
            protein,
            weight,
            ..
        } = self;

        energy.set_efficiencies(intake, &params.efficiency);
        energy.partition(intake.total_me(), demands);
        let level = energy.feeding_level();

        reduce_degradability(intake, level, &params.protein)
            .context("failed to reduce protein degradability")?;
        protein.reset();
        protein.supply(intake, level, &params.protein);
        protein.set_maintenance(weight.live(), intake.solids(), &params.protein);
        protein.set_demands(demands.protein());

        let milk_protein = protein.for_lactation();
        if milk_protein > 0.0 && protein.after_wool() < 0.0 {
            let scale = (1.0 + protein.after_wool() / milk_protein).max(0.0);
            log::debug!("milk limited by protein to {:.1}% of potential", 100.0 * scale);
            energy.revise_lactation(energy.for_lactation() * scale);
            protein.revise_lactation(milk_protein * scale);
        }
        energy.select_kg(intake, &params.efficiency);

        let comp = gain_composition(
            &params.gain,
            weight.relative_size(),
            weight.relative_condition(),
            level,
        );
        let mut net_for_gain = energy.kg * energy.after_wool();
        if net_for_gain > 0.0 {
            net_for_gain *= params.efficiency.growth_scalar;
            if comp.protein > 0.0 {
                let protein_limit = comp.energy * protein.after_wool().max(0.0) / comp.protein;
                net_for_gain = net_for_gain.min(protein_limit);
            }
        }
        energy.set_net_for_gain(net_for_gain);

        let ebm_gain = if comp.energy > 0.0 {
            energy.net_for_gain() / comp.energy
        } else {
            0.0
        };
        let protein_gain = ebm_gain * comp.protein;
        let fat_gain =
            (energy.net_for_gain() - protein_gain * PROTEIN_ENERGY_CONTENT) / FAT_ENERGY_CONTENT;
        protein.set_for_gain(protein_gain);

        weight.adjust_tissue(protein_gain * days, fat_gain * days);
        weight.wool.adjust(protein.for_wool() * days);
        weight.adjust_by_ebm_change(ebm_gain * days);

        let lact = &params.lactation;
        self.milk_produced = div_or(
            self.energy.for_lactation() * lact.milk_metabolisability * self.energy.kl,
            lact.milk_energy_content,
            0.0,
        );
        Ok(())
    }

    /// Whether a female may conceive this step.
    pub fn is_ready_to_mate(&self, params: &BreedParams) -> bool {
        let repro = &self.reproduction;
        let rested = repro
            .days_since_birth
            .is_none_or(|days| days >= params.reproduction.min_days_birth_to_conception);
        self.sex == Sex::Female
            && repro.pregnancy.is_none()
            && self.age_days >= params.reproduction.min_age_first_mating_days
            && rested
    }

    /// Age the animal by `days`, advancing pregnancy and lactation and giving
    /// a ready female the chance to conceive.
    pub fn advance<R: Rng>(
        &mut self,
        params: &BreedParams,
        days: f64,
        rng: &mut R,
    ) -> Result<Vec<LifeEvent>> {
        check_num(days, 0.0..=366.0).context("invalid step length")?;
        let mut events = Vec::new();
        self.age_days += days;

        let repro = &mut self.reproduction;
        if let Some(days_since_birth) = &mut repro.days_since_birth {
            *days_since_birth += days;
        }
        if let Some(lact) = &mut repro.lactation {
            lact.days += days;
            if lact.days >= params.lactation.lactation_days {
                repro.lactation = None;
                events.push(LifeEvent::LactationEnded);
            }
        }

        if let Some(mut preg) = repro.pregnancy {
            preg.days += days;
            let bw = birth_weight(params, params.standard_reference_weight);
            if preg.days >= params.pregnancy.gestation_days {
                repro.pregnancy = None;
                repro.births += 1;
                repro.days_since_birth = Some(preg.days - params.pregnancy.gestation_days);
                repro.lactation = Some(LactationStatus {
                    days: 0.0,
                    rc_at_parturition: self.weight.relative_condition(),
                });
                self.weight.conceptus.reset();
                self.weight.fetus.reset();
                events.push(LifeEvent::Birth {
                    offspring: preg.n_fetuses,
                });
            } else {
                repro.pregnancy = Some(preg);
                self.weight
                    .conceptus
                    .set(conceptus_weight(&params.pregnancy, bw, &preg));
                self.weight
                    .fetus
                    .set(fetal_weight(&params.pregnancy, bw, &preg));
            }
        } else if self.is_ready_to_mate(params) {
            let rate = params
                .conception_model()?
                .rate(self.weight.relative_condition());
            let dist = Bernoulli::new(rate).context("invalid conception rate")?;
            if dist.sample(rng) {
                self.reproduction.pregnancy = Some(PregnancyStatus {
                    days: 0.0,
                    n_fetuses: 1,
                });
                events.push(LifeEvent::Conceived);
            }
        }

        self.weight.update_live_weight();
        Ok(events)
    }
}

impl FeedSupply for Ruminant {
    fn offer(&mut self, packet: &NutrientPacket) -> Result<f64> {
        packet.validate().context("invalid offered packet")?;
        let wanted = if packet.feed_type == FeedType::Milk {
            self.intake.milk_daily.shortfall()
        } else {
            self.intake.solids_daily.shortfall()
        };
        let eaten = packet.amount.min(wanted);
        self.intake
            .add_feed(&packet.with_amount(eaten))
            .context("failed to eat offered feed")?;
        Ok(eaten)
    }

    fn graze_from(&mut self, pool: &mut NutrientPool, max_amount: f64) -> Result<NutrientPacket> {
        check_mass(max_amount).context("invalid grazing limit")?;
        let wanted = max_amount.min(self.intake.solids_daily.shortfall());
        let packet = pool.remove(wanted).context("failed to graze pool")?;
        self.intake
            .add_feed(&packet)
            .context("failed to eat grazed feed")?;
        Ok(packet)
    }
}

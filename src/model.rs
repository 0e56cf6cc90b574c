use crate::animal::{Ruminant, Sex};
use crate::supply::Pasture;
use serde::{Deserialize, Serialize};

/// Mutable simulation state carried between steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub step: u64,
    pub herd: Vec<Ruminant>,
    pub pasture: Pasture,
    /// Births since the start of the run.
    pub births: u32,
    /// Conceptions since the start of the run.
    pub conceptions: u32,
}

/// Read-only view of one step written to a trajectory file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub step: u64,
    pub day: f64,
    pub pasture_available: f64,
    pub pasture_dmd: f64,
    pub births: u32,
    pub conceptions: u32,
    pub animals: Vec<AnimalSnapshot>,
}

impl Record {
    pub fn new(state: &State, days_per_step: u32) -> Self {
        Self {
            step: state.step,
            day: state.step as f64 * days_per_step as f64,
            pasture_available: state.pasture.available(),
            pasture_dmd: state.pasture.pool().details().dmd,
            births: state.births,
            conceptions: state.conceptions,
            animals: state.herd.iter().map(AnimalSnapshot::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalSnapshot {
    pub id: usize,
    pub sex: Sex,
    pub age_days: f64,
    pub pregnant: bool,
    pub lactating: bool,
    /// Milk produced (kg/day).
    pub milk: f64,
    pub intake: IntakeSnapshot,
    pub energy: EnergySnapshot,
    pub weight: WeightSnapshot,
}

/// Daily intake totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeSnapshot {
    pub solids: f64,
    pub milk: f64,
    pub me_from_feed: f64,
    pub me_from_milk: f64,
    pub dmd: f64,
    pub crude_protein: f64,
    pub proportion_achieved: f64,
}

/// Daily energy cascade (MJ/day).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergySnapshot {
    pub from_intake: f64,
    pub for_maintenance: f64,
    pub for_fetus: f64,
    pub for_lactation: f64,
    pub for_wool: f64,
    pub after_wool: f64,
    pub net_for_gain: f64,
    pub km: f64,
    pub kg: f64,
    pub kl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSnapshot {
    pub live: f64,
    pub base: f64,
    pub base_change: f64,
    pub protein: f64,
    pub fat: f64,
    pub conceptus: f64,
    pub wool: f64,
    pub relative_condition: f64,
    pub relative_size: f64,
    pub adult_equivalent: f64,
    pub proportion_of_high_weight: f64,
}

impl From<&Ruminant> for AnimalSnapshot {
    fn from(animal: &Ruminant) -> Self {
        let intake = &animal.intake;
        let energy = &animal.energy;
        let weight = &animal.weight;
        Self {
            id: animal.id(),
            sex: animal.sex(),
            age_days: animal.age_days(),
            pregnant: animal.is_pregnant(),
            lactating: animal.is_lactating(),
            milk: animal.milk_produced(),
            intake: IntakeSnapshot {
                solids: intake.solids(),
                milk: intake.milk(),
                me_from_feed: intake.me_from_feed(),
                me_from_milk: intake.me_from_milk(),
                dmd: intake.dmd(),
                crude_protein: intake.crude_protein(),
                proportion_achieved: intake.solids_daily.proportion_achieved(),
            },
            energy: EnergySnapshot {
                from_intake: energy.from_intake(),
                for_maintenance: energy.for_maintenance(),
                for_fetus: energy.for_fetus(),
                for_lactation: energy.for_lactation(),
                for_wool: energy.for_wool(),
                after_wool: energy.after_wool(),
                net_for_gain: energy.net_for_gain(),
                km: energy.km,
                kg: energy.kg,
                kl: energy.kl,
            },
            weight: WeightSnapshot {
                live: weight.live(),
                base: weight.base.amount(),
                base_change: weight.base.change(),
                protein: weight.protein.amount(),
                fat: weight.fat.amount(),
                conceptus: weight.conceptus.amount(),
                wool: weight.wool.amount(),
                relative_condition: weight.relative_condition(),
                relative_size: weight.relative_size(),
                adult_equivalent: weight.adult_equivalent(),
                proportion_of_high_weight: weight.proportion_of_high_weight(),
            },
        }
    }
}

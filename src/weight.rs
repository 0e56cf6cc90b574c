//! Body weight components and derived size metrics.

use crate::tracking::TrackingItem;
use crate::utils::div_or;
use serde::{Deserialize, Serialize};

/// Protein share of empty body mass assumed when an animal is created.
const INITIAL_PROTEIN_SHARE: f64 = 0.18;
/// Fat share of empty body mass, at relative condition one, assumed when an
/// animal is created.
const INITIAL_FAT_SHARE: f64 = 0.15;

/// Component body-mass stocks of one animal (kg).
///
/// `live = base + conceptus + wool`. The growth curve must call
/// [`set_standard_reference_weight`](Self::set_standard_reference_weight) and
/// [`set_normal_weight_for_age`](Self::set_normal_weight_for_age) each step
/// before the relative metrics are read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightState {
    pub base: TrackingItem,
    pub protein: TrackingItem,
    pub fat: TrackingItem,
    pub conceptus: TrackingItem,
    pub fetus: TrackingItem,
    pub wool: TrackingItem,
    live: f64,
    highest_attained: f64,
    highest_base_attained: f64,
    normalised_for_age: f64,
    standard_reference_weight: f64,
    adult_equivalent: f64,
    ebm_to_live_weight: f64,
    base_animal_equivalent: f64,
}

impl WeightState {
    pub fn new(
        base: f64,
        relative_condition: f64,
        ebm_to_live_weight: f64,
        base_animal_equivalent: f64,
    ) -> Self {
        let ebm = div_or(base, ebm_to_live_weight, 0.0);
        let mut state = Self {
            base: TrackingItem::new(base),
            protein: TrackingItem::new(INITIAL_PROTEIN_SHARE * ebm),
            fat: TrackingItem::new(INITIAL_FAT_SHARE * relative_condition.max(0.0) * ebm),
            conceptus: TrackingItem::default(),
            fetus: TrackingItem::default(),
            wool: TrackingItem::default(),
            live: 0.0,
            highest_attained: 0.0,
            highest_base_attained: 0.0,
            normalised_for_age: 0.0,
            standard_reference_weight: 0.0,
            adult_equivalent: 0.0,
            ebm_to_live_weight,
            base_animal_equivalent,
        };
        state.update_live_weight();
        state
    }

    /// Apply a change in empty body mass, converted to base live weight.
    pub fn adjust_by_ebm_change(&mut self, ebm_change: f64) {
        self.adjust_by_live_weight_change(ebm_change * self.ebm_to_live_weight);
    }

    /// Apply a change in base live weight directly.
    pub fn adjust_by_live_weight_change(&mut self, change: f64) {
        self.base.adjust(change);
        self.update_live_weight();
    }

    /// Record protein and fat deposited (positive) or mobilised (negative).
    pub fn adjust_tissue(&mut self, protein_change: f64, fat_change: f64) {
        self.protein.adjust(protein_change);
        self.fat.adjust(fat_change);
    }

    /// Recompute live weight and the values derived from it.
    pub fn update_live_weight(&mut self) {
        self.live = self.base.amount() + self.conceptus.amount() + self.wool.amount();
        self.highest_attained = self.highest_attained.max(self.live);
        self.highest_base_attained = self.highest_base_attained.max(self.base.amount());
        self.adult_equivalent = div_or(self.live, self.base_animal_equivalent, 0.0).powf(0.75);
    }

    /// Normalised weight for age never decreases.
    pub fn set_normal_weight_for_age(&mut self, weight: f64) {
        if weight.is_finite() {
            self.normalised_for_age = self.normalised_for_age.max(weight);
        }
    }

    pub fn set_standard_reference_weight(&mut self, weight: f64) {
        self.standard_reference_weight = weight;
    }

    pub fn live(&self) -> f64 {
        self.live
    }

    pub fn highest_attained(&self) -> f64 {
        self.highest_attained
    }

    pub fn highest_base_attained(&self) -> f64 {
        self.highest_base_attained
    }

    pub fn normalised_for_age(&self) -> f64 {
        self.normalised_for_age
    }

    pub fn standard_reference_weight(&self) -> f64 {
        self.standard_reference_weight
    }

    pub fn adult_equivalent(&self) -> f64 {
        self.adult_equivalent
    }

    /// Empty body mass.
    pub fn empty_body_mass(&self) -> f64 {
        div_or(self.base.amount(), self.ebm_to_live_weight, 0.0)
    }

    /// Base weight over normalised weight for age; one before the growth curve is set.
    pub fn relative_condition(&self) -> f64 {
        div_or(self.base.amount(), self.normalised_for_age, 1.0)
    }

    /// Normalised weight for age over standard reference weight.
    pub fn relative_size(&self) -> f64 {
        div_or(self.normalised_for_age, self.standard_reference_weight, 0.0)
    }

    pub fn proportion_of_high_weight(&self) -> f64 {
        div_or(self.live, self.highest_attained, 1.0)
    }
}

use crate::feed::NutrientPacket;
use crate::params::BreedParams;
use crate::utils::{check_num, check_prob};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Length of one time step (days).
    pub days_per_step: u32,
    /// Seed for the random number generator; drawn from the OS when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub breed: BreedParams,
    pub pasture: PastureConfig,
    /// Packets offered to every animal, amounts per head per day.
    #[serde(default)]
    pub supplements: Vec<NutrientPacket>,

    pub init: InitConfig,
    pub output: OutputConfig,
}

/// Standing pasture shared by the herd.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PastureConfig {
    /// Biomass and quality at the start of the run (kg DM).
    pub initial: NutrientPacket,
    /// Daily growth (kg DM/day) and its quality.
    pub growth: NutrientPacket,
    /// Proportion of standing biomass lost per day.
    pub decay: f64,
    /// Distance walked while grazing (km/day).
    #[serde(default)]
    pub walking_km: f64,
}

/// Initial herd.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct InitConfig {
    pub n_animals: usize,
    /// Probability that an animal is female.
    pub prob_female: f64,
    pub min_age_days: f64,
    pub max_age_days: f64,
    /// Relative condition of every animal at the start.
    pub relative_condition: f64,
}

/// Output frequency.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Number of steps between saved records.
    pub steps_per_save: usize,
    /// Number of records written per trajectory file.
    pub saves_per_file: usize,
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded.
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_num(self.days_per_step, 1..=92).context("invalid number of days per step")?;

        self.breed.validate().context("invalid breed parameters")?;

        self.pasture
            .initial
            .validate()
            .context("invalid initial pasture")?;
        self.pasture
            .growth
            .validate()
            .context("invalid pasture growth")?;
        check_prob(self.pasture.decay).context("invalid pasture decay")?;
        check_num(self.pasture.walking_km, 0.0..100.0).context("invalid walking distance")?;
        for (i, packet) in self.supplements.iter().enumerate() {
            packet
                .validate()
                .with_context(|| format!("invalid supplement {i}"))?;
        }

        let init = &self.init;
        check_num(init.n_animals, 1..100_000).context("invalid initial number of animals")?;
        check_prob(init.prob_female).context("invalid probability of female")?;
        check_num(init.min_age_days, 0.0..36_500.0).context("invalid minimum age")?;
        check_num(init.max_age_days, init.min_age_days..=36_500.0).context("invalid maximum age")?;
        check_num(init.relative_condition, 0.1..2.0).context("invalid relative condition")?;

        check_num(self.output.steps_per_save, 1..10_000)
            .context("invalid number of steps per save")?;
        check_num(self.output.saves_per_file, 1..10_000)
            .context("invalid number of saves per file")?;

        Ok(())
    }
}

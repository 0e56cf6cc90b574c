use crate::animal::{LifeEvent, Ruminant, Sex};
use crate::config::Config;
use crate::model::{Record, State};
use crate::physiology::StandardDemands;
use crate::supply::{FeedSupply, Pasture};
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::{Bernoulli, Uniform};
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Simulation engine.
///
/// Holds the configuration, current state, and random number generator,
/// and provides methods to initialize, run, save, and load simulations.
#[derive(Debug, Serialize, Deserialize)]
pub struct Engine {
    cfg: Config,
    state: State,
    rng: ChaCha12Rng,
}

impl Engine {
    /// Create a new `Engine` with the given configuration and a random initial herd.
    pub fn generate_initial_condition(cfg: Config) -> Result<Self> {
        let mut rng = match cfg.seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::try_from_os_rng()?,
        };

        let female_dist =
            Bernoulli::new(cfg.init.prob_female).context("invalid probability of female")?;
        let age_dist = Uniform::new_inclusive(cfg.init.min_age_days, cfg.init.max_age_days)
            .context("invalid initial age range")?;

        let mut herd = Vec::with_capacity(cfg.init.n_animals);
        for id in 0..cfg.init.n_animals {
            let sex = if female_dist.sample(&mut rng) {
                Sex::Female
            } else {
                Sex::Male
            };
            let age = age_dist.sample(&mut rng);
            let animal = Ruminant::new(id, sex, age, cfg.init.relative_condition, &cfg.breed)
                .with_context(|| format!("failed to create animal {id}"))?;
            herd.push(animal);
        }

        let pasture = Pasture::new(&cfg.pasture).context("failed to create pasture")?;

        let state = State {
            step: 0,
            herd,
            pasture,
            births: 0,
            conceptions: 0,
        };

        Ok(Self { cfg, state, rng })
    }

    pub fn cfg(&self) -> &Config {
        &self.cfg
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Perform the simulation and save the resulting records to a binary file.
    pub fn perform_simulation<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);

        for i_save in 0..self.cfg.output.saves_per_file {
            for _ in 0..self.cfg.output.steps_per_save {
                self.perform_step().context("failed to perform step")?;
            }

            let record = Record::new(&self.state, self.cfg.days_per_step);
            encode::write(&mut writer, &record).context("failed to serialize record")?;

            let progress = 100.0 * (i_save + 1) as f64 / self.cfg.output.saves_per_file as f64;
            log::info!("completed {progress:06.2}%");
        }

        writer.flush().context("failed to flush writer stream")?;

        Ok(())
    }

    /// Save a checkpoint of the entire engine state.
    ///
    /// Can be used to resume the simulation later.
    pub fn save_checkpoint<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, &self).context("failed to serialize engine")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }

    /// Load a previously saved engine checkpoint.
    pub fn load_checkpoint<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);
        let engine = decode::from_read(&mut reader).context("failed to deserialize engine")?;
        Ok(engine)
    }

    /// Advance the herd and pasture by one time step.
    pub fn perform_step(&mut self) -> Result<()> {
        let days = self.cfg.days_per_step as f64;

        self.state
            .pasture
            .grow(days)
            .context("failed to grow pasture")?;

        for animal in &mut self.state.herd {
            animal.begin_step(&self.cfg.breed);
        }

        // All withdrawals from shared feed happen before any animal partitions.
        self.feed_herd(days).context("failed to feed herd")?;

        let walking_km = self.cfg.pasture.walking_km;
        for animal in &mut self.state.herd {
            let mut demands = StandardDemands::new(&self.cfg.breed, animal.demand_context(walking_km));
            animal
                .partition(&self.cfg.breed, &mut demands, days)
                .with_context(|| format!("failed to partition animal {}", animal.id()))?;
        }

        for animal in &mut self.state.herd {
            let events = animal
                .advance(&self.cfg.breed, days, &mut self.rng)
                .with_context(|| format!("failed to advance animal {}", animal.id()))?;
            for event in events {
                match event {
                    LifeEvent::Conceived => self.state.conceptions += 1,
                    LifeEvent::Birth { offspring } => self.state.births += offspring,
                    LifeEvent::LactationEnded => {}
                }
                log::debug!("animal {} {event:?}", animal.id());
            }
        }

        self.state.step += 1;

        Ok(())
    }

    fn feed_herd(&mut self, days: f64) -> Result<()> {
        for animal in &mut self.state.herd {
            for packet in &self.cfg.supplements {
                animal.offer(packet).context("failed to offer supplement")?;
            }
        }

        let pasture = &mut self.state.pasture;
        let mut daily = pasture
            .daily_allowance(days)
            .context("failed to open pasture")?;
        for animal in &mut self.state.herd {
            let available = daily.amount();
            animal
                .graze_from(&mut daily, available)
                .with_context(|| format!("failed to graze animal {}", animal.id()))?;
        }
        if daily.amount() == 0.0 {
            log::warn!("pasture exhausted at step {}", self.state.step);
        }
        pasture
            .return_unused(&daily, days)
            .context("failed to close pasture")?;

        for animal in &self.state.herd {
            if animal.intake.solids() + animal.intake.milk() == 0.0 {
                log::warn!("animal {} went unfed at step {}", animal.id(), self.state.step);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conception::ConceptionModel;
    use crate::config::{InitConfig, OutputConfig, PastureConfig};
    use crate::feed::NutrientPacket;
    use crate::params::BreedParams;

    fn cfg() -> Config {
        Config {
            days_per_step: 7,
            seed: Some(3),
            breed: BreedParams {
                conception: Some(ConceptionModel::Sigmoid {
                    maximum: 0.6,
                    midpoint: 0.85,
                    steepness: 20.0,
                }),
                ..BreedParams::default()
            },
            pasture: PastureConfig {
                initial: NutrientPacket {
                    amount: 50_000.0,
                    dmd: 0.65,
                    fat_percent: 2.5,
                    nitrogen_percent: 2.0,
                    rdp_percent: 70.0,
                    ..NutrientPacket::default()
                },
                growth: NutrientPacket {
                    amount: 400.0,
                    dmd: 0.7,
                    fat_percent: 3.0,
                    nitrogen_percent: 2.6,
                    rdp_percent: 75.0,
                    ..NutrientPacket::default()
                },
                decay: 0.01,
                walking_km: 1.0,
            },
            supplements: Vec::new(),
            init: InitConfig {
                n_animals: 12,
                prob_female: 0.75,
                min_age_days: 400.0,
                max_age_days: 2500.0,
                relative_condition: 1.0,
            },
            output: OutputConfig {
                steps_per_save: 2,
                saves_per_file: 3,
            },
        }
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let mut a = Engine::generate_initial_condition(cfg()).unwrap();
        let mut b = Engine::generate_initial_condition(cfg()).unwrap();
        for _ in 0..10 {
            a.perform_step().unwrap();
            b.perform_step().unwrap();
        }
        assert_eq!(a.state(), b.state());
        assert_eq!(a.state().step, 10);
    }

    #[test]
    fn herd_grazes_shared_pasture() {
        let mut engine = Engine::generate_initial_condition(cfg()).unwrap();
        let before = engine.state().pasture.available();
        engine.perform_step().unwrap();

        let eaten: f64 = engine
            .state()
            .herd
            .iter()
            .map(|a| a.intake.solids() * 7.0)
            .sum();
        assert!(eaten > 0.0);
        let grown = before * 0.99f64.powi(7) + 400.0 * 7.0;
        assert!((engine.state().pasture.available() - (grown - eaten)).abs() < 1e-6);
        for animal in &engine.state().herd {
            assert!(animal.energy.from_intake() > 0.0);
        }
    }

    #[test]
    fn empty_pasture_leaves_animals_unfed() {
        let mut cfg = cfg();
        cfg.pasture.initial.amount = 0.0;
        cfg.pasture.growth.amount = 0.0;
        let mut engine = Engine::generate_initial_condition(cfg).unwrap();
        engine.perform_step().unwrap();
        for animal in &engine.state().herd {
            assert_eq!(animal.intake.solids(), 0.0);
            assert!(animal.energy.after_wool() < 0.0);
        }
    }

    #[test]
    fn single_initial_age_is_allowed() {
        let mut cfg = cfg();
        cfg.init.min_age_days = 900.0;
        cfg.init.max_age_days = 900.0;
        cfg.validate().unwrap();
        let engine = Engine::generate_initial_condition(cfg).unwrap();
        for animal in &engine.state().herd {
            assert_eq!(animal.age_days(), 900.0);
        }
    }

    #[test]
    fn checkpoint_round_trip_preserves_state() {
        let dir = std::env::temp_dir().join(format!("ruminate-ckpt-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("checkpoint.msgpack");

        let mut engine = Engine::generate_initial_condition(cfg()).unwrap();
        engine.perform_step().unwrap();
        engine.save_checkpoint(&file).unwrap();
        let mut loaded = Engine::load_checkpoint(&file).unwrap();
        assert_eq!(loaded.state(), engine.state());
        assert_eq!(loaded.cfg(), engine.cfg());

        engine.perform_step().unwrap();
        loaded.perform_step().unwrap();
        assert_eq!(loaded.state(), engine.state());

        std::fs::remove_dir_all(&dir).ok();
    }
}

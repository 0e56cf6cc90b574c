use crate::config::Config;
use crate::model::Record;
use crate::stats::TimeSeries;
use anyhow::{Context, Result};
use rmp_serde::{decode, encode};
use serde_value::Value;
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

pub trait Obs {
    fn update(&mut self, record: &Record) -> Result<()>;
    fn report(&self) -> Result<Value>;
}

/// Herd-level scalar observed once per record.
///
/// Records without a defined value (an empty herd, say) are skipped.
pub struct HerdObs {
    name: &'static str,
    extract: fn(&Record) -> Option<f64>,
    time_series: TimeSeries,
}

impl HerdObs {
    pub fn new(name: &'static str, extract: fn(&Record) -> Option<f64>) -> Self {
        Self {
            name,
            extract,
            time_series: TimeSeries::new(),
        }
    }
}

impl Obs for HerdObs {
    fn update(&mut self, record: &Record) -> Result<()> {
        if let Some(val) = (self.extract)(record) {
            self.time_series.push(val);
        }
        Ok(())
    }

    fn report(&self) -> Result<Value> {
        let report = BTreeMap::from([(self.name, self.time_series.report())]);
        serde_value::to_value(report).with_context(|| format!("failed to report {}", self.name))
    }
}

fn herd_mean(record: &Record, f: impl Fn(&crate::model::AnimalSnapshot) -> f64) -> Option<f64> {
    if record.animals.is_empty() {
        return None;
    }
    Some(record.animals.iter().map(f).sum::<f64>() / record.animals.len() as f64)
}

fn mean_live_weight(record: &Record) -> Option<f64> {
    herd_mean(record, |a| a.weight.live)
}

fn mean_relative_condition(record: &Record) -> Option<f64> {
    herd_mean(record, |a| a.weight.relative_condition)
}

fn pasture_available(record: &Record) -> Option<f64> {
    Some(record.pasture_available)
}

fn proportion_pregnant(record: &Record) -> Option<f64> {
    herd_mean(record, |a| if a.pregnant { 1.0 } else { 0.0 })
}

pub struct Analyzer {
    cfg: Config,
    obs_ptr_vec: Vec<Box<dyn Obs>>,
}

impl Analyzer {
    pub fn new(cfg: Config) -> Self {
        let obs_ptr_vec: Vec<Box<dyn Obs>> = vec![
            Box::new(HerdObs::new("mean_live_weight", mean_live_weight)),
            Box::new(HerdObs::new("mean_relative_condition", mean_relative_condition)),
            Box::new(HerdObs::new("pasture_available", pasture_available)),
            Box::new(HerdObs::new("proportion_pregnant", proportion_pregnant)),
        ];
        Self { cfg, obs_ptr_vec }
    }

    pub fn add_record(&mut self, record: &Record) -> Result<()> {
        for obs in &mut self.obs_ptr_vec {
            obs.update(record).context("failed to update observable")?;
        }
        Ok(())
    }

    pub fn add_file<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);

        for _ in 0..self.cfg.output.saves_per_file {
            let record: Record = decode::from_read(&mut reader).context("failed to read record")?;
            self.add_record(&record)?;
        }
        Ok(())
    }

    pub fn reports(&self) -> Result<Vec<Value>> {
        self.obs_ptr_vec.iter().map(|obs| obs.report()).collect()
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);

        let reports = self.reports().context("failed to collect reports")?;
        encode::write(&mut writer, &reports).context("failed to serialize results")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;

    const CONFIG: &str = r#"
days_per_step = 14
seed = 11

[breed.conception.fixed]
rate = 0.3

[pasture]
decay = 0.005
initial = { amount = 30000.0, dmd = 0.65, nitrogen_percent = 2.0, rdp_percent = 70.0 }
growth = { amount = 200.0, dmd = 0.68, nitrogen_percent = 2.2, rdp_percent = 72.0 }

[init]
n_animals = 8
prob_female = 1.0
min_age_days = 800.0
max_age_days = 2000.0
relative_condition = 1.0

[output]
steps_per_save = 1
saves_per_file = 4
"#;

    #[test]
    fn reports_every_observable() {
        let cfg: Config = toml::from_str(CONFIG).unwrap();
        cfg.validate().unwrap();
        let mut engine = Engine::generate_initial_condition(cfg.clone()).unwrap();
        let mut analyzer = Analyzer::new(cfg.clone());
        for _ in 0..cfg.output.saves_per_file {
            engine.perform_step().unwrap();
            analyzer
                .add_record(&Record::new(engine.state(), cfg.days_per_step))
                .unwrap();
        }

        let reports = analyzer.reports().unwrap();
        assert_eq!(reports.len(), 4);
        let Value::Map(map) = &reports[3] else {
            panic!("report is not a map");
        };
        let key = Value::String("proportion_pregnant".to_string());
        let Some(Value::Map(summary)) = map.get(&key) else {
            panic!("missing proportion_pregnant");
        };
        let Some(Value::F64(max)) = summary.get(&Value::String("max".to_string())) else {
            panic!("missing max");
        };
        assert!((0.0..=1.0).contains(max));
    }
}

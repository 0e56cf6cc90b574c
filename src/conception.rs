//! Conception rate models.

use crate::utils::{check_num, check_prob};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Probability of conceiving in one mating opportunity as a function of the
/// female's relative condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptionModel {
    /// Logistic curve rising with condition.
    Sigmoid {
        maximum: f64,
        midpoint: f64,
        steepness: f64,
    },
    /// Fixed rate once condition reaches a threshold, zero below it.
    Threshold { threshold: f64, rate: f64 },
    /// Same rate regardless of condition.
    Fixed { rate: f64 },
}

impl ConceptionModel {
    pub fn validate(&self) -> Result<()> {
        match *self {
            ConceptionModel::Sigmoid {
                maximum,
                midpoint,
                steepness,
            } => {
                check_prob(maximum).context("invalid maximum rate")?;
                check_num(midpoint, 0.0..10.0).context("invalid midpoint")?;
                check_num(steepness, 0.0..1000.0).context("invalid steepness")?;
            }
            ConceptionModel::Threshold { threshold, rate } => {
                check_num(threshold, 0.0..10.0).context("invalid threshold")?;
                check_prob(rate).context("invalid rate")?;
            }
            ConceptionModel::Fixed { rate } => check_prob(rate).context("invalid rate")?,
        }
        Ok(())
    }

    /// Conception rate for a female in `relative_condition`.
    pub fn rate(&self, relative_condition: f64) -> f64 {
        if !relative_condition.is_finite() {
            return 0.0;
        }
        match *self {
            ConceptionModel::Sigmoid {
                maximum,
                midpoint,
                steepness,
            } => maximum / (1.0 + (-steepness * (relative_condition - midpoint)).exp()),
            ConceptionModel::Threshold { threshold, rate } => {
                if relative_condition >= threshold {
                    rate
                } else {
                    0.0
                }
            }
            ConceptionModel::Fixed { rate } => rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_is_half_maximum_at_midpoint() {
        let model = ConceptionModel::Sigmoid {
            maximum: 0.9,
            midpoint: 0.8,
            steepness: 12.0,
        };
        assert!((model.rate(0.8) - 0.45).abs() < 1e-12);
        assert!(model.rate(1.2) > model.rate(0.8));
        assert!(model.rate(1.2) < 0.9);
        assert!(model.rate(0.2) < 0.01);
    }

    #[test]
    fn sigmoid_saturates_without_overflow() {
        let model = ConceptionModel::Sigmoid {
            maximum: 0.9,
            midpoint: 0.8,
            steepness: 500.0,
        };
        assert_eq!(model.rate(-5.0), 0.0);
        assert!((model.rate(5.0) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn threshold_switches_at_condition() {
        let model = ConceptionModel::Threshold {
            threshold: 0.9,
            rate: 0.7,
        };
        assert_eq!(model.rate(0.89), 0.0);
        assert_eq!(model.rate(0.9), 0.7);
    }

    #[test]
    fn deserializes_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            conception: ConceptionModel,
        }
        let w: Wrapper = toml::from_str(
            r#"
[conception.threshold]
threshold = 0.95
rate = 0.6
"#,
        )
        .unwrap();
        assert_eq!(
            w.conception,
            ConceptionModel::Threshold {
                threshold: 0.95,
                rate: 0.6
            }
        );
    }
}

use anyhow::{Result, bail};
use std::{fmt::Debug, ops::RangeBounds};

pub fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

/// Reject negative, NaN and infinite masses.
pub fn check_mass(mass: f64) -> Result<()> {
    if !mass.is_finite() || mass < 0.0 {
        bail!("mass must be finite and non-negative, but is {mass}");
    }
    Ok(())
}

pub fn check_prob(prob: f64) -> Result<()> {
    check_num(prob, 0.0..=1.0)
}

pub fn check_percent(percent: f64) -> Result<()> {
    check_num(percent, 0.0..=100.0)
}

pub fn check_positive(num: f64) -> Result<()> {
    if !num.is_finite() || num <= 0.0 {
        bail!("number must be finite and positive, but is {num}");
    }
    Ok(())
}

/// Divide, returning `fallback` when the denominator is zero.
pub fn div_or(num: f64, den: f64, fallback: f64) -> f64 {
    if den == 0.0 { fallback } else { num / den }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mass_rejects_negative_and_nan() {
        assert!(check_mass(0.0).is_ok());
        assert!(check_mass(12.5).is_ok());
        assert!(check_mass(-0.1).is_err());
        assert!(check_mass(f64::NAN).is_err());
        assert!(check_mass(f64::INFINITY).is_err());
    }

    #[test]
    fn div_or_guards_zero() {
        assert_eq!(div_or(1.0, 0.0, 0.0), 0.0);
        assert_eq!(div_or(1.0, 4.0, 0.0), 0.25);
    }
}

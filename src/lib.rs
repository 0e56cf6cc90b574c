//! Ruminant nutrition and growth engine.
//!
//! Feed eaten by an animal is recorded in its [`intake::IntakeLedger`], the
//! metabolisable energy is partitioned in fixed order by
//! [`energy::EnergyLedger`], protein supply is checked against demand by
//! [`protein::ProteinLedger`], and the net result is applied to the body
//! stocks of [`weight::WeightState`]. The [`engine`], [`manager`] and
//! [`analysis`] modules run herds over time and summarise the output.

pub mod analysis;
pub mod animal;
pub mod conception;
pub mod config;
pub mod energy;
pub mod engine;
pub mod feed;
pub mod intake;
pub mod manager;
pub mod model;
pub mod params;
pub mod physiology;
pub mod pool;
pub mod protein;
pub mod stats;
pub mod supply;
pub mod tracking;
pub mod utils;
pub mod weight;

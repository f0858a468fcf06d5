//! Discrete-time reliability simulation.
//!
//! Given an insolation series and a load series with one value per period,
//! the simulator walks the storage state of charge forward in time and
//! reports the fraction of total load energy that was served.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::FrontierError;

/// Input validation failures for the simulator.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("insolation series has {insolation} periods but load series has {load}")]
    LengthMismatch { insolation: usize, load: usize },

    #[error("insolation and load series must not be empty")]
    EmptySeries,

    #[error("mean load must be positive, got {0}")]
    NonPositiveLoad(f64),
}

/// Result of a single reliability simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationOutcome {
    /// Fraction of total load energy served, in `[0, 1]`.
    pub reliability: f64,
    /// Unserved demand per period, same length as the input series.
    pub unmet_load: Vec<f64>,
}

/// A validated insolation/load series pair.
///
/// Validation happens once at construction so the per-solve simulation loop
/// stays infallible. The series are immutable for the lifetime of the value.
#[derive(Debug, Clone)]
pub struct EnergySystem {
    insolation: Vec<f64>,
    load: Vec<f64>,
    mean_insolation: f64,
    mean_load: f64,
}

impl EnergySystem {
    pub fn new(insolation: Vec<f64>, load: Vec<f64>) -> Result<Self, SimulationError> {
        if insolation.is_empty() || load.is_empty() {
            return Err(SimulationError::EmptySeries);
        }
        if insolation.len() != load.len() {
            return Err(SimulationError::LengthMismatch {
                insolation: insolation.len(),
                load: load.len(),
            });
        }
        let mean_insolation = mean(&insolation);
        let mean_load = mean(&load);
        if mean_load <= 0.0 {
            return Err(SimulationError::NonPositiveLoad(mean_load));
        }
        Ok(Self {
            insolation,
            load,
            mean_insolation,
            mean_load,
        })
    }

    pub fn mean_insolation(&self) -> f64 {
        self.mean_insolation
    }

    pub fn mean_load(&self) -> f64 {
        self.mean_load
    }

    /// Simulate one pass over the series and return the realized
    /// reliability together with the unmet-load series.
    ///
    /// Storage starts full. Each period the net excess
    /// `solar_capacity * insolation[i] - load[i]` charges or discharges the
    /// store, clamped to `[0, storage_capacity]`; whatever discharge the
    /// SOC floor refused becomes unmet load.
    pub fn simulate(&self, solar_capacity: f64, storage_capacity: f64) -> SimulationOutcome {
        let n = self.insolation.len();
        let mut unmet_load = vec![0.0; n];
        let mut prev_soc = storage_capacity;

        for i in 0..n {
            let excess = solar_capacity * self.insolation[i] - self.load[i];
            let next_soc = (prev_soc + excess).clamp(0.0, storage_capacity);
            unmet_load[i] = (next_soc - prev_soc - excess).max(0.0);
            prev_soc = next_soc;
        }

        let reliability = 1.0 - mean(&unmet_load) / self.mean_load;
        SimulationOutcome {
            reliability,
            unmet_load,
        }
    }

    /// Reliability only, for use inside solver residuals.
    pub fn reliability(&self, solar_capacity: f64, storage_capacity: f64) -> f64 {
        self.simulate(solar_capacity, storage_capacity).reliability
    }
}

/// Build an electric load series matching an insolation series of
/// `periods` hourly values.
///
/// The only implemented load type, `constant`, repeats a uniform 24-value
/// daily profile of `1/24` per hour across the rounded day count of the
/// series.
pub fn build_load(load_type: &str, periods: usize) -> Result<Vec<f64>, FrontierError> {
    match load_type {
        "constant" => {
            let days = ((periods as f64) / 24.0).round() as usize;
            Ok(vec![1.0 / 24.0; days * 24])
        }
        other => Err(FrontierError::UnsupportedLoadType(other.to_string())),
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

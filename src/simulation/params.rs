//! Numerical parameters for a simulation run
//!
//! `Parameters` holds the arguments of one `simulate` call:
//! - end time and initial/fixed step size,
//! - output interval (0 records every step),
//! - whether the step adapts to energy drift
//!
//! `StepControl` holds the thresholds of the adaptive step heuristic.

use serde::Deserialize;

use crate::error::{Result, SimError};

#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub final_time: f64, // run stops once time reaches this
    pub time_step: f64, // fixed step, or first guess when adaptive
    pub output_time: f64, // snapshot interval, 0 = every step
    pub adaptive_steps: bool,
}

impl Parameters {
    pub fn validate(&self) -> Result<()> {
        if !self.final_time.is_finite() {
            return Err(SimError::InvalidParameter(format!("final_time = {}", self.final_time)));
        }
        if !self.time_step.is_finite() || self.time_step <= 0.0 {
            return Err(SimError::InvalidParameter(format!(
                "time_step must be positive, got {}",
                self.time_step
            )));
        }
        if !self.output_time.is_finite() || self.output_time < 0.0 {
            return Err(SimError::InvalidParameter(format!(
                "output_time must be zero or positive, got {}",
                self.output_time
            )));
        }
        Ok(())
    }
}

/// Energy-drift step heuristic.
///
/// This is a crude stability heuristic, not an error estimator: when the
/// relative energy change between two consecutive evaluations stays within
/// `drift_threshold` the step grows by `grow_factor`, otherwise it shrinks by
/// `shrink_factor`, and the result is clamped to `[min_step, max_step]`.
///
/// `time_tolerance` is the relative slack used when comparing simulated time
/// against the end time and output instants.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StepControl {
    pub drift_threshold: f64,
    pub grow_factor: f64,
    pub shrink_factor: f64,
    pub min_step: f64,
    pub max_step: f64,
    pub time_tolerance: f64,
}

impl Default for StepControl {
    fn default() -> Self {
        Self {
            drift_threshold: 1e-10,
            grow_factor: 2.0,
            shrink_factor: 0.5,
            min_step: 1e-10,
            max_step: 1.0,
            time_tolerance: 1e-12,
        }
    }
}

impl StepControl {
    pub fn validate(&self) -> Result<()> {
        if !(self.min_step > 0.0 && self.min_step <= self.max_step) {
            return Err(SimError::InvalidParameter(format!(
                "step bounds [{}, {}] are not a positive range",
                self.min_step, self.max_step
            )));
        }
        if !(self.grow_factor > 0.0 && self.shrink_factor > 0.0) {
            return Err(SimError::InvalidParameter("step factors must be positive".into()));
        }
        if !(self.drift_threshold >= 0.0 && self.time_tolerance >= 0.0) {
            return Err(SimError::InvalidParameter("tolerances must not be negative".into()));
        }
        Ok(())
    }

    /// Next step size given the latest and the previous total energy
    pub fn adjust(&self, step: f64, energy: f64, energy_previous: f64) -> Result<f64> {
        if energy_previous == 0.0 {
            return Err(SimError::DegenerateConfiguration(
                "reference energy is zero, relative drift undefined".into(),
            ));
        }
        let drift = ((energy - energy_previous) / energy_previous).abs();
        let factor = if drift <= self.drift_threshold {
            self.grow_factor
        } else {
            self.shrink_factor
        };
        Ok((factor * step).clamp(self.min_step, self.max_step))
    }

    /// True once `time` has reached `target`, up to the relative tolerance
    pub fn reached(&self, time: f64, target: f64) -> bool {
        time >= target - self.time_tolerance * target.abs().max(1.0)
    }
}

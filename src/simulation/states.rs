//! Core state types for the N-body simulation.
//!
//! - `Body`   point mass with position, velocity and mass
//! - `System` the bodies plus everything derived from them: the current
//!   time, one acceleration per body and the last two energy evaluations
//!
//! `accelerations[i]` always belongs to `bodies[i]`; anything that moves a body
//! must call [`System::calculate_accelerations`] before the next kick.

use nalgebra::Vector3;

use crate::error::Result;
use crate::simulation::forces;

pub type NVec3 = Vector3<f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub x: NVec3, // position
    pub v: NVec3, // velocity
    pub m: f64, // mass
}

impl Body {
    pub fn new(x: NVec3, v: NVec3, m: f64) -> Self {
        Self { x, v, m }
    }

    pub fn momentum(&self) -> NVec3 {
        self.m * self.v
    }

    /// m/2 * |v|^2
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.m * self.v.dot(&self.v)
    }
}

#[derive(Debug, Clone, Default)]
pub struct System {
    pub t: f64, // time
    pub bodies: Vec<Body>,
    pub accelerations: Vec<NVec3>, // one per body, same indexing
    pub total_energy: f64,
    pub total_energy_previous: f64, // value of `total_energy` before the last evaluation
}

impl System {
    pub fn new(t: f64) -> Self {
        Self {
            t,
            ..Default::default()
        }
    }

    /// Recompute gravitational accelerations for the current positions.
    /// The buffer is resized first so bodies added since the last call are covered
    pub fn calculate_accelerations(&mut self) -> Result<()> {
        self.accelerations.resize(self.bodies.len(), NVec3::zeros());
        forces::accumulate_accels(&self.bodies, &mut self.accelerations)
    }

    /// Evaluate the total energy, moving the old value into `total_energy_previous`
    pub fn calculate_total_energy(&mut self) -> Result<f64> {
        let energy = forces::total_energy(&self.bodies)?;
        self.total_energy_previous = self.total_energy;
        self.total_energy = energy;
        Ok(energy)
    }

    pub fn total_mass(&self) -> f64 {
        self.bodies.iter().map(|b| b.m).sum()
    }

    pub fn total_momentum(&self) -> NVec3 {
        self.bodies.iter().fold(NVec3::zeros(), |p, b| p + b.momentum())
    }

    /// Mass-weighted mean position, `None` for an empty system
    pub fn center_of_mass(&self) -> Option<NVec3> {
        let m = self.total_mass();
        if self.bodies.is_empty() || m == 0.0 {
            return None;
        }
        let weighted = self.bodies.iter().fold(NVec3::zeros(), |acc, b| acc + b.m * b.x);
        Some(weighted / m)
    }
}

//! Time integrators for the N-body system
//!
//! Every scheme implements [`Integrator`]: it reads the positions, velocities
//! and the accelerations already stored in the `System`, moves the bodies by
//! one step `dt`, and leaves `sys.accelerations` valid for the new positions.
//! Advancing `sys.t` is left to the caller, which may snap it to an output
//! instant.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::Result;
use crate::simulation::forces::accumulate_accels;
use crate::simulation::states::{Body, NVec3, System};

pub trait Integrator {
    fn name(&self) -> &'static str;

    /// Advance positions and velocities by `dt`, refreshing accelerations
    fn advance(&self, sys: &mut System, dt: f64) -> Result<()>;
}

/// Velocity-Verlet leapfrog.
/// Time-symmetric and second order, with bounded long-term energy error
#[derive(Debug, Clone, Copy, Default)]
pub struct Leapfrog;

impl Integrator for Leapfrog {
    fn name(&self) -> &'static str {
        "leapfrog"
    }

    fn advance(&self, sys: &mut System, dt: f64) -> Result<()> {
        let half_dt = 0.5 * dt;

        // Drift with the old acceleration and first kick:
        // x_n+1 = x_n + dt v_n + dt^2/2 a_n
        // v_n+1/2 = v_n + dt/2 a_n
        for (b, a) in sys.bodies.iter_mut().zip(sys.accelerations.iter()) {
            b.x += dt * b.v + half_dt * dt * *a;
            b.v += half_dt * *a;
        }

        // a_n+1 from x_n+1
        sys.calculate_accelerations()?;

        // Second kick: v_n+1 = v_n+1/2 + dt/2 a_n+1
        for (b, a) in sys.bodies.iter_mut().zip(sys.accelerations.iter()) {
            b.v += half_dt * *a;
        }
        Ok(())
    }
}

/// Explicit midpoint (RK2) scheme.
/// Same two force evaluations as leapfrog but no symplectic structure, so
/// energy drifts secularly over long runs
#[derive(Debug, Clone, Copy, Default)]
pub struct Rk2;

impl Integrator for Rk2 {
    fn name(&self) -> &'static str {
        "rk2"
    }

    fn advance(&self, sys: &mut System, dt: f64) -> Result<()> {
        // Half-step displacement (applied temporarily) and the full-step one
        let half: Vec<NVec3> = sys.bodies.iter().map(|b| 0.5 * dt * b.v).collect();
        let full: Vec<NVec3> = sys
            .bodies
            .iter()
            .zip(sys.accelerations.iter())
            .map(|(b, a)| dt * b.v + 0.5 * dt * dt * *a)
            .collect();

        for (b, dx) in sys.bodies.iter_mut().zip(half.iter()) {
            b.x += *dx;
        }

        // Midpoint acceleration
        sys.calculate_accelerations()?;

        for (i, b) in sys.bodies.iter_mut().enumerate() {
            b.v += dt * sys.accelerations[i];
            b.x += full[i] - half[i];
        }

        sys.calculate_accelerations()
    }
}

/// Classical fourth-order Runge-Kutta on (x, v), four force evaluations per step
#[derive(Debug, Clone, Copy, Default)]
pub struct Rk4;

impl Rk4 {
    /// Accelerations for the bodies of `sys` moved to `x` (velocities unused)
    fn accels_at(scratch: &mut [Body], x: &[NVec3], out: &mut [NVec3]) -> Result<()> {
        for (b, xi) in scratch.iter_mut().zip(x.iter()) {
            b.x = *xi;
        }
        accumulate_accels(scratch, out)
    }
}

impl Integrator for Rk4 {
    fn name(&self) -> &'static str {
        "rk4"
    }

    fn advance(&self, sys: &mut System, dt: f64) -> Result<()> {
        let n = sys.bodies.len();
        let half_dt = 0.5 * dt;
        let mut scratch = sys.bodies.clone();

        let x0: Vec<NVec3> = sys.bodies.iter().map(|b| b.x).collect();
        let v0: Vec<NVec3> = sys.bodies.iter().map(|b| b.v).collect();

        // k1 = (v0, a(x0))
        let k1x = v0.clone();
        let k1v = sys.accelerations.clone();

        // k2 at x0 + dt/2 k1
        let k2x: Vec<NVec3> = (0..n).map(|i| v0[i] + half_dt * k1v[i]).collect();
        let x2: Vec<NVec3> = (0..n).map(|i| x0[i] + half_dt * k1x[i]).collect();
        let mut k2v = vec![NVec3::zeros(); n];
        Self::accels_at(&mut scratch, &x2, &mut k2v)?;

        // k3 at x0 + dt/2 k2
        let k3x: Vec<NVec3> = (0..n).map(|i| v0[i] + half_dt * k2v[i]).collect();
        let x3: Vec<NVec3> = (0..n).map(|i| x0[i] + half_dt * k2x[i]).collect();
        let mut k3v = vec![NVec3::zeros(); n];
        Self::accels_at(&mut scratch, &x3, &mut k3v)?;

        // k4 at x0 + dt k3
        let k4x: Vec<NVec3> = (0..n).map(|i| v0[i] + dt * k3v[i]).collect();
        let x4: Vec<NVec3> = (0..n).map(|i| x0[i] + dt * k3x[i]).collect();
        let mut k4v = vec![NVec3::zeros(); n];
        Self::accels_at(&mut scratch, &x4, &mut k4v)?;

        let w = dt / 6.0;
        for (i, b) in sys.bodies.iter_mut().enumerate() {
            b.x = x0[i] + w * (k1x[i] + 2.0 * k2x[i] + 2.0 * k3x[i] + k4x[i]);
            b.v = v0[i] + w * (k1v[i] + 2.0 * k2v[i] + 2.0 * k3v[i] + k4v[i]);
        }

        sys.calculate_accelerations()
    }
}

/// Which integrator the engine uses
/// `integrator: leapfrog`, `integrator: rk2` or `integrator: rk4`
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegratorKind {
    #[default]
    #[serde(rename = "leapfrog")]
    Leapfrog,

    #[serde(rename = "rk2")]
    Rk2,

    #[serde(rename = "rk4")]
    Rk4,
}

impl IntegratorKind {
    pub const ALL: [IntegratorKind; 3] = [IntegratorKind::Leapfrog, IntegratorKind::Rk2, IntegratorKind::Rk4];

    pub fn build(self) -> Box<dyn Integrator> {
        match self {
            IntegratorKind::Leapfrog => Box::new(Leapfrog),
            IntegratorKind::Rk2 => Box::new(Rk2),
            IntegratorKind::Rk4 => Box::new(Rk4),
        }
    }
}

impl fmt::Display for IntegratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IntegratorKind::Leapfrog => "leapfrog",
            IntegratorKind::Rk2 => "rk2",
            IntegratorKind::Rk4 => "rk4",
        })
    }
}

impl FromStr for IntegratorKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "leapfrog" | "verlet" => Ok(IntegratorKind::Leapfrog),
            "rk2" | "midpoint" => Ok(IntegratorKind::Rk2),
            "rk4" => Ok(IntegratorKind::Rk4),
            other => Err(format!("unknown integrator `{other}` (expected leapfrog, rk2 or rk4)")),
        }
    }
}

//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`EngineConfig`]     – integrator, output file and start time
//! - [`ParametersConfig`] – the arguments of the `simulate` call
//! - [`BodyConfig`]       – initial state for each body
//! - [`RandomCloudConfig`] – seeded cloud of bodies added after the listed ones
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! # YAML format
//! The equal-mass binary used throughout the tests:
//!
//! ```yaml
//! engine:
//!   integrator: "leapfrog"  # or "rk2", "rk4"
//!   output: "binary.dat"    # truncated when the engine is built
//!   initial_time: 0.0
//!
//! parameters:
//!   final_time: 10.0
//!   time_step: 0.1          # fixed step, or first guess when adaptive
//!   output_time: 0.0        # 0 -> record every step
//!   adaptive_steps: false
//!   step_control:           # optional, defaults shown
//!     drift_threshold: 1.0e-10
//!     min_step: 1.0e-10
//!     max_step: 1.0
//!
//! bodies:
//!   - x: [ -0.5, 0.0, 0.0 ]
//!     v: [  0.0, -0.5, 0.0 ]
//!     m: 1.0
//!   - x: [  0.5, 0.0, 0.0 ]
//!     v: [  0.0, 0.5, 0.0 ]
//!     m: 1.0
//! ```
//!
//! Instead of (or in addition to) `bodies`, a scenario may draw a seeded
//! random cloud:
//!
//! ```yaml
//! bodies_random:
//!   n: 5
//!   seed: 42
//!   mass: 0.1
//!   radius: 1.0     # optional, positions uniform inside this sphere
//!   max_speed: 0.1  # optional, each velocity component in [-max_speed, max_speed)
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, SimError};
use crate::simulation::integrator::IntegratorKind;
use crate::simulation::params::StepControl;

/// Engine-level configuration
#[derive(Deserialize, Debug, Clone)]
pub struct EngineConfig {
    #[serde(default)]
    pub integrator: IntegratorKind, // leapfrog when omitted
    pub output: PathBuf, // snapshot file, relative paths resolve against the working directory
    #[serde(default)]
    pub initial_time: f64,
}

/// Arguments of one `simulate` call
#[derive(Deserialize, Debug, Clone)]
pub struct ParametersConfig {
    pub final_time: f64,
    pub time_step: f64,
    #[serde(default)]
    pub output_time: f64, // 0 records every step
    #[serde(default)]
    pub adaptive_steps: bool,
    #[serde(default)]
    pub step_control: StepControl,
}

/// Configuration for a single body's initial state
#[derive(Deserialize, Debug, Clone)]
pub struct BodyConfig {
    pub x: [f64; 3], // initial position
    pub v: [f64; 3], // initial velocity
    pub m: f64, // mass, must be positive
}

/// Equal-mass bodies scattered uniformly inside a sphere around the origin
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RandomCloudConfig {
    pub n: usize,
    pub seed: u64,
    pub mass: f64,
    #[serde(default = "default_radius")]
    pub radius: f64,
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,
}

fn default_radius() -> f64 {
    1.0
}

fn default_max_speed() -> f64 {
    0.1
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    pub engine: EngineConfig,
    pub parameters: ParametersConfig,
    #[serde(default)]
    pub bodies: Vec<BodyConfig>,
    #[serde(default)]
    pub bodies_random: Option<RandomCloudConfig>,
}

impl ScenarioConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SimError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);
        Ok(serde_yaml::from_reader(reader)?)
    }
}

//! Build fully-initialized simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces a runtime bundle:
//! - an `Engine` with the chosen integrator, step control and bodies
//! - the `Parameters` for its `simulate` call

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::configuration::config::{BodyConfig, RandomCloudConfig, ScenarioConfig};
use crate::error::{Result, SimError};
use crate::simulation::engine::{Engine, RunReport};
use crate::simulation::params::Parameters;
use crate::simulation::states::{Body, NVec3};

/// Draw `cfg.n` equal-mass bodies with random initial states.
///
/// Positions are uniform inside the sphere of radius `cfg.radius`: candidates
/// are drawn from the enclosing cube and rejected when they fall outside.
/// Each velocity component is uniform in `[-max_speed, max_speed)`. The same
/// seed always yields the same cloud.
pub fn random_cloud(cfg: &RandomCloudConfig) -> Result<Vec<Body>> {
    if !(cfg.radius.is_finite() && cfg.radius > 0.0) {
        return Err(SimError::InvalidParameter(format!(
            "bodies_random.radius must be positive, got {}",
            cfg.radius
        )));
    }
    if !(cfg.max_speed.is_finite() && cfg.max_speed >= 0.0) {
        return Err(SimError::InvalidParameter(format!(
            "bodies_random.max_speed must be non-negative, got {}",
            cfg.max_speed
        )));
    }

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let r = cfg.radius;
    let mut bodies = Vec::with_capacity(cfg.n);
    while bodies.len() < cfg.n {
        let x = NVec3::new(rng.gen_range(-r..r), rng.gen_range(-r..r), rng.gen_range(-r..r));
        if x.norm_squared() > r * r {
            continue;
        }
        let v = if cfg.max_speed > 0.0 {
            let s = cfg.max_speed;
            NVec3::new(rng.gen_range(-s..s), rng.gen_range(-s..s), rng.gen_range(-s..s))
        } else {
            NVec3::zeros()
        };
        bodies.push(Body::new(x, v, cfg.mass));
    }
    Ok(bodies)
}

pub struct Scenario {
    pub engine: Engine,
    pub parameters: Parameters,
}

impl Scenario {
    /// Construct the engine (truncating its output file) and add every body
    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self> {
        let e_cfg = cfg.engine;
        let p_cfg = cfg.parameters;

        let mut engine = Engine::new(e_cfg.initial_time, &e_cfg.output, e_cfg.integrator.build())?
            .with_step_control(p_cfg.step_control);

        // Bodies: map `BodyConfig` -> runtime `Body` using nalgebra vectors
        for bc in &cfg.bodies {
            let BodyConfig { x, v, m } = bc;
            engine.add_object(Body::new(NVec3::from(*x), NVec3::from(*v), *m))?;
        }
        if let Some(cloud) = &cfg.bodies_random {
            for body in random_cloud(cloud)? {
                engine.add_object(body)?;
            }
        }

        let parameters = Parameters {
            final_time: p_cfg.final_time,
            time_step: p_cfg.time_step,
            output_time: p_cfg.output_time,
            adaptive_steps: p_cfg.adaptive_steps,
        };

        debug!(
            bodies = engine.bodies().len(),
            integrator = engine.integrator_name(),
            output = %engine.output_path().display(),
            "scenario built"
        );

        Ok(Self { engine, parameters })
    }

    pub fn run(&mut self) -> Result<RunReport> {
        self.engine.simulate(&self.parameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;

    fn yaml(output: &str, mass: f64) -> String {
        format!(
            r#"
engine:
  integrator: rk4
  output: "{output}"
  initial_time: 2.0
parameters:
  final_time: 2.5
  time_step: 0.1
bodies:
  - {{ x: [0, 0, 0], v: [0, 0, 0], m: 1.0 }}
  - {{ x: [1, 0, 0], v: [0, 1, 0], m: {mass} }}
"#
        )
    }

    #[test]
    fn builds_engine_from_config() {
        let out = std::env::temp_dir().join(format!("nbody-scenario-{}.dat", std::process::id()));
        let cfg = ScenarioConfig::from_yaml_str(&yaml(&out.display().to_string(), 1e-3)).unwrap();
        let mut scenario = Scenario::build_scenario(cfg).unwrap();

        assert_eq!(scenario.engine.integrator_name(), "rk4");
        assert_eq!(scenario.engine.time(), 2.0);
        assert_eq!(scenario.engine.bodies()[1].v, NVec3::new(0.0, 1.0, 0.0));

        let report = scenario.run().unwrap();
        assert_eq!(report.steps, 5);
        std::fs::remove_file(&out).ok();
    }

    #[test]
    fn invalid_body_mass_is_reported() {
        let out = std::env::temp_dir().join(format!("nbody-scenario-bad-{}.dat", std::process::id()));
        let cfg = ScenarioConfig::from_yaml_str(&yaml(&out.display().to_string(), -1.0)).unwrap();
        assert!(matches!(
            Scenario::build_scenario(cfg),
            Err(SimError::InvalidBody(_))
        ));
        std::fs::remove_file(&out).ok();
    }

    fn cloud(seed: u64) -> RandomCloudConfig {
        RandomCloudConfig {
            n: 50,
            seed,
            mass: 0.1,
            radius: 1.0,
            max_speed: 0.1,
        }
    }

    #[test]
    fn random_cloud_stays_inside_the_unit_sphere() {
        let bodies = random_cloud(&cloud(42)).unwrap();
        assert_eq!(bodies.len(), 50);
        for b in &bodies {
            assert!(b.x.norm() <= 1.0, "position {:?} outside the sphere", b.x);
            assert!(b.v.iter().all(|c| (-0.1..0.1).contains(c)), "velocity {:?}", b.v);
            assert_eq!(b.m, 0.1);
        }
    }

    #[test]
    fn random_cloud_is_reproducible_from_its_seed() {
        let a = random_cloud(&cloud(42)).unwrap();
        let b = random_cloud(&cloud(42)).unwrap();
        let c = random_cloud(&cloud(43)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn random_cloud_rejects_bad_radius() {
        let cfg = RandomCloudConfig { radius: 0.0, ..cloud(1) };
        assert!(matches!(random_cloud(&cfg), Err(SimError::InvalidParameter(_))));
    }
}

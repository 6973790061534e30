//! Simulation engine
//!
//! Owns the body list, the derived accelerations and energies, the output
//! sink and one integration strategy. A run is a single blocking call:
//!
//! ```text
//! loop while time < final_time:
//!     energy / step size  ->  snapshot if due  ->  clamp to output instant
//!     ->  integrator.advance  ->  time += step
//! ```

use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{Result, SimError};
use crate::simulation::integrator::Integrator;
use crate::simulation::params::{Parameters, StepControl};
use crate::simulation::recorder::{Snapshot, StateRecorder};
use crate::simulation::schedule::OutputSchedule;
use crate::simulation::states::{Body, System};

/// Summary of a finished `simulate` call
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub steps: usize, // integrator steps taken
    pub snapshots: usize, // lines written
    pub final_time: f64,
    pub final_step: f64, // step size the controller ended on
    pub initial_energy: f64,
    pub final_energy: f64,
}

impl RunReport {
    /// |E_end - E_start| / |E_start|
    pub fn relative_energy_drift(&self) -> f64 {
        ((self.final_energy - self.initial_energy) / self.initial_energy).abs()
    }
}

pub struct Engine {
    system: System,
    integrator: Box<dyn Integrator>,
    recorder: StateRecorder,
    step_control: StepControl,
}

impl Engine {
    /// Start at `initial_time`, truncating the output file at `output`
    pub fn new(
        initial_time: f64,
        output: impl AsRef<Path>,
        integrator: Box<dyn Integrator>,
    ) -> Result<Self> {
        if !initial_time.is_finite() {
            return Err(SimError::InvalidParameter(format!("initial time = {initial_time}")));
        }
        Ok(Self {
            system: System::new(initial_time),
            integrator,
            recorder: StateRecorder::create(output)?,
            step_control: StepControl::default(),
        })
    }

    pub fn with_step_control(mut self, step_control: StepControl) -> Self {
        self.step_control = step_control;
        self
    }

    /// Append a body. Mass must be positive and every component finite
    pub fn add_object(&mut self, body: Body) -> Result<()> {
        if !(body.m.is_finite() && body.m > 0.0) {
            return Err(SimError::InvalidBody(format!("mass must be positive, got {}", body.m)));
        }
        if !(body.x.iter().all(|c| c.is_finite()) && body.v.iter().all(|c| c.is_finite())) {
            return Err(SimError::InvalidBody(format!(
                "non-finite position {:?} or velocity {:?}",
                body.x, body.v
            )));
        }
        self.system.bodies.push(body);
        Ok(())
    }

    pub fn time(&self) -> f64 {
        self.system.t
    }

    pub fn system(&self) -> &System {
        &self.system
    }

    pub fn bodies(&self) -> &[Body] {
        &self.system.bodies
    }

    pub fn integrator_name(&self) -> &'static str {
        self.integrator.name()
    }

    pub fn step_control(&self) -> &StepControl {
        &self.step_control
    }

    pub fn output_path(&self) -> &Path {
        self.recorder.path()
    }

    /// Evaluate the total energy now, shifting the stored value into the previous slot
    pub fn calculate_total_energy(&mut self) -> Result<f64> {
        self.system.calculate_total_energy()
    }

    /// Run until `params.final_time`.
    ///
    /// With `output_time == 0` every iteration writes a snapshot before its
    /// step; otherwise snapshots land exactly on multiples of `output_time`
    /// after the start time. Neither mode writes the state at the end time.
    /// With `adaptive_steps` the step follows [`StepControl::adjust`].
    pub fn simulate(&mut self, params: &Parameters) -> Result<RunReport> {
        params.validate()?;
        self.step_control.validate()?;

        let ctl = self.step_control.clone();
        let mut session = self.recorder.session()?;
        let mut schedule = OutputSchedule::new(params.output_time, self.system.t, ctl.time_tolerance);

        self.system.calculate_accelerations()?;
        // Prime the energy so the first drift comparison has a real reference
        let initial_energy = self.system.calculate_total_energy()?;

        info!(
            bodies = self.system.bodies.len(),
            integrator = self.integrator.name(),
            t0 = self.system.t,
            final_time = params.final_time,
            adaptive = params.adaptive_steps,
            "starting run"
        );

        let mut step = params.time_step;
        let mut steps = 0usize;

        while !ctl.reached(self.system.t, params.final_time) {
            let energy = self.system.calculate_total_energy()?;

            if params.adaptive_steps {
                let next = ctl.adjust(step, energy, self.system.total_energy_previous)?;
                if next != step {
                    debug!(t = self.system.t, from = step, to = next, "step size changed");
                    if next == ctl.min_step || next == ctl.max_step {
                        warn!(t = self.system.t, step = next, "step size at clamp bound");
                    }
                }
                step = next;
            }

            if schedule.is_due(self.system.t) {
                session.record(&Snapshot::capture(self.system.t, energy, &self.system.bodies))?;
                debug!(t = self.system.t, energy, "snapshot written");
                schedule.advance();
            }

            let (dt, landing) = schedule.clamp(self.system.t, step);

            self.integrator.advance(&mut self.system, dt)?;
            self.system.t = landing.unwrap_or(self.system.t + dt);
            steps += 1;
        }

        let final_energy = self.system.calculate_total_energy()?;
        let snapshots = session.finish()?;

        let report = RunReport {
            steps,
            snapshots,
            final_time: self.system.t,
            final_step: step,
            initial_energy,
            final_energy,
        };

        info!(
            steps,
            snapshots,
            t = self.system.t,
            drift = report.relative_energy_drift(),
            "run finished"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::integrator::{Leapfrog, Rk2};
    use crate::simulation::recorder::read_snapshots;
    use crate::simulation::states::NVec3;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("nbody-engine-{}-{name}.dat", std::process::id()))
    }

    fn binary_engine(name: &str) -> Engine {
        let mut engine = Engine::new(0.0, temp_path(name), Box::new(Leapfrog)).unwrap();
        engine
            .add_object(Body::new(NVec3::new(-0.5, 0.0, 0.0), NVec3::new(0.0, -0.5, 0.0), 1.0))
            .unwrap();
        engine
            .add_object(Body::new(NVec3::new(0.5, 0.0, 0.0), NVec3::new(0.0, 0.5, 0.0), 1.0))
            .unwrap();
        engine
    }

    #[test]
    fn rejects_bad_mass() {
        let mut engine = Engine::new(0.0, temp_path("mass"), Box::new(Rk2)).unwrap();
        for m in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = engine.add_object(Body::new(NVec3::zeros(), NVec3::zeros(), m));
            assert!(matches!(err, Err(SimError::InvalidBody(_))), "mass {m} accepted");
        }
        let err = engine.add_object(Body::new(NVec3::new(f64::NAN, 0.0, 0.0), NVec3::zeros(), 1.0));
        assert!(matches!(err, Err(SimError::InvalidBody(_))));
        assert!(engine.bodies().is_empty());
    }

    #[test]
    fn rejects_bad_parameters() {
        let mut engine = binary_engine("params");
        let params = Parameters {
            final_time: 1.0,
            time_step: -0.1,
            output_time: 0.0,
            adaptive_steps: false,
        };
        assert!(matches!(engine.simulate(&params), Err(SimError::InvalidParameter(_))));
    }

    #[test]
    fn coincident_bodies_fail_fast() {
        let mut engine = Engine::new(0.0, temp_path("coincident"), Box::new(Leapfrog)).unwrap();
        engine.add_object(Body::new(NVec3::zeros(), NVec3::zeros(), 1.0)).unwrap();
        engine.add_object(Body::new(NVec3::zeros(), NVec3::zeros(), 1.0)).unwrap();
        let params = Parameters {
            final_time: 1.0,
            time_step: 0.1,
            output_time: 0.0,
            adaptive_steps: false,
        };
        assert!(matches!(
            engine.simulate(&params),
            Err(SimError::DegenerateConfiguration(_))
        ));
    }

    #[test]
    fn zero_energy_with_adaptive_steps_is_degenerate() {
        // Two unit masses 4 apart: KE = 1/4 = -PE
        let mut engine = Engine::new(0.0, temp_path("zero-energy"), Box::new(Leapfrog)).unwrap();
        engine
            .add_object(Body::new(NVec3::new(-2.0, 0.0, 0.0), NVec3::new(0.0, -0.5, 0.0), 1.0))
            .unwrap();
        engine
            .add_object(Body::new(NVec3::new(2.0, 0.0, 0.0), NVec3::new(0.0, 0.5, 0.0), 1.0))
            .unwrap();
        let params = Parameters {
            final_time: 1.0,
            time_step: 0.01,
            output_time: 0.0,
            adaptive_steps: true,
        };
        assert!(matches!(
            engine.simulate(&params),
            Err(SimError::DegenerateConfiguration(_))
        ));
    }

    #[test]
    fn consecutive_runs_append_and_continue_time() {
        let mut engine = binary_engine("append");
        let first = Parameters {
            final_time: 1.0,
            time_step: 0.25,
            output_time: 0.0,
            adaptive_steps: false,
        };
        let report = engine.simulate(&first).unwrap();
        assert_eq!(report.steps, 4);
        assert_eq!(report.snapshots, 4);

        let second = Parameters { final_time: 2.0, ..first };
        engine.simulate(&second).unwrap();

        let snaps = read_snapshots(engine.output_path()).unwrap();
        assert_eq!(snaps.len(), 8);
        assert_eq!(snaps[4].time, 1.0);
        std::fs::remove_file(engine.output_path()).ok();
    }

    #[test]
    fn interval_output_skips_start_and_end_instants() {
        let mut engine = binary_engine("interval-ends");
        let params = Parameters {
            final_time: 1.0,
            time_step: 0.01,
            output_time: 0.25,
            adaptive_steps: false,
        };
        let report = engine.simulate(&params).unwrap();
        let snaps = read_snapshots(engine.output_path()).unwrap();

        let times: Vec<f64> = snaps.iter().map(|s| s.time).collect();
        assert_eq!(times, vec![0.25, 0.5, 0.75]);
        assert_eq!(report.snapshots, 3);
        assert_eq!(report.final_time, 1.0);
        std::fs::remove_file(engine.output_path()).ok();
    }

    #[test]
    fn recorded_energy_matches_state() {
        let mut engine = binary_engine("energy-line");
        let params = Parameters {
            final_time: 0.3,
            time_step: 0.1,
            output_time: 0.0,
            adaptive_steps: false,
        };
        engine.simulate(&params).unwrap();
        let snaps = read_snapshots(engine.output_path()).unwrap();
        assert_eq!(snaps[0].total_energy, -0.75);
        assert_eq!(snaps[0].states[1].1, NVec3::new(0.0, 0.5, 0.0));
        std::fs::remove_file(engine.output_path()).ok();
    }
}

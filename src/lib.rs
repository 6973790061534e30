pub mod error;
pub mod simulation;
pub mod configuration;
pub mod benchmark;

pub use error::{Result, SimError};

pub use simulation::states::{Body, System, NVec3};
pub use simulation::forces::{accumulate_accels, pair_force, total_energy};
pub use simulation::integrator::{Integrator, IntegratorKind, Leapfrog, Rk2, Rk4};
pub use simulation::params::{Parameters, StepControl};
pub use simulation::engine::{Engine, RunReport};
pub use simulation::recorder::{Snapshot, StateRecorder, read_snapshots};
pub use simulation::scenario::Scenario;

pub use configuration::config::{EngineConfig, ParametersConfig, BodyConfig, RandomCloudConfig, ScenarioConfig};

pub use benchmark::benchmark::{bench_gravity, bench_integrators, BenchRow};

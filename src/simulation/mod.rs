pub mod states;
pub mod params;
pub mod engine;
pub mod forces;
pub mod integrator;
pub mod schedule;
pub mod recorder;
pub mod scenario;

use std::time::Instant;

use crate::error::Result;
use crate::simulation::forces::{accumulate_accels, total_energy};
use crate::simulation::integrator::IntegratorKind;
use crate::simulation::states::{Body, NVec3, System};

/// One measured (body count, integrator) pair
#[derive(Debug, Clone, PartialEq)]
pub struct BenchRow {
    pub n: usize,
    pub integrator: IntegratorKind,
    pub ms_per_step: f64,
    pub energy_drift: f64, // relative, after all timed steps
}

/// Time one direct-summation force evaluation for each body count.
/// Returns (n, milliseconds) pairs
pub fn bench_gravity(ns: &[usize]) -> Result<Vec<(usize, f64)>> {
    let mut rows = Vec::with_capacity(ns.len());

    for &n in ns {
        let sys = make_system(n);
        let mut out = vec![NVec3::zeros(); n];

        // Warm up
        accumulate_accels(&sys.bodies, &mut out)?;

        let t0 = Instant::now();
        accumulate_accels(&sys.bodies, &mut out)?;
        let ms = t0.elapsed().as_secs_f64() * 1000.0;

        println!("N = {n:5}, direct = {ms:10.4} ms");
        rows.push((n, ms));
    }
    Ok(rows)
}

/// Run `steps` fixed steps of size `dt` with every integrator for each body
/// count, reporting cost per step and relative energy drift
pub fn bench_integrators(ns: &[usize], steps: usize, dt: f64) -> Result<Vec<BenchRow>> {
    println!("N,integrator,ms_per_step,energy_drift");

    let mut rows = Vec::new();
    for &n in ns {
        let template = make_system(n);
        let e0 = total_energy(&template.bodies)?;

        for integrator in IntegratorKind::ALL {
            let mut sys = template.clone();
            sys.calculate_accelerations()?;
            let stepper = integrator.build();

            let t0 = Instant::now();
            for _ in 0..steps {
                stepper.advance(&mut sys, dt)?;
            }
            let ms_per_step = t0.elapsed().as_secs_f64() * 1000.0 / steps.max(1) as f64;
            let energy_drift = ((total_energy(&sys.bodies)? - e0) / e0).abs();

            println!("{n},{integrator},{ms_per_step:.6},{energy_drift:.3e}");
            rows.push(BenchRow {
                n,
                integrator,
                ms_per_step,
                energy_drift,
            });
        }
    }
    Ok(rows)
}

/// Deterministic cloud of `n` bodies with total mass 1, no rand needed
fn make_system(n: usize) -> System {
    let mut sys = System::new(0.0);
    let m = 1.0 / n.max(1) as f64;

    for i in 0..n {
        let i_f = i as f64;
        let x = NVec3::new(
            (i_f * 0.37).sin() * 5.0,
            (i_f * 0.13).cos() * 5.0,
            (i_f * 0.07).sin() * 5.0,
        );
        // slow rotation about z
        let v = 0.05 * NVec3::new(-x.y, x.x, 0.0);
        sys.bodies.push(Body::new(x, v, m));
    }
    sys
}

//! Newtonian gravity and energy bookkeeping for the n-body engine
//!
//! Direct O(N^2) summation with G = 1 and no softening. Coincident bodies
//! are reported as [`SimError::DegenerateConfiguration`] instead of letting
//! infinities leak into the state.

use crate::error::{Result, SimError};
use crate::simulation::states::{Body, NVec3};

/// Displacement from `bi` to `bj` and its squared length, failing on zero separation
fn separation(bi: &Body, bj: &Body) -> Result<(NVec3, f64)> {
    let r = bj.x - bi.x;
    let r2 = r.dot(&r);
    if r2 == 0.0 {
        return Err(SimError::DegenerateConfiguration(format!(
            "two bodies share position ({}, {}, {})",
            bi.x.x, bi.x.y, bi.x.z
        )));
    }
    Ok((r, r2))
}

/// Gravitational force exerted on `bi` by `bj`:
/// F = m_i * m_j * (x_j - x_i) / |x_j - x_i|^3
pub fn pair_force(bi: &Body, bj: &Body) -> Result<NVec3> {
    let (r, r2) = separation(bi, bj)?;
    let inv_r3 = (r2 * r2.sqrt()).recip();
    Ok(bi.m * bj.m * inv_r3 * r)
}

/// Compute the gravitational acceleration of every body into `out`.
/// - `out[i]` is overwritten with sum_{j != i} m_j (x_j - x_i) / |x_j - x_i|^3
pub fn accumulate_accels(bodies: &[Body], out: &mut [NVec3]) -> Result<()> {
    if out.len() != bodies.len() {
        return Err(SimError::InvalidParameter(format!(
            "acceleration buffer holds {} entries for {} bodies",
            out.len(),
            bodies.len()
        )));
    }

    // Zero buffer
    for a in out.iter_mut() {
        *a = NVec3::zeros();
    }

    // Each unordered pair (i, j) with i < j is visited once; the self term never appears
    let n = bodies.len();
    for i in 0..n {
        let bi = &bodies[i];
        for j in (i + 1)..n {
            let bj = &bodies[j];

            // r points from i to j: i is pulled along +r, j along -r
            let (r, r2) = separation(bi, bj)?;
            let inv_r3 = (r2 * r2.sqrt()).recip();

            out[i] += bj.m * inv_r3 * r;
            out[j] -= bi.m * inv_r3 * r;
        }
    }
    Ok(())
}

pub fn kinetic_energy(bodies: &[Body]) -> f64 {
    bodies.iter().map(Body::kinetic_energy).sum()
}

/// -sum_{j<i} m_i m_j / |x_i - x_j|, every pair counted once
pub fn potential_energy(bodies: &[Body]) -> Result<f64> {
    let mut e_pot = 0.0;
    for (i, bi) in bodies.iter().enumerate() {
        for bj in &bodies[..i] {
            let (_, r2) = separation(bi, bj)?;
            e_pot -= bi.m * bj.m / r2.sqrt();
        }
    }
    Ok(e_pot)
}

pub fn total_energy(bodies: &[Body]) -> Result<f64> {
    Ok(kinetic_energy(bodies) + potential_energy(bodies)?)
}

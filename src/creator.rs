// SPDX-License-Identifier: AGPL-3.0-only

//! Particle creation from a sampled Gauss-constraint field.
//!
//! The creator converts the Gauss-law violation of the initial fields into
//! a lightlike particle ensemble whose NGP deposition reproduces that
//! charge density. Spawning covers only the longitudinal block where the
//! constraint magnitude exceeds a small fraction of its maximum; cells
//! outside are treated as vacuum, trading a tiny boundary Gauss-law
//! violation for far fewer particles.
//!
//! The per-cell charges are then smoothed by deterministic relaxation
//! along each transverse line: a fixed number of sweeps with a centered
//! third-difference stencil, followed by the same number with a
//! fifth-difference stencil. The passes redistribute charge between
//! neighbouring sub-cell slots; the last slot of each NGP group is
//! excluded because moving flux out of it would change the per-cell totals
//! the NGP scheme must preserve.

use crate::algebra::AlgebraElement;
use crate::error::GlasmaError;
use crate::grid::{cell_index_of, cell_pos_of, insert_dim, nearest_grid_point, reduce_dim};
use crate::particle::{CgcParticle, Particle};
use crate::simulation::Simulation;

/// Fraction of the maximum constraint magnitude below which a cell is
/// treated as vacuum.
const VACUUM_CUTOFF_FRACTION: f64 = 1e-11;

/// Position epsilon stabilizing round/floor against accumulated error.
const ROUNDING_MARGIN: f64 = 1e-11;

/// Relaxation sweeps per stencil.
const REFINEMENT_ITERATIONS: usize = 100;

pub struct LightConeNgpParticleCreator {
    gauss_constraint: Vec<AlgebraElement>,
    direction: usize,
    orientation: i32,
}

impl Default for LightConeNgpParticleCreator {
    fn default() -> Self {
        Self::new()
    }
}

impl LightConeNgpParticleCreator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            gauss_constraint: Vec::new(),
            direction: 0,
            orientation: 1,
        }
    }

    /// Stores the target charge density. The field length must match the
    /// grid it will be sampled on; that is checked in [`Self::initialize`].
    pub fn set_gauss_constraint(&mut self, field: Vec<AlgebraElement>) {
        self.gauss_constraint = field;
    }

    /// Spawns and refines the particle ensemble.
    pub fn initialize(
        &mut self,
        sim: &mut Simulation,
        direction: usize,
        orientation: i32,
    ) -> Result<(), GlasmaError> {
        let expected = sim.grid.total_cells();
        if self.gauss_constraint.len() != expected {
            return Err(GlasmaError::DimensionMismatch {
                expected,
                found: self.gauss_constraint.len(),
            });
        }
        self.direction = direction;
        self.orientation = orientation;

        let particles_per_cell = sim.settings.particles_per_cell();
        self.initialize_particles(sim, particles_per_cell);
        Ok(())
    }

    /// Samples the constraint field into `particles_per_cell` lightlike
    /// particles per cell of the charged longitudinal block, then applies
    /// the relaxation sweeps. Zero block width spawns zero particles.
    pub fn initialize_particles(&mut self, sim: &mut Simulation, particles_per_cell: usize) {
        let a_s = sim.grid.lattice_spacing();
        let a_t = sim.grid.temporal_spacing();
        let dims = sim.grid.shape().to_vec();
        let trans_dims = reduce_dim(&dims, self.direction);
        let total_trans: usize = trans_dims.iter().product();
        let long_cells = dims[self.direction];

        // Peak constraint magnitude over the whole grid.
        let mut max_charge = 0.0f64;
        for q in &self.gauss_constraint {
            max_charge = max_charge.max(q.square().sqrt());
        }
        let cutoff = max_charge * VACUUM_CUTOFF_FRACTION;

        // Longitudinal extent of the charged block.
        let mut z_start = 0;
        let mut z_end = long_cells - 1;
        let mut found_start = false;
        for z in 0..long_cells {
            let mut slice_max = 0.0f64;
            for k in 0..total_trans {
                let trans_pos = cell_pos_of(k, &trans_dims);
                let pos = insert_dim(&trans_pos, self.direction, z as i64);
                let i = sim.grid.cell_index(&pos);
                slice_max = slice_max.max(self.gauss_constraint[i].square().sqrt());
            }
            if found_start {
                if slice_max < cutoff {
                    z_end = z - 1;
                    break;
                }
            } else if slice_max > cutoff {
                z_start = z;
                found_start = true;
            }
        }
        if !found_start {
            // Vacuum everywhere: zero-width block, nothing to spawn.
            return;
        }

        // Spawn the ensemble, remembering each transverse line's
        // longitudinal particle ordering for the refinement passes.
        let mut spawned: Vec<CgcParticle> = Vec::new();
        let mut lines: Vec<Vec<usize>> = vec![Vec::new(); total_trans];
        let margin = ROUNDING_MARGIN * a_s;

        for z in z_start..=z_end {
            for k in 0..total_trans {
                let trans_pos = cell_pos_of(k, &trans_dims);
                let grid_pos = insert_dim(&trans_pos, self.direction, z as i64);

                for j in 0..particles_per_cell {
                    let offset = (j as f64 - (particles_per_cell / 2) as f64)
                        / particles_per_cell as f64;
                    let dz = offset * a_s;

                    let mut p = CgcParticle::new(dims.len(), sim.grid.factory(), self.direction);
                    for (n, x) in grid_pos.iter().enumerate() {
                        let base = *x as f64 * a_s + margin;
                        p.pos0[n] = base;
                        p.pos1[n] = base;
                        if n == self.direction {
                            p.pos0[n] += dz;
                            p.pos1[n] += f64::from(self.orientation) * a_t + dz;
                            p.vel[n] = f64::from(self.orientation);
                        }
                    }

                    let ngp = nearest_grid_point(&p.pos0, a_s);
                    let cell = sim.grid.cell_index(&ngp);
                    p.q0 = self.gauss_constraint[cell].mult(1.0 / particles_per_cell as f64);
                    p.q1 = p.q0;

                    lines[k].push(spawned.len());
                    spawned.push(p);
                }
            }
        }

        // Deterministic relaxation along each transverse line.
        for line in &lines {
            for _ in 0..REFINEMENT_ITERATIONS {
                for j in 0..line.len() {
                    refine2(j, line, &mut spawned, particles_per_cell);
                }
            }
            for _ in 0..REFINEMENT_ITERATIONS {
                for j in 0..line.len() {
                    refine4(j, line, &mut spawned, particles_per_cell);
                }
            }
        }

        // Both charge buffers start out equal.
        for p in &mut spawned {
            p.q1 = p.q0;
        }

        sim.particles
            .extend(spawned.into_iter().map(Particle::Cgc));
    }
}

fn pmod(i: i64, n: usize) -> usize {
    i.rem_euclid(n as i64) as usize
}

/// Centered third-difference relaxation:
/// `ΔQ = (−Q_{i−1} + 3Q_i − 3Q_{i+1} + Q_{i+2}) / 4`, applied
/// antisymmetrically to `Q_i` and `Q_{i+1}`. The last slot of each NGP
/// group is skipped.
pub fn refine2(i: usize, line: &[usize], particles: &mut [CgcParticle], per_cell: usize) {
    let n = line.len();
    if n == 0 || i % per_cell >= per_cell - 1 {
        return;
    }
    let i = i as i64;
    let q0 = particles[line[pmod(i - 1, n)]].q0;
    let q1 = particles[line[pmod(i, n)]].q0;
    let q2 = particles[line[pmod(i + 1, n)]].q0;
    let q3 = particles[line[pmod(i + 2, n)]].q0;

    let mut dq = q0.mult(-1.0);
    dq.add_assign(&q1.mult(3.0));
    dq.add_assign(&q2.mult(-3.0));
    dq.add_assign(&q3);
    dq.mult_assign(0.25);

    particles[line[pmod(i, n)]].q0.add_assign(&dq.mult(-1.0));
    particles[line[pmod(i + 1, n)]].q0.add_assign(&dq);
}

/// Centered fifth-difference relaxation:
/// `ΔQ = (Q_{i−2} − 5Q_{i−1} + 10Q_i − 10Q_{i+1} + 5Q_{i+2} − Q_{i+3}) / 12`.
pub fn refine4(i: usize, line: &[usize], particles: &mut [CgcParticle], per_cell: usize) {
    let n = line.len();
    if n == 0 || i % per_cell >= per_cell - 1 {
        return;
    }
    let i = i as i64;
    let q0 = particles[line[pmod(i - 2, n)]].q0;
    let q1 = particles[line[pmod(i - 1, n)]].q0;
    let q2 = particles[line[pmod(i, n)]].q0;
    let q3 = particles[line[pmod(i + 1, n)]].q0;
    let q4 = particles[line[pmod(i + 2, n)]].q0;
    let q5 = particles[line[pmod(i + 3, n)]].q0;

    let mut dq = q0;
    dq.add_assign(&q1.mult(-5.0));
    dq.add_assign(&q2.mult(10.0));
    dq.add_assign(&q3.mult(-10.0));
    dq.add_assign(&q4.mult(5.0));
    dq.add_assign(&q5.mult(-1.0));
    dq.mult_assign(1.0 / 12.0);

    particles[line[pmod(i, n)]].q0.add_assign(&dq.mult(-1.0));
    particles[line[pmod(i + 1, n)]].q0.add_assign(&dq);
}

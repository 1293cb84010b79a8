// SPDX-License-Identifier: AGPL-3.0-only

//! Nearest-grid-point (NGP) particle-mesh coupling.
//!
//! Particles act as moving sources for the lattice fields. Each step a
//! particle's move is classified by comparing the nearest grid points of
//! its old and new position along the motion axis:
//!
//! - *one-cell move*: the NGP did not change; the particle deposits only
//!   its charge, no current, and no parallel transport is needed.
//! - *two-cell move*: a cell boundary was crossed; the current
//!   `J = ±Q·(a_s/a_t)` compensates the charge displacement exactly, and
//!   the interpolator stashes the provisional link for the lazy charge
//!   transport performed by the particle solver.
//!
//! All deposits are commutative adds into step-local buffers, so the
//! per-particle work parallelizes with a fold/reduce over rayon workers;
//! particle order never affects the result.

use rayon::prelude::*;

use crate::algebra::{AlgebraElement, GroupElement};
use crate::grid::{nearest_grid_point, Grid};
use crate::particle::{CgcParticle, Particle, WongParticle};

/// Step-local charge/current accumulator, one per rayon worker.
pub struct DepositBuffer {
    rho: Vec<AlgebraElement>,
    j: Vec<AlgebraElement>,
    dimensions: usize,
}

impl DepositBuffer {
    #[must_use]
    pub fn new(grid: &Grid) -> Self {
        let zero = grid.factory().algebra_zero();
        let total = grid.total_cells();
        let d = grid.dimensions();
        Self {
            rho: vec![zero; total],
            j: vec![zero; total * d],
            dimensions: d,
        }
    }

    fn add_rho(&mut self, cell: usize, q: &AlgebraElement) {
        self.rho[cell].add_assign(q);
    }

    fn add_j(&mut self, cell: usize, direction: usize, q: &AlgebraElement) {
        self.j[cell * self.dimensions + direction].add_assign(q);
    }

    fn merge(mut self, other: Self) -> Self {
        for (a, b) in self.rho.iter_mut().zip(&other.rho) {
            a.add_assign(b);
        }
        for (a, b) in self.j.iter_mut().zip(&other.j) {
            a.add_assign(b);
        }
        self
    }

    /// Flushes the accumulated sources onto the grid.
    pub fn apply(&self, grid: &mut Grid) {
        for (cell, q) in self.rho.iter().enumerate() {
            grid.add_rho(cell, q);
        }
        for (slot, q) in self.j.iter().enumerate() {
            grid.add_j(slot / self.dimensions, slot % self.dimensions, q);
        }
    }
}

/// Deposits a particle's charge at the NGP of its previous position.
pub fn interpolate_charge_density(p: &Particle, grid: &Grid, buf: &mut DepositBuffer) {
    match p {
        Particle::Cgc(p) => {
            let ngp = nearest_grid_point(&p.pos0, grid.lattice_spacing());
            buf.add_rho(grid.cell_index(&ngp), &p.q0);
        }
        Particle::Wong(p) => {
            let ngp = nearest_grid_point(&[p.pos0], grid.lattice_spacing());
            buf.add_rho(grid.cell_index(&ngp), &p.q0);
        }
    }
}

/// Deposits the compensating current of a boundary crossing.
pub fn interpolate_to_grid(p: &Particle, grid: &Grid, buf: &mut DepositBuffer) {
    match p {
        Particle::Cgc(p) => deposit_current(
            &p.pos0,
            &p.pos1,
            p.vel[p.direction],
            p.direction,
            &p.q0,
            &p.q1,
            grid,
            buf,
        ),
        Particle::Wong(p) => deposit_current(
            &[p.pos0],
            &[p.pos1],
            p.vel,
            0,
            &p.q0,
            &p.q1,
            grid,
            buf,
        ),
    }
}

#[allow(clippy::too_many_arguments)]
fn deposit_current(
    pos0: &[f64],
    pos1: &[f64],
    velocity: f64,
    direction: usize,
    q0: &AlgebraElement,
    q1: &AlgebraElement,
    grid: &Grid,
    buf: &mut DepositBuffer,
) {
    let a_s = grid.lattice_spacing();
    let a_t = grid.temporal_spacing();
    let ngp_old = nearest_grid_point(pos0, a_s);
    let ngp_new = nearest_grid_point(pos1, a_s);

    if ngp_old[direction] == ngp_new[direction] {
        // One-cell move: the charge did not leave its cell.
        return;
    }
    if velocity > 0.0 {
        buf.add_j(grid.cell_index(&ngp_old), direction, &q0.mult(a_s / a_t));
    } else {
        buf.add_j(grid.cell_index(&ngp_new), direction, &q1.mult(-a_s / a_t));
    }
}

/// Reads the updated links back to the particle: on a boundary crossing
/// the provisional link (or its adjoint for a backward move) is stashed
/// for the lazy charge transport. Wong particles also sample the electric
/// field at their new NGP.
pub fn interpolate_to_particle(p: &mut Particle, grid: &Grid) {
    let a_s = grid.lattice_spacing();
    match p {
        Particle::Cgc(p) => {
            let ngp_old = nearest_grid_point(&p.pos0, a_s);
            let ngp_new = nearest_grid_point(&p.pos1, a_s);
            if ngp_old[p.direction] != ngp_new[p.direction] {
                stash_transport(p.vel[p.direction], p.direction, &ngp_old, &ngp_new, grid, &mut p.transport);
                p.update_charge = true;
            }
        }
        Particle::Wong(p) => {
            let ngp_old = nearest_grid_point(&[p.pos0], a_s);
            let ngp_new = nearest_grid_point(&[p.pos1], a_s);
            if ngp_old[0] != ngp_new[0] {
                stash_transport(p.vel, 0, &ngp_old, &ngp_new, grid, &mut p.transport);
                p.update_charge = true;
            }
            p.e_field = grid.e(grid.cell_index(&ngp_new), 0);
        }
    }
}

fn stash_transport(
    velocity: f64,
    direction: usize,
    ngp_old: &[i64],
    ngp_new: &[i64],
    grid: &Grid,
    transport: &mut GroupElement,
) {
    *transport = if velocity > 0.0 {
        grid.u_next(grid.cell_index(ngp_old), direction)
    } else {
        grid.u_next(grid.cell_index(ngp_new), direction).adj()
    };
}

/// Deposits charge density and boundary currents for the whole particle
/// collection, rayon-parallel with per-worker buffers merged once.
pub fn deposit_all(particles: &[Particle], grid: &mut Grid) {
    let merged = particles
        .par_iter()
        .fold(
            || DepositBuffer::new(grid),
            |mut buf, p| {
                interpolate_charge_density(p, grid, &mut buf);
                interpolate_to_grid(p, grid, &mut buf);
                buf
            },
        )
        .reduce(|| DepositBuffer::new(grid), DepositBuffer::merge);
    merged.apply(grid);
}

/// Runs the link read-back for the whole collection in parallel; the grid
/// is frozen during this phase.
pub fn update_all_particles(particles: &mut [Particle], grid: &Grid) {
    particles
        .par_iter_mut()
        .for_each(|p| interpolate_to_particle(p, grid));
}

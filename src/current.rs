// SPDX-License-Identifier: AGPL-3.0-only

//! Current generators: physical source models that feed the lattice.
//!
//! [`ParticleLcCurrent`] models a thin sheet of point color charges moving
//! at light speed along one grid axis. The transverse charge layout is
//! cleaned of its monopole and dipole moments (a periodic lattice admits
//! no net charge, and the leading dipole contaminates long-range
//! correlators), solved into fields by the light-cone Poisson solver, and
//! then carried by an internal particle ensemble using the
//! charge-conserving two-site deposition scheme: charges are spread over
//! the two neighbouring sites with linear weights after rotation by
//! fractional sub-cell links `exp(d · log U)`, so the deposited currents
//! match the time derivative of the interpolated charge exactly.
//!
//! Link usage follows the leapfrog ordering: charge at the new position
//! couples through the current link `U`, charge referencing the old
//! position through the provisional link `Unext`.

use crate::algebra::{AlgebraElement, ElementFactory, GroupElement};
use crate::error::GlasmaError;
use crate::grid::{cell_index_of, cell_pos_of, floored_grid_point, nearest_grid_point, reduce_dim};
use crate::particle::CgcParticle;
use crate::poisson::LightConePoissonSolver;
use crate::simulation::Simulation;

/// Spawn threshold on the squared constraint magnitude, relative to `g a_s`.
const SPAWN_THRESHOLD: f64 = 1e-17;

struct PointCharge {
    location: Vec<f64>,
    color_direction: Vec<f64>,
    magnitude: f64,
}

pub struct ParticleLcCurrent {
    direction: usize,
    orientation: i32,
    location: f64,
    longitudinal_width: f64,
    charges: Vec<PointCharge>,
    trans_dims: Vec<usize>,
    trans_density: Vec<AlgebraElement>,
    particles: Vec<CgcParticle>,
}

impl ParticleLcCurrent {
    #[must_use]
    pub fn new(direction: usize, orientation: i32, location: f64, longitudinal_width: f64) -> Self {
        Self {
            direction,
            orientation,
            location,
            longitudinal_width,
            charges: Vec::new(),
            trans_dims: Vec::new(),
            trans_density: Vec::new(),
            particles: Vec::new(),
        }
    }

    /// Registers a point charge with a normalized color direction.
    pub fn add_charge(
        &mut self,
        location: Vec<f64>,
        color_direction: Vec<f64>,
        magnitude: f64,
    ) -> Result<(), GlasmaError> {
        let norm = color_direction.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm == 0.0 {
            return Err(GlasmaError::InvalidSettings(
                "point charge color direction has zero norm".into(),
            ));
        }
        let normalized = color_direction.iter().map(|v| v / norm).collect();
        self.charges.push(PointCharge {
            location,
            color_direction: normalized,
            magnitude,
        });
        Ok(())
    }

    /// Builds the transverse charge density, solves for the initial
    /// fields, spawns the carrier particles and applies the first current
    /// step.
    pub fn initialize_current(&mut self, sim: &mut Simulation) -> Result<(), GlasmaError> {
        let factory = *sim.grid.factory();
        let components = factory.n_components();
        let a_s = sim.grid.lattice_spacing();
        let d = sim.grid.dimensions();

        self.trans_dims = reduce_dim(sim.grid.shape(), self.direction);
        let total_trans: usize = self.trans_dims.iter().product();
        self.trans_density = vec![factory.algebra_zero(); total_trans];

        for c in &self.charges {
            if c.color_direction.len() != components {
                return Err(GlasmaError::DimensionMismatch {
                    expected: components,
                    found: c.color_direction.len(),
                });
            }
            let mut amplitude = factory.algebra_zero();
            for (j, dir) in c.color_direction.iter().enumerate() {
                amplitude.set(j, dir * c.magnitude / a_s.powi(d as i32 - 1));
            }
            let ngp = nearest_grid_point(&c.location, a_s);
            let index = cell_index_of(&ngp, &self.trans_dims);
            self.trans_density[index].add_assign(&amplitude);
        }

        self.remove_monopole_moment(&factory);
        self.remove_dipole_moment(&factory, a_s);

        let mut solver = LightConePoissonSolver::new(
            self.direction,
            self.orientation,
            self.location,
            self.longitudinal_width,
            self.trans_density.clone(),
            self.trans_dims.clone(),
        );
        solver.initialize(&sim.settings);
        solver.solve(&mut sim.grid);

        self.initialize_particles(sim, &solver);
        self.apply_current(sim);
        Ok(())
    }

    /// Per-step work: advance and transport the carriers, drop escapees,
    /// deposit the charge-conserving currents.
    pub fn apply_current(&mut self, sim: &mut Simulation) {
        self.evolve_charges(sim);
        self.remove_particles(sim);
        self.interpolate_charges_and_currents(sim);
    }

    /// Subtracts the mean so the total transverse charge is exactly zero.
    fn remove_monopole_moment(&mut self, factory: &ElementFactory) {
        let total = self.total_charge(factory);
        let mean = total.mult(1.0 / self.trans_density.len() as f64);
        for q in &mut self.trans_density {
            q.add_assign(&mean.mult(-1.0));
        }
    }

    /// Cancels the leading dipole moment per color component by adding a
    /// compensating charge pair around the center of absolute charge.
    /// Components with zero total absolute charge are skipped.
    fn remove_dipole_moment(&mut self, factory: &ElementFactory, a_s: f64) {
        let total_trans = self.trans_density.len();
        let trans_d = self.trans_dims.len();

        for c in 0..factory.n_components() {
            let Some(center) = self.center_of_abs_charge(c, a_s) else {
                continue;
            };
            let average_dist = self.average_distance(c, a_s, &center);
            if average_dist == 0.0 {
                continue;
            }

            let mut dipole_charge = 0.0;
            let mut dipole_vector = vec![0.0; trans_d];
            for i in 0..total_trans {
                let pos = cell_pos_of(i, &self.trans_dims);
                let charge = self.trans_density[i].get(c);
                let mut dist = 0.0;
                for j in 0..trans_d {
                    let dx = pos[j] as f64 * a_s - center[j];
                    dist += dx * dx;
                    dipole_vector[j] += charge * dx;
                }
                dipole_charge += charge * dist.sqrt() / average_dist;
            }
            if dipole_charge == 0.0 {
                continue;
            }
            for v in &mut dipole_vector {
                *v /= dipole_charge * average_dist;
            }

            let mut pos1 = center.clone();
            let mut pos2 = center.clone();
            for j in 0..trans_d {
                pos1[j] += dipole_vector[j] * average_dist / 2.0;
                pos2[j] -= dipole_vector[j] * average_dist / 2.0;
            }
            let index1 = cell_index_of(&nearest_grid_point(&pos1, a_s), &self.trans_dims);
            let index2 = cell_index_of(&nearest_grid_point(&pos2, a_s), &self.trans_dims);

            let mut q1 = factory.algebra_zero();
            let mut q2 = factory.algebra_zero();
            q1.set(c, -dipole_charge);
            q2.set(c, dipole_charge);
            self.trans_density[index1].add_assign(&q1);
            self.trans_density[index2].add_assign(&q2);
        }
    }

    fn total_charge(&self, factory: &ElementFactory) -> AlgebraElement {
        let mut total = factory.algebra_zero();
        for q in &self.trans_density {
            total.add_assign(q);
        }
        total
    }

    /// Charge-weighted center of one component's absolute charge; `None`
    /// for a vanishing component (degenerate, safe to skip).
    fn center_of_abs_charge(&self, component: usize, a_s: f64) -> Option<Vec<f64>> {
        let trans_d = self.trans_dims.len();
        let mut center = vec![0.0; trans_d];
        let mut total = 0.0;
        for (i, q) in self.trans_density.iter().enumerate() {
            let charge = q.get(component).abs();
            total += charge;
            let pos = cell_pos_of(i, &self.trans_dims);
            for j in 0..trans_d {
                center[j] += charge * pos[j] as f64 * a_s;
            }
        }
        if total == 0.0 {
            return None;
        }
        for v in &mut center {
            *v /= total;
        }
        Some(center)
    }

    fn average_distance(&self, component: usize, a_s: f64, center: &[f64]) -> f64 {
        let mut average = 0.0;
        let mut total_abs = 0.0;
        for (i, q) in self.trans_density.iter().enumerate() {
            let charge = q.get(component).abs();
            total_abs += charge;
            let pos = cell_pos_of(i, &self.trans_dims);
            let mut dist = 0.0;
            for (j, x) in pos.iter().enumerate() {
                let dx = *x as f64 * a_s - center[j];
                dist += dx * dx;
            }
            average += charge * dist.sqrt();
        }
        if total_abs == 0.0 {
            0.0
        } else {
            average / total_abs
        }
    }

    /// Spawns one carrier per cell whose Gauss violation exceeds the
    /// threshold, two time steps before the sheet location.
    fn initialize_particles(&mut self, sim: &Simulation, solver: &LightConePoissonSolver) {
        self.particles.clear();
        let a_s = sim.grid.lattice_spacing();
        let a_t = sim.grid.temporal_spacing();
        let g = sim.settings.coupling;
        let t0 = -2.0 * a_t;
        let threshold = SPAWN_THRESHOLD * g * a_s;
        let d = sim.grid.dimensions();

        for i in 0..sim.grid.total_cells() {
            let charge = solver.gauss_violation(i);
            if charge.square() <= threshold {
                continue;
            }
            let pos = sim.grid.cell_pos(i);
            let mut p = CgcParticle::new(d, sim.grid.factory(), self.direction);
            for (k, x) in pos.iter().enumerate() {
                let base = *x as f64 * a_s;
                p.pos0[k] = base;
                p.pos1[k] = base;
                if k == self.direction {
                    p.pos0[k] += t0 * f64::from(self.orientation);
                    p.pos1[k] += (t0 + a_t) * f64::from(self.orientation);
                    p.vel[k] = f64::from(self.orientation);
                }
            }
            p.q0 = charge;
            p.q1 = charge;
            self.particles.push(p);
        }
    }

    /// Fractionally-scaled sub-cell link: `exp(d · log U)` via the algebra
    /// projection.
    fn partial_link(u: &GroupElement, d: f64) -> GroupElement {
        u.proj().mult(d).exp()
    }

    fn evolve_charges(&mut self, sim: &Simulation) {
        let a_s = sim.grid.lattice_spacing();
        let a_t = sim.grid.temporal_spacing();
        let dir = self.direction;

        for p in &mut self.particles {
            p.swap();
            p.advance(a_t);

            let long_old = (p.pos0[dir] / a_s).floor() as i64;
            let long_new = (p.pos1[dir] / a_s).floor() as i64;

            if long_old == long_new {
                // One-cell move: single fractional rotation.
                let cell = sim.grid.cell_index(&floored_grid_point(&p.pos0, a_s));
                let d = (p.vel[dir] * a_t / a_s).abs();
                let u = Self::partial_link(&sim.grid.u(cell, dir), d);
                if p.vel[dir] > 0.0 {
                    p.evolve(&u);
                } else {
                    p.evolve(&u.adj());
                }
            } else {
                // Two-cell move: split the path at the crossed boundary.
                let cell_old = sim.grid.cell_index(&floored_grid_point(&p.pos0, a_s));
                let cell_new = sim.grid.cell_index(&floored_grid_point(&p.pos1, a_s));
                let boundary = (if long_old < long_new { long_new } else { long_old }) as f64;

                let d0 = (boundary - p.pos0[dir] / a_s).abs();
                let d1 = (boundary - p.pos1[dir] / a_s).abs();
                let u0 = Self::partial_link(&sim.grid.u(cell_old, dir), d0);
                let u1 = Self::partial_link(&sim.grid.u(cell_new, dir), d1);
                let u = u0.mult(&u1);

                if long_old < long_new {
                    p.evolve(&u);
                } else {
                    p.evolve(&u.adj());
                }
            }
        }
    }

    fn remove_particles(&mut self, sim: &Simulation) {
        let box_sizes: Vec<f64> = (0..sim.grid.dimensions())
            .map(|i| sim.settings.box_size(i))
            .collect();
        self.particles.retain(|p| !p.is_outside(&box_sizes));
    }

    fn interpolate_charges_and_currents(&self, sim: &mut Simulation) {
        let a_s = sim.grid.lattice_spacing();
        let a_t = sim.grid.temporal_spacing();
        let c = a_s / a_t;
        let dir = self.direction;

        for p in &self.particles {
            let grid_pos_old = floored_grid_point(&p.pos0, a_s);
            let grid_pos_new = floored_grid_point(&p.pos1, a_s);

            let cell0_old = sim.grid.cell_index(&grid_pos_old);
            let cell0_new = sim.grid.cell_index(&grid_pos_new);
            let cell1_new = sim.grid.shift(cell0_new, dir, 1);

            // Fractional distances to the surrounding lattice sites.
            let d0_new = p.pos1[dir] / a_s - grid_pos_new[dir] as f64;
            let d1_new = 1.0 - d0_new;
            let d0_old = p.pos0[dir] / a_s - grid_pos_old[dir] as f64;
            let d1_old = 1.0 - d0_old;

            // Old charge couples through the provisional link, new charge
            // through the current one.
            let u_old = sim.grid.u_next(cell0_old, dir);
            let u_new = sim.grid.u(cell0_new, dir);

            let u0_new = Self::partial_link(&u_new, d0_new);
            let u1_new = Self::partial_link(&u_new, d1_new).adj();

            // Two-site charge spread with linear weights.
            let q0_new = p.q1.act(&u0_new).mult(d1_new);
            let q1_new = p.q1.act(&u1_new).mult(d0_new);
            sim.grid.add_rho(cell0_new, &q0_new);
            sim.grid.add_rho(cell1_new, &q1_new);

            let long_old = (p.pos0[dir] / a_s).floor() as i64;
            let long_new = (p.pos1[dir] / a_s).floor() as i64;

            if long_old == long_new {
                // One-cell move: current is the time derivative of the
                // interpolated charge.
                let u0_old = Self::partial_link(&u_old, d0_old);
                let q0_old = p.q0.act(&u0_old).mult(d1_old);
                let j = q0_new.sub(&q0_old).mult(-c);
                sim.grid.add_j(cell0_new, dir, &j);
            } else {
                let u0_old = Self::partial_link(&u_old, d0_old);
                let u1_old = Self::partial_link(&u_old, d1_old).adj();
                let q0_old = p.q0.act(&u0_old).mult(d1_old);
                let q1_old = p.q0.act(&u1_old).mult(d0_old);

                if long_new > long_old {
                    // Forward crossing: the departure current is carried
                    // across the crossed link to the arrival site.
                    let j_old = q0_old.mult(c);
                    let mut j_new = j_old.act(&sim.grid.u(cell0_old, dir).adj());
                    j_new.add_assign(&q0_new.sub(&q1_old).mult(-c));
                    sim.grid.add_j(cell0_old, dir, &j_old);
                    sim.grid.add_j(cell0_new, dir, &j_new);
                } else {
                    let j_new = q0_new.mult(-c);
                    let mut j_old = j_new.act(&u_new.adj());
                    j_old.add_assign(&q1_new.sub(&q0_old).mult(-c));
                    sim.grid.add_j(cell0_old, dir, &j_old);
                    sim.grid.add_j(cell0_new, dir, &j_new);
                }
            }
        }
    }

    /// Carrier count, exposed for drivers and tests.
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    #[must_use]
    pub fn transverse_charge_density(&self) -> &[AlgebraElement] {
        &self.trans_density
    }
}

// SPDX-License-Identifier: AGPL-3.0-only

//! Initial field configurations.
//!
//! All initial conditions run in temporal gauge. The CGC chain is:
//! charge density model → light-cone Poisson solver → particle creator
//! seeded with the solver's Gauss-law violation. The pure Yang-Mills
//! conditions ([`GlasmaFluxTubes`], [`PlanePulse`]) write fields directly.
//!
//! The MV (McLerran-Venugopalan) model samples transverse color charge
//! densities as Gaussian white noise of width `μ g / a`, regulated in
//! momentum space with a hard UV window and a soft IR damping.

use crate::algebra::{AlgebraElement, ElementFactory, GroupElement};
use crate::creator::LightConeNgpParticleCreator;
use crate::error::GlasmaError;
use crate::grid::{cell_index_of, reduce_dim, shift_index};
use crate::poisson::{regulate_charge_density_2d, solve_poisson_2d, LightConePoissonSolver};
use crate::rng::lcg_gaussian;
use crate::settings::{Settings, SimulationType};
use crate::simulation::Simulation;

/// Initial-condition contract: `initialize` validates fast and resets any
/// per-run state, `apply_initial_condition` mutates the grid and particle
/// collection.
pub trait InitialCondition {
    fn initialize(&mut self, sim: &Simulation) -> Result<(), GlasmaError>;
    fn apply_initial_condition(&mut self, sim: &mut Simulation) -> Result<(), GlasmaError>;
}

/// Source model for the CGC chain: a transverse color charge density on a
/// moving sheet.
pub trait InitialChargeDensity {
    fn initialize(&mut self, settings: &Settings) -> Result<(), GlasmaError>;
    fn direction(&self) -> usize;
    fn orientation(&self) -> i32;
    fn location(&self) -> f64;
    fn longitudinal_width(&self) -> f64;
    fn transverse_density(&self) -> &[AlgebraElement];
    /// Frees the sampled density once the fields are set.
    fn clear(&mut self);
}

/// MV-model transverse charge density: per color component, Gaussian
/// white noise of width `μ g / a`, momentum-regulated.
pub struct MvModel {
    pub direction: usize,
    pub orientation: i32,
    pub location: f64,
    pub longitudinal_width: f64,
    /// MV scale μ of the color charge fluctuations.
    pub mu: f64,
    /// Soft IR regulator.
    pub ir: f64,
    /// Hard transverse UV cutoff.
    pub uv_t: f64,
    pub seed: u64,
    density: Vec<AlgebraElement>,
}

impl MvModel {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        direction: usize,
        orientation: i32,
        location: f64,
        longitudinal_width: f64,
        mu: f64,
        ir: f64,
        uv_t: f64,
        seed: u64,
    ) -> Self {
        Self {
            direction,
            orientation,
            location,
            longitudinal_width,
            mu,
            ir,
            uv_t,
            seed,
            density: Vec::new(),
        }
    }
}

impl InitialChargeDensity for MvModel {
    fn initialize(&mut self, settings: &Settings) -> Result<(), GlasmaError> {
        let factory = ElementFactory::new(settings.colors)?;
        let a = settings.lattice_spacing;
        let g = settings.coupling;
        let trans_dims = reduce_dim(&settings.grid_cells, self.direction);
        let total_trans: usize = trans_dims.iter().product();

        let mut seed = self.seed;
        let width = self.mu * g / a;
        let mut density = vec![factory.algebra_zero(); total_trans];
        for c in 0..factory.n_components() {
            let mut rho: Vec<f64> = (0..total_trans)
                .map(|_| lcg_gaussian(&mut seed) * width)
                .collect();
            regulate_charge_density_2d(&mut rho, &trans_dims, self.uv_t, self.ir, a);
            for (q, &v) in density.iter_mut().zip(&rho) {
                q.set(c, v);
            }
        }
        self.density = density;
        Ok(())
    }

    fn direction(&self) -> usize {
        self.direction
    }

    fn orientation(&self) -> i32 {
        self.orientation
    }

    fn location(&self) -> f64 {
        self.location
    }

    fn longitudinal_width(&self) -> f64 {
        self.longitudinal_width
    }

    fn transverse_density(&self) -> &[AlgebraElement] {
        &self.density
    }

    fn clear(&mut self) {
        self.density.clear();
    }
}

/// CGC initial condition: density model → Poisson solver → particle
/// creator with charge refinement.
pub struct CgcInitialCondition<D: InitialChargeDensity> {
    density: D,
}

impl<D: InitialChargeDensity> CgcInitialCondition<D> {
    #[must_use]
    pub fn new(density: D) -> Self {
        Self { density }
    }
}

impl<D: InitialChargeDensity> InitialCondition for CgcInitialCondition<D> {
    fn initialize(&mut self, sim: &Simulation) -> Result<(), GlasmaError> {
        match sim.settings.simulation_type {
            SimulationType::TemporalCgcNgp => Ok(()),
            other => Err(GlasmaError::UnsupportedModel(format!(
                "CGC initial conditions require the lab-frame NGP model, got {other:?}"
            ))),
        }
    }

    fn apply_initial_condition(&mut self, sim: &mut Simulation) -> Result<(), GlasmaError> {
        self.density.initialize(&sim.settings)?;
        let direction = self.density.direction();
        let orientation = self.density.orientation();
        let trans_dims = reduce_dim(sim.grid.shape(), direction);

        let mut solver = LightConePoissonSolver::new(
            direction,
            orientation,
            self.density.location(),
            self.density.longitudinal_width(),
            self.density.transverse_density().to_vec(),
            trans_dims,
        );
        solver.initialize(&sim.settings);
        solver.solve(&mut sim.grid);

        let mut creator = LightConeNgpParticleCreator::new();
        creator.set_gauss_constraint(solver.gauss_violation_field().to_vec());
        creator.initialize(sim, direction, orientation)?;

        self.density.clear();
        Ok(())
    }
}

/// SU(2) glasma flux tubes: boost-invariant initial fields built from two
/// independent MV-model Wilson lines (nuclei A and B).
///
/// Transverse links are `U = (U_A + U_B)(U_A† + U_B†)⁻¹`; the longitudinal
/// electric field follows from the mismatch of the summed link
/// differences, projected to the algebra. The longitudinal link is
/// manually advanced one time step through the exponential map so both
/// link buffers start consistently.
pub struct GlasmaFluxTubes {
    pub direction: usize,
    pub mu: f64,
    pub ir: f64,
    pub uv_t: f64,
    pub seed: u64,
}

impl GlasmaFluxTubes {
    fn generate_wilson_line(
        &self,
        seed: &mut u64,
        trans_dims: &[usize],
        settings: &Settings,
    ) -> Vec<GroupElement> {
        let a = settings.lattice_spacing;
        let g = settings.coupling;
        let total_trans: usize = trans_dims.iter().product();
        let width = self.mu * g / a;

        let mut phi_algebra = vec![AlgebraElement::Su2([0.0; 3]); total_trans];
        for c in 0..3 {
            let mut rho: Vec<f64> = (0..total_trans)
                .map(|_| lcg_gaussian(seed) * width)
                .collect();
            regulate_charge_density_2d(&mut rho, trans_dims, self.uv_t, self.ir, a);
            let phi = solve_poisson_2d(&rho, trans_dims, a);
            for (q, &v) in phi_algebra.iter_mut().zip(&phi) {
                q.set(c, -v * g);
            }
        }

        phi_algebra.iter().map(AlgebraElement::exp).collect()
    }

    /// Pure-gauge transverse links of one nucleus: `U_i = V(x) V(x+î)†`.
    fn generate_transverse_gauge_fields(
        &self,
        seed: &mut u64,
        trans_dims: &[usize],
        settings: &Settings,
    ) -> Vec<Vec<GroupElement>> {
        let v = self.generate_wilson_line(seed, trans_dims, settings);
        let total_trans: usize = trans_dims.iter().product();

        (0..total_trans)
            .map(|i| {
                (0..trans_dims.len())
                    .map(|j| {
                        let shifted = shift_index(i, j, 1, trans_dims);
                        v[i].mult(&v[shifted].adj())
                    })
                    .collect()
            })
            .collect()
    }
}

impl InitialCondition for GlasmaFluxTubes {
    fn initialize(&mut self, sim: &Simulation) -> Result<(), GlasmaError> {
        let colors = sim.settings.colors;
        if colors != 2 {
            return Err(GlasmaError::UnsupportedColorCount { colors });
        }
        Ok(())
    }

    fn apply_initial_condition(&mut self, sim: &mut Simulation) -> Result<(), GlasmaError> {
        self.initialize(sim)?;
        let settings = sim.settings.clone();
        let a = settings.lattice_spacing;
        let at = settings.time_step;
        let g = settings.coupling;
        let trans_dims = reduce_dim(&settings.grid_cells, self.direction);
        let total_trans: usize = trans_dims.iter().product();
        let trans_d = trans_dims.len();
        let mut seed = self.seed;

        let ua = self.generate_transverse_gauge_fields(&mut seed, &trans_dims, &settings);
        let ub = self.generate_transverse_gauge_fields(&mut seed, &trans_dims, &settings);

        // Combined transverse links U = (U_A + U_B)(U_A† + U_B†)⁻¹.
        let mut u = vec![vec![sim.grid.factory().group_identity(); trans_d]; total_trans];
        for i in 0..total_trans {
            for j in 0..trans_d {
                let sum = ua[i][j].add(&ub[i][j]);
                u[i][j] = sum.mult(&sum.adj().inv());
            }
        }

        // Longitudinal electric field from the link mismatch.
        let id = sim.grid.factory().group_identity();
        let unit_factor = g * a;
        let mut e_long = vec![sim.grid.factory().algebra_zero(); total_trans];
        for (i, out) in e_long.iter_mut().enumerate() {
            let mut tmp = id.sub(&id); // zero element of the quaternion span
            for j in 0..trans_d {
                let is = shift_index(i, j, -1, &trans_dims);
                let um1 = u[i][j].adj().sub(&id);
                let diff1 = ua[i][j].sub(&ub[i][j]);
                let um2 = u[is][j].adj().sub(&id);
                let diff2 = ua[is][j].sub(&ub[is][j]);
                tmp = tmp.add(&diff1.mult(&um1).sub(&um2.mult(&diff2)));
            }
            *out = tmp.proj().mult(-1.0 / (2.0 * g * a * a) * unit_factor);
        }

        // Place the fields on the grid, constant along the longitudinal
        // axis (boost invariance).
        for i in 0..sim.grid.total_cells() {
            let pos = sim.grid.cell_pos(i);
            let trans_pos = reduce_dim(&pos, self.direction);
            let trans_index = cell_index_of(&trans_pos, &trans_dims);

            let mut t = 0;
            for j in 0..settings.dimensions {
                if j == self.direction {
                    // Manually evolve the longitudinal link one step.
                    let next = e_long[trans_index].mult(-at).exp();
                    sim.grid.set_u_next(i, j, next);
                } else {
                    sim.grid.set_u(i, j, u[trans_index][t]);
                    sim.grid.set_u_next(i, j, u[trans_index][t]);
                    t += 1;
                }
            }
            sim.grid.set_e(i, self.direction, e_long[trans_index]);
        }
        Ok(())
    }
}

/// Gaussian plane-pulse excitation of the gauge field, traveling along a
/// given spatial direction with normalized spatial and color amplitude
/// directions.
pub struct PlanePulse {
    pub direction: Vec<f64>,
    pub position: Vec<f64>,
    pub amplitude_spatial_direction: Vec<f64>,
    pub amplitude_color_direction: Vec<f64>,
    pub amplitude_magnitude: f64,
    pub sigma: f64,
}

fn normalize(v: &[f64]) -> Vec<f64> {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    v.iter().map(|x| x / norm).collect()
}

impl InitialCondition for PlanePulse {
    fn initialize(&mut self, sim: &Simulation) -> Result<(), GlasmaError> {
        let expected = sim.grid.factory().n_components();
        if self.amplitude_color_direction.len() != expected {
            return Err(GlasmaError::DimensionMismatch {
                expected,
                found: self.amplitude_color_direction.len(),
            });
        }
        Ok(())
    }

    fn apply_initial_condition(&mut self, sim: &mut Simulation) -> Result<(), GlasmaError> {
        self.initialize(sim)?;
        let a = sim.grid.lattice_spacing();
        let at = sim.grid.temporal_spacing();
        let g = sim.settings.coupling;
        let d = sim.grid.dimensions();
        let factory = *sim.grid.factory();

        let spatial = normalize(&self.amplitude_spatial_direction);
        let color = normalize(&self.amplitude_color_direction);

        // Field amplitude per axis.
        let mut amplitude = vec![factory.algebra_zero(); d];
        for (i, amp) in amplitude.iter_mut().enumerate() {
            for (j, col) in color.iter().enumerate() {
                amp.set(j, self.amplitude_magnitude * spatial[i] * col);
            }
        }

        for ci in 0..sim.grid.total_cells() {
            let pos = sim.grid.cell_pos(ci);
            let mut scalar = 0.0;
            for (i, x) in pos.iter().enumerate() {
                scalar += self.direction[i] * (*x as f64 * a - self.position[i]);
            }

            // Electric fields at t = 0, links at t = −dt/2.
            let phase_e = scalar;
            let e_factor = -g * a * phase_e / (self.sigma * self.sigma)
                * (-0.5 * (phase_e / self.sigma).powi(2)).exp();
            let phase_u = scalar + at / 2.0;
            let u_factor = g * a * (-0.5 * (phase_u / self.sigma).powi(2)).exp();

            for i in 0..d {
                let link = sim.grid.u(ci, i).mult(&amplitude[i].mult(u_factor).exp());
                sim.grid.set_u(ci, i, link);
                sim.grid.add_e(ci, i, &amplitude[i].mult(e_factor));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::Particle;

    fn settings(sim_type: SimulationType) -> Settings {
        Settings {
            dimensions: 3,
            colors: 2,
            grid_cells: vec![4, 4, 8],
            lattice_spacing: 1.0,
            time_step: 0.5,
            coupling: 1.5,
            simulation_type: sim_type,
        }
    }

    #[test]
    fn flux_tubes_require_two_colors() {
        let mut s = settings(SimulationType::TemporalCgcNgp);
        s.colors = 1;
        let sim = Simulation::new(s).expect("simulation");
        let mut ic = GlasmaFluxTubes {
            direction: 2,
            mu: 0.5,
            ir: 0.1,
            uv_t: 10.0,
            seed: 1,
        };
        assert!(matches!(
            ic.initialize(&sim),
            Err(GlasmaError::UnsupportedColorCount { colors: 1 })
        ));
    }

    #[test]
    fn flux_tube_links_are_unitary() {
        let mut sim = Simulation::new(settings(SimulationType::TemporalCgcNgp)).expect("sim");
        let mut ic = GlasmaFluxTubes {
            direction: 2,
            mu: 0.4,
            ir: 0.2,
            uv_t: 10.0,
            seed: 42,
        };
        ic.apply_initial_condition(&mut sim).expect("apply");

        for i in 0..sim.grid.total_cells() {
            for j in 0..2 {
                let n = sim.grid.u(i, j).norm_sq();
                assert!((n - 1.0).abs() < 1e-10, "link ({i},{j}) off the group: {n}");
            }
            let n_long = sim.grid.u_next(i, 2).norm_sq();
            assert!((n_long - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn flux_tubes_are_deterministic_per_seed() {
        let mut sim_a = Simulation::new(settings(SimulationType::TemporalCgcNgp)).expect("sim");
        let mut sim_b = Simulation::new(settings(SimulationType::TemporalCgcNgp)).expect("sim");
        let make = |seed| GlasmaFluxTubes {
            direction: 2,
            mu: 0.4,
            ir: 0.2,
            uv_t: 10.0,
            seed,
        };
        make(7).apply_initial_condition(&mut sim_a).expect("apply");
        make(7).apply_initial_condition(&mut sim_b).expect("apply");
        for i in 0..sim_a.grid.total_cells() {
            assert_eq!(sim_a.grid.u(i, 0), sim_b.grid.u(i, 0));
            assert_eq!(sim_a.grid.e(i, 2), sim_b.grid.e(i, 2));
        }
    }

    #[test]
    fn cgc_chain_rejects_wrong_model() {
        let sim = Simulation::new(settings(SimulationType::Wong1dNgp)).expect("sim");
        let mv = MvModel::new(2, 1, 4.0, 1.0, 0.5, 0.2, 10.0, 3);
        let mut ic = CgcInitialCondition::new(mv);
        assert!(matches!(
            ic.initialize(&sim),
            Err(GlasmaError::UnsupportedModel(_))
        ));
    }

    #[test]
    fn cgc_chain_spawns_refined_particles() {
        let mut sim = Simulation::new(settings(SimulationType::TemporalCgcNgp)).expect("sim");
        let mv = MvModel::new(2, 1, 4.0, 1.0, 0.8, 0.2, 10.0, 11);
        let mut ic = CgcInitialCondition::new(mv);
        ic.initialize(&sim).expect("validate");
        ic.apply_initial_condition(&mut sim).expect("apply");

        assert!(!sim.particles.is_empty(), "MV density must spawn carriers");
        for p in &sim.particles {
            let Particle::Cgc(p) = p else { unreachable!() };
            assert!((p.vel[2].abs() - 1.0).abs() < 1e-15, "lightlike velocity");
            assert_eq!(p.q0, p.q1, "charge buffers start equal");
        }
    }

    #[test]
    fn plane_pulse_perturbs_links_near_the_pulse() {
        let mut sim = Simulation::new(settings(SimulationType::TemporalCgcNgp)).expect("sim");
        let mut ic = PlanePulse {
            direction: vec![0.0, 0.0, 1.0],
            position: vec![0.0, 0.0, 4.0],
            amplitude_spatial_direction: vec![1.0, 0.0, 0.0],
            amplitude_color_direction: vec![1.0, 0.0, 0.0],
            amplitude_magnitude: 0.5,
            sigma: 1.0,
        };
        ic.apply_initial_condition(&mut sim).expect("apply");

        let id = sim.grid.factory().group_identity();
        let near = sim.grid.cell_index(&[0, 0, 4]);
        let far = sim.grid.cell_index(&[0, 0, 0]);
        assert!(sim.grid.u(near, 0).sub(&id).norm_sq() > 1e-6, "pulse center excited");
        assert!(
            sim.grid.u(far, 0).sub(&id).norm_sq() < sim.grid.u(near, 0).sub(&id).norm_sq(),
            "Gaussian envelope decays away from the pulse"
        );
    }

    #[test]
    fn plane_pulse_validates_color_components() {
        let sim = Simulation::new(settings(SimulationType::TemporalCgcNgp)).expect("sim");
        let mut ic = PlanePulse {
            direction: vec![0.0, 0.0, 1.0],
            position: vec![0.0; 3],
            amplitude_spatial_direction: vec![1.0, 0.0, 0.0],
            amplitude_color_direction: vec![1.0],
            amplitude_magnitude: 0.5,
            sigma: 1.0,
        };
        assert!(ic.initialize(&sim).is_err());
    }
}

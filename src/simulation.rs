// SPDX-License-Identifier: AGPL-3.0-only

//! Driver-facing simulation context.
//!
//! Owns the settings, the grid and the particle collection, and runs the
//! per-step particle pipeline. Field evolution between deposits is the
//! driver's job: particles only ever read a frozen pair of link buffers
//! and write into step-local accumulators, which keeps the per-particle
//! phases safely parallel.

use crate::error::GlasmaError;
use crate::grid::Grid;
use crate::interpolation::{deposit_all, update_all_particles};
use crate::particle::Particle;
use crate::settings::Settings;
use crate::solver::ParticleSolver;

pub struct Simulation {
    pub settings: Settings,
    pub grid: Grid,
    pub particles: Vec<Particle>,
}

impl Simulation {
    pub fn new(settings: Settings) -> Result<Self, GlasmaError> {
        settings.validate()?;
        let grid = Grid::new(&settings)?;
        Ok(Self {
            settings,
            grid,
            particles: Vec::new(),
        })
    }

    #[must_use]
    pub fn box_sizes(&self) -> Vec<f64> {
        (0..self.settings.dimensions)
            .map(|i| self.settings.box_size(i))
            .collect()
    }

    /// One full particle step:
    /// roll buffers → prepare → advance → deposit ρ/J → read links back →
    /// transport charges → velocity update → complete → drop escapees.
    pub fn particle_step<S: ParticleSolver>(&mut self, solver: &S) {
        let dt = self.settings.time_step;
        self.grid.reset_charge_current();

        for p in &mut self.particles {
            match p {
                Particle::Cgc(p) => p.swap(),
                Particle::Wong(p) => p.swap(),
            }
            solver.prepare(p, dt);
            solver.update_position(p, dt);
        }

        deposit_all(&self.particles, &mut self.grid);
        update_all_particles(&mut self.particles, &self.grid);

        for p in &mut self.particles {
            solver.update_charge(p, dt);
            solver.update_velocity(p, dt);
            solver.complete(p, dt);
        }

        let box_sizes = self.box_sizes();
        self.particles.retain(|p| !p.is_outside(&box_sizes));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::CgcParticle;
    use crate::settings::SimulationType;
    use crate::solver::LightConeSolver;

    fn simulation() -> Simulation {
        let settings = Settings {
            dimensions: 1,
            colors: 2,
            grid_cells: vec![8],
            lattice_spacing: 1.0,
            time_step: 1.0,
            coupling: 1.0,
            simulation_type: SimulationType::TemporalCgcNgp,
        };
        Simulation::new(settings).expect("simulation")
    }

    fn particle(sim: &Simulation, pos: f64, vel: f64, charge: f64) -> Particle {
        let mut p = CgcParticle::new(1, sim.grid.factory(), 0);
        p.pos0 = vec![pos];
        p.pos1 = vec![pos + vel * sim.settings.time_step];
        p.vel = vec![vel];
        p.q0.set(0, charge);
        p.q1.set(0, charge);
        Particle::Cgc(p)
    }

    #[test]
    fn stationary_particle_keeps_depositing_its_charge() {
        let mut sim = simulation();
        let p = particle(&sim, 3.0, 0.0, 2.0);
        sim.particles.push(p);

        for _ in 0..4 {
            sim.particle_step(&LightConeSolver);
            assert!((sim.grid.rho(3).get(0) - 2.0).abs() < 1e-15);
            for i in 0..8 {
                assert!(sim.grid.j(i, 0).square() < 1e-30);
            }
        }
    }

    #[test]
    fn mover_conserves_total_charge_until_it_escapes() {
        let mut sim = simulation();
        sim.particles.push(particle(&sim, 1.0, 1.0, 1.0));

        for _ in 0..5 {
            sim.particle_step(&LightConeSolver);
            if sim.particles.is_empty() {
                break;
            }
            assert!((sim.grid.total_charge().get(0) - 1.0).abs() < 1e-12);
        }
        assert!(sim.particles.is_empty(), "particle leaves an 8-cell box");
    }

    #[test]
    fn transported_charge_magnitude_is_preserved() {
        let mut sim = simulation();
        // Non-trivial link on the path.
        let mut a = sim.grid.factory().algebra_zero();
        a.set(1, 0.9);
        let u = a.exp();
        for i in 0..8 {
            sim.grid.set_u(i, 0, u);
            sim.grid.set_u_next(i, 0, u);
        }
        let mut p = CgcParticle::new(1, sim.grid.factory(), 0);
        p.pos0 = vec![2.0];
        p.pos1 = vec![2.0];
        p.vel = vec![1.0];
        p.q0.set(0, 1.5);
        p.q1.set(0, 1.5);
        sim.particles.push(Particle::Cgc(p));

        sim.particle_step(&LightConeSolver);
        let Particle::Cgc(p) = &sim.particles[0] else {
            unreachable!();
        };
        assert!((p.q1.square() - 2.25).abs() < 1e-12, "transport is unitary");
    }

    #[test]
    fn invalid_settings_are_rejected_at_construction() {
        let settings = Settings {
            dimensions: 2,
            colors: 2,
            grid_cells: vec![8],
            lattice_spacing: 1.0,
            time_step: 1.0,
            coupling: 1.0,
            simulation_type: SimulationType::TemporalCgcNgp,
        };
        assert!(Simulation::new(settings).is_err());
    }
}

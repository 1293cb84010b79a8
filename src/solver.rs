// SPDX-License-Identifier: AGPL-3.0-only

//! Per-particle time integration.
//!
//! The step is a fixed state machine: `prepare` → `update_position` →
//! (deposition, field evolution) → `update_charge` → `complete`.
//! `prepare` and `complete` are no-ops for the NGP variants but stay on
//! the contract so drivers can run any solver through the same pipeline.
//!
//! Charge updates are lazy: the expensive parallel transport runs only
//! when the interpolator flagged a boundary crossing; otherwise the
//! double-buffer is merely swapped.

use crate::particle::{CgcParticle, Particle, WongParticle};

pub trait ParticleSolver {
    fn prepare(&self, _p: &mut Particle, _dt: f64) {}

    fn update_position(&self, p: &mut Particle, dt: f64);

    /// Velocity update from the force law; fixed-speed lightlike
    /// particles never receive one.
    fn update_velocity(&self, _p: &mut Particle, _dt: f64) {}

    fn update_charge(&self, p: &mut Particle, _dt: f64) {
        match p {
            Particle::Cgc(p) => transport_or_swap_cgc(p),
            Particle::Wong(p) => transport_or_swap_wong(p),
        }
    }

    fn complete(&self, _p: &mut Particle, _dt: f64) {}
}

fn transport_or_swap_cgc(p: &mut CgcParticle) {
    if p.update_charge {
        p.q1 = p.q0.act(&p.transport.adj());
        p.update_charge = false;
    } else {
        std::mem::swap(&mut p.q0, &mut p.q1);
    }
}

fn transport_or_swap_wong(p: &mut WongParticle) {
    if p.update_charge {
        p.q1 = p.q0.act(&p.transport.adj());
        p.update_charge = false;
    } else {
        std::mem::swap(&mut p.q0, &mut p.q1);
    }
}

/// Solver for lightlike NGP sources on fixed trajectories.
pub struct LightConeSolver;

impl ParticleSolver for LightConeSolver {
    fn update_position(&self, p: &mut Particle, dt: f64) {
        match p {
            Particle::Cgc(p) => {
                for i in 0..p.pos0.len() {
                    p.pos1[i] = p.pos0[i] + p.vel[i] * dt;
                }
            }
            Particle::Wong(p) => {
                p.pos1 = p.pos0 + p.vel * dt;
            }
        }
    }
}

/// Relativistic 1-D Wong solver with the chromoelectric force law
/// `dv/dt = g (Q·E) / m` acting on the velocity `u = γ v`.
pub struct WongSolver {
    pub coupling: f64,
}

impl WongSolver {
    fn force(&self, p: &WongParticle) -> f64 {
        let mut f = 0.0;
        for c in 0..p.q0.n_components() {
            f += p.q0.get(c) * p.e_field.get(c);
        }
        f * self.coupling
    }
}

impl ParticleSolver for WongSolver {
    fn update_position(&self, p: &mut Particle, dt: f64) {
        match p {
            Particle::Cgc(p) => {
                for i in 0..p.pos0.len() {
                    p.pos1[i] = p.pos0[i] + p.vel[i] * dt;
                }
            }
            Particle::Wong(p) => {
                p.pos1 = p.pos0 + p.vel / p.gamma() * dt;
            }
        }
    }

    fn update_velocity(&self, p: &mut Particle, dt: f64) {
        if let Particle::Wong(p) = p {
            p.vel += self.force(p) / p.mass * dt;
        }
    }
}

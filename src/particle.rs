// SPDX-License-Identifier: AGPL-3.0-only

//! Color-charged point particles for the particle-in-cell engine.
//!
//! Two concrete variants behind a closed enum, dispatched once at
//! construction:
//!
//! - [`CgcParticle`] — lightlike NGP source moving at fixed velocity along
//!   one grid axis; its color charge is the only evolving quantity.
//! - [`WongParticle`] — kinematic relativistic particle in one dimension,
//!   accelerated by the chromoelectric force `F = g Σ_c Q_c E_c`.
//!
//! Both carry a charge double-buffer (`q0` at the previous step, `q1` at
//! the current one) and a pending parallel-transport link with an
//! `update_charge` flag: the transport is only computed when a cell
//! boundary was actually crossed, otherwise the buffers are just swapped.

use crate::algebra::{AlgebraElement, ElementFactory, GroupElement};

/// Lightlike NGP particle for lab-frame CGC simulations.
#[derive(Clone, Debug)]
pub struct CgcParticle {
    /// Position at the previous step.
    pub pos0: Vec<f64>,
    /// Position at the current step.
    pub pos1: Vec<f64>,
    /// Fixed velocity, nonzero only along the motion axis.
    pub vel: Vec<f64>,
    /// Charge at the previous step.
    pub q0: AlgebraElement,
    /// Charge at the current step.
    pub q1: AlgebraElement,
    /// Pending parallel transport, set by the interpolator.
    pub transport: GroupElement,
    /// True when `transport` must still be applied.
    pub update_charge: bool,
    /// Axis of motion.
    pub direction: usize,
}

impl CgcParticle {
    #[must_use]
    pub fn new(dimensions: usize, factory: &ElementFactory, direction: usize) -> Self {
        Self {
            pos0: vec![0.0; dimensions],
            pos1: vec![0.0; dimensions],
            vel: vec![0.0; dimensions],
            q0: factory.algebra_zero(),
            q1: factory.algebra_zero(),
            transport: factory.group_identity(),
            update_charge: false,
            direction,
        }
    }

    /// Rolls positions forward and swaps the charge buffers.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pos0, &mut self.pos1);
        std::mem::swap(&mut self.q0, &mut self.q1);
    }

    /// `pos1 = pos0 + v·dt`.
    pub fn advance(&mut self, dt: f64) {
        for ((new, old), v) in self.pos1.iter_mut().zip(&self.pos0).zip(&self.vel) {
            *new = old + v * dt;
        }
    }

    /// Eager parallel transport used by the current generators:
    /// `q1 = q0.act(U†)`.
    pub fn evolve(&mut self, u: &GroupElement) {
        self.q1 = self.q0.act(&u.adj());
    }

    /// True once any coordinate left the simulation box.
    #[must_use]
    pub fn is_outside(&self, box_sizes: &[f64]) -> bool {
        self.pos1
            .iter()
            .zip(box_sizes)
            .any(|(x, size)| *x < 0.0 || *x > *size)
    }
}

/// Kinematic Wong particle in one dimension.
#[derive(Clone, Debug)]
pub struct WongParticle {
    pub pos0: f64,
    pub pos1: f64,
    pub vel: f64,
    pub mass: f64,
    pub q0: AlgebraElement,
    pub q1: AlgebraElement,
    pub transport: GroupElement,
    pub update_charge: bool,
    /// Chromoelectric field sampled at the particle's NGP.
    pub e_field: AlgebraElement,
}

impl WongParticle {
    #[must_use]
    pub fn new(factory: &ElementFactory, mass: f64) -> Self {
        Self {
            pos0: 0.0,
            pos1: 0.0,
            vel: 0.0,
            mass,
            q0: factory.algebra_zero(),
            q1: factory.algebra_zero(),
            transport: factory.group_identity(),
            update_charge: false,
            e_field: factory.algebra_zero(),
        }
    }

    /// Lorentz factor for the relativistic velocity parametrization
    /// `u = γ v`, so `γ = √(1 + u²)`.
    #[must_use]
    pub fn gamma(&self) -> f64 {
        (1.0 + self.vel * self.vel).sqrt()
    }

    #[must_use]
    pub fn energy(&self) -> f64 {
        self.mass * self.gamma()
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pos0, &mut self.pos1);
        std::mem::swap(&mut self.q0, &mut self.q1);
    }
}

/// Closed set of particle variants.
#[derive(Clone, Debug)]
pub enum Particle {
    Cgc(CgcParticle),
    Wong(WongParticle),
}

impl Particle {
    /// True once the particle left the simulation box and should be
    /// removed from the collection.
    #[must_use]
    pub fn is_outside(&self, box_sizes: &[f64]) -> bool {
        match self {
            Self::Cgc(p) => p.is_outside(box_sizes),
            Self::Wong(p) => p.pos1 < 0.0 || p.pos1 > box_sizes[0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> ElementFactory {
        ElementFactory::new(2).expect("su(2) factory")
    }

    #[test]
    fn advance_moves_along_velocity() {
        let f = factory();
        let mut p = CgcParticle::new(3, &f, 2);
        p.pos0 = vec![1.0, 2.0, 3.0];
        p.vel = vec![0.0, 0.0, 1.0];
        p.advance(0.5);
        assert_eq!(p.pos1, vec![1.0, 2.0, 3.5]);
    }

    #[test]
    fn swap_exchanges_positions_and_charges() {
        let f = factory();
        let mut p = CgcParticle::new(1, &f, 0);
        p.pos0 = vec![1.0];
        p.pos1 = vec![2.0];
        p.q0.set(0, 5.0);
        p.swap();
        assert_eq!(p.pos0, vec![2.0]);
        assert_eq!(p.pos1, vec![1.0]);
        assert!((p.q1.get(0) - 5.0).abs() < 1e-15);
        assert!(p.q0.get(0).abs() < 1e-15);
    }

    #[test]
    fn evolve_is_adjoint_transport() {
        let f = factory();
        let mut p = CgcParticle::new(1, &f, 0);
        p.q0.set(1, 1.5);
        let mut a = f.algebra_zero();
        a.set(0, 0.9);
        let u = a.exp();
        p.evolve(&u);
        // Transport preserves the color magnitude.
        assert!((p.q1.square() - p.q0.square()).abs() < 1e-13);
    }

    #[test]
    fn outside_detection_covers_both_edges() {
        let f = factory();
        let mut p = CgcParticle::new(2, &f, 0);
        p.pos1 = vec![5.0, 3.0];
        assert!(!p.is_outside(&[8.0, 8.0]));
        p.pos1 = vec![9.0, 3.0];
        assert!(p.is_outside(&[8.0, 8.0]));
        p.pos1 = vec![5.0, -0.1];
        assert!(p.is_outside(&[8.0, 8.0]));
    }

    #[test]
    fn gamma_of_resting_particle_is_one() {
        let f = factory();
        let mut p = WongParticle::new(&f, 2.0);
        assert!((p.gamma() - 1.0).abs() < 1e-15);
        assert!((p.energy() - 2.0).abs() < 1e-15);
        p.vel = 3.0;
        assert!((p.gamma() - 10.0_f64.sqrt()).abs() < 1e-14);
    }
}

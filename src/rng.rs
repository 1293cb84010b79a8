// SPDX-License-Identifier: AGPL-3.0-only

//! Deterministic pseudo-random numbers for stochastic initial conditions.
//!
//! A seeded LCG (Knuth MMIX parameters) with Box-Muller Gaussian deviates.
//! No global state: the seed travels through per-run context structs, so
//! the same seed always reproduces the same charge configuration.

/// LCG multiplier (Knuth MMIX).
pub const LCG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;

/// LCG increment (Knuth MMIX).
pub const LCG_INCREMENT: u64 = 1_442_695_040_888_963_407;

/// Divisor for 53-bit uniform conversion.
const LCG_53_DIVISOR: f64 = (1u64 << 53) as f64;

/// Clamp for the Box-Muller logarithm argument.
const LN_GUARD: f64 = 1e-30;

/// Advance the LCG state by one step.
#[inline]
pub fn lcg_step(seed: &mut u64) {
    *seed = seed.wrapping_mul(LCG_MULTIPLIER).wrapping_add(LCG_INCREMENT);
}

/// Uniform f64 in [0, 1) from 53 bits of LCG state.
#[inline]
pub fn lcg_uniform_f64(seed: &mut u64) -> f64 {
    lcg_step(seed);
    (*seed >> 11) as f64 / LCG_53_DIVISOR
}

/// Box-Muller Gaussian deviate N(0, 1) from two LCG draws.
#[inline]
pub fn lcg_gaussian(seed: &mut u64) -> f64 {
    let u1 = lcg_uniform_f64(seed);
    let u2 = lcg_uniform_f64(seed);
    (-2.0 * u1.max(LN_GUARD).ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

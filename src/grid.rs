// SPDX-License-Identifier: AGPL-3.0-only

//! Periodic D-dimensional lattice storage for links, fields and sources.
//!
//! Per site the grid holds D current links `U`, D provisional next-step
//! links `Unext` (a ping-pong pair with an explicit swap), D electric-field
//! algebra elements `E`, one charge density `ρ` and D current densities `J`.
//! `ρ` and `J` are step-local accumulators, re-accumulated every step.
//!
//! Cell indexing is row-major with the last axis fastest:
//! `idx = ((p_0 N_1 + p_1) N_2 + p_2) ...`, and all coordinate access wraps
//! periodically, so `shift(shift(i, d, +1), d, -1) == i` for every cell
//! and axis.

use crate::algebra::{AlgebraElement, ElementFactory, GroupElement};
use crate::error::GlasmaError;
use crate::settings::Settings;

// ═══════════════════════════════════════════════════════════════════
//  Position helpers (shared with the dimension-reduced transverse grids)
// ═══════════════════════════════════════════════════════════════════

/// Row-major cell index with periodic wrapping, for an arbitrary grid shape.
#[must_use]
pub fn cell_index_of(pos: &[i64], dims: &[usize]) -> usize {
    debug_assert_eq!(pos.len(), dims.len());
    let mut idx = 0usize;
    for (p, &n) in pos.iter().zip(dims) {
        let wrapped = p.rem_euclid(n as i64) as usize;
        idx = idx * n + wrapped;
    }
    idx
}

/// Inverse of [`cell_index_of`]: grid coordinates of a linear index.
#[must_use]
pub fn cell_pos_of(index: usize, dims: &[usize]) -> Vec<i64> {
    let mut pos = vec![0i64; dims.len()];
    let mut rem = index;
    for (p, &n) in pos.iter_mut().zip(dims).rev() {
        *p = (rem % n) as i64;
        rem /= n;
    }
    pos
}

/// Nearest grid point of a continuous position, in units of the spacing.
#[must_use]
pub fn nearest_grid_point(pos: &[f64], spacing: f64) -> Vec<i64> {
    pos.iter().map(|x| (x / spacing).round() as i64).collect()
}

/// Floored grid point of a continuous position.
#[must_use]
pub fn floored_grid_point(pos: &[f64], spacing: f64) -> Vec<i64> {
    pos.iter().map(|x| (x / spacing).floor() as i64).collect()
}

/// Drop one axis from a coordinate or shape vector (transverse reduction).
#[must_use]
pub fn reduce_dim<T: Copy>(v: &[T], axis: usize) -> Vec<T> {
    v.iter()
        .enumerate()
        .filter(|(i, _)| *i != axis)
        .map(|(_, x)| *x)
        .collect()
}

/// Insert a value back at the given axis (inverse of [`reduce_dim`]).
#[must_use]
pub fn insert_dim<T: Copy>(v: &[T], axis: usize, value: T) -> Vec<T> {
    let mut out = Vec::with_capacity(v.len() + 1);
    out.extend_from_slice(&v[..axis]);
    out.push(value);
    out.extend_from_slice(&v[axis..]);
    out
}

/// Periodic shift of a linear index on an arbitrary grid shape.
#[must_use]
pub fn shift_index(index: usize, axis: usize, amount: i64, dims: &[usize]) -> usize {
    let mut pos = cell_pos_of(index, dims);
    pos[axis] += amount;
    cell_index_of(&pos, dims)
}

// ═══════════════════════════════════════════════════════════════════
//  Grid
// ═══════════════════════════════════════════════════════════════════

/// Periodic lattice of gauge links, electric fields and charge/current
/// densities. Owns its arrays exclusively.
pub struct Grid {
    dims: Vec<usize>,
    lattice_spacing: f64,
    temporal_spacing: f64,
    factory: ElementFactory,
    /// Current links, `site * D + direction`.
    u: Vec<GroupElement>,
    /// Provisional next-step links, same layout.
    u_next: Vec<GroupElement>,
    /// Electric fields, same layout.
    e: Vec<AlgebraElement>,
    /// Charge density, one per site.
    rho: Vec<AlgebraElement>,
    /// Current density, `site * D + direction`.
    j: Vec<AlgebraElement>,
}

impl Grid {
    pub fn new(settings: &Settings) -> Result<Self, GlasmaError> {
        settings.validate()?;
        let factory = ElementFactory::new(settings.colors)?;
        let dims = settings.grid_cells.clone();
        let total: usize = dims.iter().product();
        let d = dims.len();
        Ok(Self {
            dims,
            lattice_spacing: settings.lattice_spacing,
            temporal_spacing: settings.time_step,
            factory,
            u: vec![factory.group_identity(); total * d],
            u_next: vec![factory.group_identity(); total * d],
            e: vec![factory.algebra_zero(); total * d],
            rho: vec![factory.algebra_zero(); total],
            j: vec![factory.algebra_zero(); total * d],
        })
    }

    #[must_use]
    pub fn total_cells(&self) -> usize {
        self.rho.len()
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.dims.len()
    }

    #[must_use]
    pub fn num_cells(&self, axis: usize) -> usize {
        self.dims[axis]
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.dims
    }

    #[must_use]
    pub const fn lattice_spacing(&self) -> f64 {
        self.lattice_spacing
    }

    #[must_use]
    pub const fn temporal_spacing(&self) -> f64 {
        self.temporal_spacing
    }

    #[must_use]
    pub const fn factory(&self) -> &ElementFactory {
        &self.factory
    }

    /// Linear cell index of (possibly out-of-range) grid coordinates.
    #[must_use]
    pub fn cell_index(&self, pos: &[i64]) -> usize {
        cell_index_of(pos, &self.dims)
    }

    /// Grid coordinates of a linear cell index.
    #[must_use]
    pub fn cell_pos(&self, index: usize) -> Vec<i64> {
        cell_pos_of(index, &self.dims)
    }

    /// Periodic neighbor index along an axis.
    #[must_use]
    pub fn shift(&self, index: usize, axis: usize, amount: i64) -> usize {
        shift_index(index, axis, amount, &self.dims)
    }

    #[inline]
    fn link_slot(&self, cell: usize, direction: usize) -> usize {
        cell * self.dims.len() + direction
    }

    // Links ---------------------------------------------------------------

    #[must_use]
    pub fn u(&self, cell: usize, direction: usize) -> GroupElement {
        self.u[self.link_slot(cell, direction)]
    }

    pub fn set_u(&mut self, cell: usize, direction: usize, value: GroupElement) {
        let slot = self.link_slot(cell, direction);
        self.u[slot] = value;
    }

    #[must_use]
    pub fn u_next(&self, cell: usize, direction: usize) -> GroupElement {
        self.u_next[self.link_slot(cell, direction)]
    }

    pub fn set_u_next(&mut self, cell: usize, direction: usize, value: GroupElement) {
        let slot = self.link_slot(cell, direction);
        self.u_next[slot] = value;
    }

    /// Ping-pong swap: the provisional links become current and vice versa.
    /// Called by the driver after each field-evolution half step.
    pub fn swap_links(&mut self) {
        std::mem::swap(&mut self.u, &mut self.u_next);
    }

    // Electric field --------------------------------------------------------

    #[must_use]
    pub fn e(&self, cell: usize, direction: usize) -> AlgebraElement {
        self.e[self.link_slot(cell, direction)]
    }

    pub fn set_e(&mut self, cell: usize, direction: usize, value: AlgebraElement) {
        let slot = self.link_slot(cell, direction);
        self.e[slot] = value;
    }

    pub fn add_e(&mut self, cell: usize, direction: usize, value: &AlgebraElement) {
        let slot = self.link_slot(cell, direction);
        self.e[slot].add_assign(value);
    }

    // Charge and current accumulators ---------------------------------------

    #[must_use]
    pub fn rho(&self, cell: usize) -> AlgebraElement {
        self.rho[cell]
    }

    pub fn add_rho(&mut self, cell: usize, value: &AlgebraElement) {
        self.rho[cell].add_assign(value);
    }

    #[must_use]
    pub fn j(&self, cell: usize, direction: usize) -> AlgebraElement {
        self.j[self.link_slot(cell, direction)]
    }

    pub fn add_j(&mut self, cell: usize, direction: usize, value: &AlgebraElement) {
        let slot = self.link_slot(cell, direction);
        self.j[slot].add_assign(value);
    }

    /// Zero the step-local source accumulators. Must run before each
    /// deposition pass.
    pub fn reset_charge_current(&mut self) {
        let zero = self.factory.algebra_zero();
        self.rho.fill(zero);
        self.j.fill(zero);
    }

    /// Total deposited charge (sum of ρ over all sites).
    #[must_use]
    pub fn total_charge(&self) -> AlgebraElement {
        let mut total = self.factory.algebra_zero();
        for r in &self.rho {
            total.add_assign(r);
        }
        total
    }
}

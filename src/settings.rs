// SPDX-License-Identifier: AGPL-3.0-only

//! Simulation configuration in lattice units.
//!
//! All lengths are multiples of the lattice spacing `a_s`, all times are
//! multiples of the temporal spacing `a_t`. The NGP particle scheme requires
//! `a_t ≤ a_s` (at most one cell crossed per step) and spawns
//! `a_s / a_t` particles per cell, so the ratio should be a small integer.

use serde::{Deserialize, Serialize};

use crate::error::GlasmaError;

/// Closed set of supported simulation models.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum SimulationType {
    /// Lab-frame CGC with nearest-grid-point particle sources.
    #[default]
    TemporalCgcNgp,
    /// One-dimensional Wong particle dynamics (kinematic color charges).
    Wong1dNgp,
}

/// Run configuration consumed by the core.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[must_use]
pub struct Settings {
    /// Number of spatial dimensions D.
    pub dimensions: usize,
    /// Number of colors N (gauge group SU(N), or the abelian limit for N=1).
    pub colors: usize,
    /// Cells per axis (length D).
    pub grid_cells: Vec<usize>,
    /// Lattice spacing `a_s`.
    pub lattice_spacing: f64,
    /// Temporal spacing `a_t`.
    pub time_step: f64,
    /// Coupling constant g.
    pub coupling: f64,
    /// Simulation model.
    pub simulation_type: SimulationType,
}

impl Settings {
    /// Physical box size along an axis: `N_i × a_s`.
    #[must_use]
    pub fn box_size(&self, axis: usize) -> f64 {
        self.grid_cells[axis] as f64 * self.lattice_spacing
    }

    /// Total number of lattice sites.
    #[must_use]
    pub fn total_cells(&self) -> usize {
        self.grid_cells.iter().product()
    }

    /// Particles spawned per cell by the NGP creators: `a_s / a_t`, rounded.
    #[must_use]
    pub fn particles_per_cell(&self) -> usize {
        (self.lattice_spacing / self.time_step).round() as usize
    }

    /// Reject configurations the particle-mesh scheme cannot handle.
    pub fn validate(&self) -> Result<(), GlasmaError> {
        if self.dimensions == 0 || self.grid_cells.len() != self.dimensions {
            return Err(GlasmaError::InvalidSettings(format!(
                "grid_cells has {} entries for {} dimensions",
                self.grid_cells.len(),
                self.dimensions
            )));
        }
        if self.grid_cells.iter().any(|&n| n == 0) {
            return Err(GlasmaError::InvalidSettings("zero-sized grid axis".into()));
        }
        if self.lattice_spacing <= 0.0 || self.time_step <= 0.0 {
            return Err(GlasmaError::InvalidSettings(
                "lattice spacing and time step must be positive".into(),
            ));
        }
        if self.time_step > self.lattice_spacing {
            // Lightlike particles would cross more than one cell per step,
            // which the two-cell deposition scheme does not cover.
            return Err(GlasmaError::InvalidSettings(
                "time step must not exceed the lattice spacing".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            dimensions: 3,
            colors: 2,
            grid_cells: vec![8, 8, 16],
            lattice_spacing: 1.0,
            time_step: 0.5,
            coupling: 2.0,
            simulation_type: SimulationType::TemporalCgcNgp,
        }
    }

    #[test]
    fn valid_settings_pass() {
        assert!(settings().validate().is_ok());
    }

    #[test]
    fn box_size_scales_with_cells() {
        let s = settings();
        assert!((s.box_size(2) - 16.0).abs() < 1e-15);
        assert_eq!(s.total_cells(), 8 * 8 * 16);
    }

    #[test]
    fn particles_per_cell_is_spacing_ratio() {
        assert_eq!(settings().particles_per_cell(), 2);
    }

    #[test]
    fn superluminal_time_step_rejected() {
        let mut s = settings();
        s.time_step = 2.0;
        assert!(matches!(
            s.validate(),
            Err(GlasmaError::InvalidSettings(_))
        ));
    }

    #[test]
    fn mismatched_grid_axes_rejected() {
        let mut s = settings();
        s.grid_cells = vec![8, 8];
        assert!(s.validate().is_err());
    }

    #[test]
    fn settings_serde_roundtrip() {
        let s = settings();
        let json = serde_json::to_string(&s).expect("serialize");
        let back: Settings = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.grid_cells, s.grid_cells);
        assert!((back.coupling - s.coupling).abs() < 1e-15);
    }
}

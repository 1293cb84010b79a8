// SPDX-License-Identifier: AGPL-3.0-only

//! glasma — classical SU(N) Yang-Mills lattice core for Color-Glass-
//! Condensate initial-state simulations.
//!
//! Gauge links and electric fields live on a periodic lattice; moving
//! color charges deposit currents through a charge-conserving
//! nearest-grid-point scheme with exact parallel transport along the
//! links. Initial configurations come from spectral Poisson solvers with
//! lattice-specific momentum regulators (MV model, glasma flux tubes,
//! light-cone sheets).
//!
//! ## Modules
//!   - `algebra` — su(2)/u(1) algebra vectors and group elements
//!   - `grid` — periodic lattice storage and index arithmetic
//!   - `fft`, `complex` — in-place spectral transforms
//!   - `poisson` — regulated spectral Poisson solvers
//!   - `particle`, `solver` — particle state and time integration
//!   - `interpolation` — NGP deposition and link read-back
//!   - `creator` — particle spawning with iterative charge refinement
//!   - `current` — physical source models (light-cone point charges)
//!   - `initial` — MV model, glasma flux tubes, plane pulses
//!   - `simulation` — driver-facing context and step pipeline

pub mod algebra;
pub mod complex;
pub mod creator;
pub mod current;
pub mod error;
pub mod fft;
pub mod grid;
pub mod initial;
pub mod interpolation;
pub mod particle;
pub mod poisson;
pub mod rng;
pub mod settings;
pub mod simulation;
pub mod solver;

pub use error::GlasmaError;
pub use settings::{Settings, SimulationType};
pub use simulation::Simulation;

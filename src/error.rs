// SPDX-License-Identifier: AGPL-3.0-only

//! Typed errors for lattice initialization and particle coupling.
//!
//! Replaces `Result<_, String>` in public APIs with a proper enum so callers
//! can pattern-match on failure modes (bad color count, unsupported model,
//! mismatched field dimensions) rather than parsing opaque strings.
//!
//! Degenerate physical input — a zero-width charge block, zero total charge
//! during moment removal — is a valid vacuum state, handled as a safe no-op
//! and deliberately absent from this enum.

use std::fmt;

/// Errors arising from simulation setup and field/particle initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlasmaError {
    /// A component fixed to a specific algebra dimension got an unsupported
    /// number of colors (e.g. the flux-tube generator requires exactly 2).
    UnsupportedColorCount { colors: usize },

    /// Simulation type or model combination not supported by a component.
    UnsupportedModel(String),

    /// Algebra or field operation across incompatible component counts,
    /// caught at an initialization seam. Inside arithmetic hot loops the
    /// same condition is a programming error and panics instead.
    DimensionMismatch { expected: usize, found: usize },

    /// Settings rejected before grid construction (zero-sized grid,
    /// non-positive spacing, time step exceeding the lattice spacing).
    InvalidSettings(String),
}

impl fmt::Display for GlasmaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedColorCount { colors } => {
                write!(f, "Unsupported number of colors: {colors}")
            }
            Self::UnsupportedModel(msg) => write!(f, "Unsupported model: {msg}"),
            Self::DimensionMismatch { expected, found } => {
                write!(
                    f,
                    "Dimension mismatch: expected {expected} components, found {found}"
                )
            }
            Self::InvalidSettings(msg) => write!(f, "Invalid settings: {msg}"),
        }
    }
}

impl std::error::Error for GlasmaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_color_count() {
        let err = GlasmaError::UnsupportedColorCount { colors: 5 };
        assert_eq!(err.to_string(), "Unsupported number of colors: 5");
    }

    #[test]
    fn display_dimension_mismatch() {
        let err = GlasmaError::DimensionMismatch {
            expected: 3,
            found: 1,
        };
        assert!(err.to_string().contains("expected 3"));
        assert!(err.to_string().contains("found 1"));
    }

    #[test]
    fn error_trait_works() {
        let err = GlasmaError::UnsupportedModel("Wong1D with 3 colors".into());
        let dyn_err: &dyn std::error::Error = &err;
        assert!(dyn_err.to_string().contains("Wong1D"));
    }
}

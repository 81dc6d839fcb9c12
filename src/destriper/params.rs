//! Parameters of the de-striping pipeline.
//!
//! Defaults follow common airborne magnetic practice: a 12.5 m lattice, ties
//! every 150 m, a 4-cell Gaussian low-pass and a near-interpolating spline
//! tolerance.

use crate::error::DestripeError;
use crate::smoother::DEFAULT_MIN_PROFILE_CELLS;
use crate::types::JoinMode;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DestripeParams {
    /// Lattice spacing in both axes (survey units).
    pub cell: f64,
    /// Nominal spacing between tie profiles along y.
    pub tie_spacing: f64,
    /// Gaussian low-pass standard deviation in cells; 0 disables the filter.
    pub lp_sigma: f64,
    /// Smoothing tolerance for both spline stages.
    pub spline_smooth: f64,
    /// Tie profiles with fewer valid cells are left missing.
    pub min_profile_cells: usize,
    /// How corrected nodes are mapped back onto samples.
    pub join: JoinMode,
}

impl Default for DestripeParams {
    fn default() -> Self {
        Self {
            cell: 12.5,
            tie_spacing: 150.0,
            lp_sigma: 4.0,
            spline_smooth: 0.001,
            min_profile_cells: DEFAULT_MIN_PROFILE_CELLS,
            join: JoinMode::Exact,
        }
    }
}

impl DestripeParams {
    pub fn with_join(mut self, join: JoinMode) -> Self {
        self.join = join;
        self
    }

    /// Reject values that would produce an empty, unbounded or ambiguous
    /// lattice before any work is done.
    pub fn validate(&self) -> Result<(), DestripeError> {
        if !(self.cell.is_finite() && self.cell > 0.0) {
            return Err(DestripeError::Configuration(format!(
                "cell must be positive and finite, got {}",
                self.cell
            )));
        }
        if !(self.tie_spacing.is_finite() && self.tie_spacing > 0.0) {
            return Err(DestripeError::Configuration(format!(
                "tie_spacing must be positive and finite, got {}",
                self.tie_spacing
            )));
        }
        // Closer ties would map several nominal positions onto one row.
        if self.tie_spacing < self.cell {
            return Err(DestripeError::Configuration(format!(
                "tie_spacing {} is smaller than cell {}",
                self.tie_spacing, self.cell
            )));
        }
        if !(self.lp_sigma.is_finite() && self.lp_sigma >= 0.0) {
            return Err(DestripeError::Configuration(format!(
                "lp_sigma must be non-negative and finite, got {}",
                self.lp_sigma
            )));
        }
        if !(self.spline_smooth.is_finite() && self.spline_smooth >= 0.0) {
            return Err(DestripeError::Configuration(format!(
                "spline_smooth must be non-negative and finite, got {}",
                self.spline_smooth
            )));
        }
        if self.min_profile_cells < 2 {
            return Err(DestripeError::Configuration(format!(
                "min_profile_cells must be at least 2, got {}",
                self.min_profile_cells
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let p = DestripeParams::default();
        assert_eq!(p.cell, 12.5);
        assert_eq!(p.tie_spacing, 150.0);
        assert_eq!(p.lp_sigma, 4.0);
        assert_eq!(p.spline_smooth, 0.001);
        assert_eq!(p.min_profile_cells, 10);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn non_positive_spacing_fails_fast() {
        for (cell, tie) in [(0.0, 150.0), (-1.0, 150.0), (12.5, 0.0), (f64::NAN, 1.0)] {
            let p = DestripeParams {
                cell,
                tie_spacing: tie,
                ..Default::default()
            };
            assert!(
                matches!(p.validate(), Err(DestripeError::Configuration(_))),
                "cell={} tie={}",
                cell,
                tie
            );
        }
    }

    #[test]
    fn ties_closer_than_cell_are_rejected() {
        let p = DestripeParams {
            cell: 12.5,
            tie_spacing: 10.0,
            ..Default::default()
        };
        assert!(matches!(p.validate(), Err(DestripeError::Configuration(_))));
        let p = DestripeParams {
            tie_spacing: 12.5,
            ..p
        };
        assert!(p.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let p: DestripeParams =
            serde_json::from_str(r#"{"cell": 25.0, "join": "nearest_cell"}"#).unwrap();
        assert_eq!(p.cell, 25.0);
        assert_eq!(p.tie_spacing, 150.0);
        assert_eq!(p.join, JoinMode::NearestCell);
    }
}

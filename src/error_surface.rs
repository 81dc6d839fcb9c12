//! Error (striping) surface assembled from smoothed tie profiles.
//!
//! Row pass: every smoothed profile is written into its tie row. Column pass:
//! each column is fitted independently across the tie positions with a
//! smoothing spline and evaluated at every lattice row. Along-line structure
//! is therefore resolved at the lattice spacing while the across-line
//! direction is only sampled at the tie spacing.
use crate::lattice::{Lattice, LatticeGeometry};
use crate::spline::SmoothingSpline;
use crate::ties::TieRow;
use log::debug;

/// Minimum number of tie values a column needs to be interpolated.
pub const MIN_COLUMN_TIES: usize = 2;

/// Populated error surface plus bookkeeping for reports.
#[derive(Clone, Debug)]
pub struct ErrorSurface {
    pub surface: Lattice,
    pub filled_columns: usize,
}

/// Write smoothed profiles into their tie rows; other rows stay missing.
///
/// `profiles[k]` belongs to `ties[k]`; a `None` profile leaves the row
/// missing.
pub fn place_profiles(
    geometry: LatticeGeometry,
    ties: &[TieRow],
    profiles: &[Option<Vec<f64>>],
) -> Lattice {
    let mut surface = Lattice::missing(geometry);
    for (tie, profile) in ties.iter().zip(profiles) {
        let Some(values) = profile else {
            continue;
        };
        for (cell, &v) in surface.row_mut(tie.row).iter_mut().zip(values) {
            *cell = Some(v);
        }
    }
    surface
}

/// Column values collected across ties: (nominal tie y, value).
fn column_pairs(surface: &Lattice, ties: &[TieRow], col: usize) -> (Vec<f64>, Vec<f64>) {
    ties.iter()
        .filter_map(|t| surface.get(t.row, col).map(|v| (t.nominal_y, v)))
        .unzip()
}

fn fit_column(
    surface: &Lattice,
    ties: &[TieRow],
    col: usize,
    ys: &[f64],
    spline_smooth: f64,
) -> Option<Vec<f64>> {
    let (ty, tv) = column_pairs(surface, ties, col);
    if ty.len() < MIN_COLUMN_TIES {
        return None;
    }
    SmoothingSpline::fit(&ty, &tv, spline_smooth).map(|sp| sp.eval_many(ys))
}

/// Densify tie rows over every lattice row, one column at a time.
///
/// Columns with fewer than [`MIN_COLUMN_TIES`] tie values become entirely
/// missing.
pub fn densify_columns(mut surface: Lattice, ties: &[TieRow], spline_smooth: f64) -> ErrorSurface {
    let ys = surface.geometry().ys();
    let cols = surface.cols();

    #[cfg(feature = "parallel")]
    let fitted: Vec<Option<Vec<f64>>> = {
        use rayon::prelude::*;
        let snapshot = &surface;
        (0..cols)
            .into_par_iter()
            .map(|j| fit_column(snapshot, ties, j, &ys, spline_smooth))
            .collect()
    };

    #[cfg(not(feature = "parallel"))]
    let fitted: Vec<Option<Vec<f64>>> = (0..cols)
        .map(|j| fit_column(&surface, ties, j, &ys, spline_smooth))
        .collect();

    let mut filled_columns = 0;
    for (j, column) in fitted.into_iter().enumerate() {
        match column {
            Some(values) => {
                filled_columns += 1;
                for (i, v) in values.into_iter().enumerate() {
                    surface.set(i, j, Some(v));
                }
            }
            None => {
                for i in 0..surface.rows() {
                    surface.set(i, j, None);
                }
            }
        }
    }
    debug!(
        "error surface: filled {}/{} columns from {} ties",
        filled_columns,
        cols,
        ties.len()
    );

    ErrorSurface {
        surface,
        filled_columns,
    }
}

/// Row pass followed by column pass.
pub fn build_error_surface(
    geometry: LatticeGeometry,
    ties: &[TieRow],
    profiles: &[Option<Vec<f64>>],
    spline_smooth: f64,
) -> ErrorSurface {
    let placed = place_profiles(geometry, ties, profiles);
    densify_columns(placed, ties, spline_smooth)
}

//! Subtract the error surface and map corrected nodes back onto samples.
use crate::lattice::{Lattice, LatticeGeometry};
use crate::types::{JoinMode, Sample};

/// `lattice -= error` cell-wise; a cell becomes missing when either side is.
/// Returns the number of present cells after correction.
pub fn subtract_in_place(lattice: &mut Lattice, error: &Lattice) -> usize {
    debug_assert_eq!(lattice.geometry(), error.geometry());
    let mut present = 0;
    for i in 0..lattice.rows() {
        let err_row = error.row(i);
        for (cell, e) in lattice.row_mut(i).iter_mut().zip(err_row) {
            *cell = match (*cell, *e) {
                (Some(v), Some(e)) => {
                    present += 1;
                    Some(v - e)
                }
                _ => None,
            };
        }
    }
    present
}

/// Corrected value for every sample, in input order. Samples that were not
/// gridded (non-finite position or value) stay missing.
pub fn join_samples(corrected: &Lattice, samples: &[Sample], mode: JoinMode) -> Vec<Option<f64>> {
    let g = corrected.geometry();
    samples
        .iter()
        .map(|s| {
            if !s.is_finite() {
                return None;
            }
            let (i, j) = match mode {
                JoinMode::Exact => exact_node(g, s.x, s.y)?,
                JoinMode::NearestCell => nearest_node(g, s.x, s.y)?,
            };
            corrected.get(i, j)
        })
        .collect()
}

/// Node whose computed coordinates equal `(x, y)` bit for bit.
fn exact_node(g: &LatticeGeometry, x: f64, y: f64) -> Option<(usize, usize)> {
    let j = axis_index(x, g.x0, g.cell, g.cols)?;
    let i = axis_index(y, g.y0, g.cell, g.rows)?;
    (g.x(j) == x && g.y(i) == y).then_some((i, j))
}

fn nearest_node(g: &LatticeGeometry, x: f64, y: f64) -> Option<(usize, usize)> {
    if g.is_empty() || !x.is_finite() || !y.is_finite() {
        return None;
    }
    let clamp = |t: f64, n: usize| t.round().clamp(0.0, (n - 1) as f64) as usize;
    Some((clamp((y - g.y0) / g.cell, g.rows), clamp((x - g.x0) / g.cell, g.cols)))
}

fn axis_index(v: f64, origin: f64, cell: f64, n: usize) -> Option<usize> {
    let t = ((v - origin) / cell).round();
    (t.is_finite() && t >= 0.0 && t < n as f64).then_some(t as usize)
}

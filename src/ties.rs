//! Cross-line tie profiles taken from periodically spaced lattice rows.
use crate::lattice::{range_len, Lattice};
use serde::Serialize;

/// One tie: the nominal position along y and the lattice row serving it.
#[derive(Clone, Debug)]
pub struct TieProfile {
    pub nominal_y: f64,
    pub row: usize,
    pub cells: Vec<Option<f64>>,
}

impl TieProfile {
    pub fn valid_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

/// Nominal position → row mapping, without the row contents.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TieRow {
    pub nominal_y: f64,
    pub row: usize,
}

/// Nominal tie positions `y0, y0 + s, ..` strictly below the last row y,
/// each mapped to its nearest lattice row.
pub fn tie_rows(lattice: &Lattice, tie_spacing: f64) -> Vec<TieRow> {
    let g = lattice.geometry();
    if g.rows == 0 {
        return Vec::new();
    }
    let y_first = g.y(0);
    let y_last = g.y(g.rows - 1);
    let count = range_len(y_first, y_last, tie_spacing);
    let ys = g.ys();
    (0..count)
        .map(|k| {
            let nominal_y = y_first + k as f64 * tie_spacing;
            TieRow {
                nominal_y,
                row: nearest_row(&ys, nominal_y),
            }
        })
        .collect()
}

/// Index of the row closest to `y`; the lower row wins an exact midpoint.
pub fn nearest_row(ys: &[f64], y: f64) -> usize {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (i, &yi) in ys.iter().enumerate() {
        let d = (yi - y).abs();
        if d < best_d {
            best = i;
            best_d = d;
        }
    }
    best
}

/// Extract the full lattice row for every tie position.
pub fn extract_ties(lattice: &Lattice, tie_spacing: f64) -> Vec<TieProfile> {
    tie_rows(lattice, tie_spacing)
        .into_iter()
        .map(|t| TieProfile {
            nominal_y: t.nominal_y,
            row: t.row,
            cells: lattice.row(t.row).to_vec(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::LatticeGeometry;

    #[test]
    fn ties_are_spaced_and_stop_before_last_row() {
        let g = LatticeGeometry::spanning(0.0, 50.0, 0.0, 1000.0, 12.5);
        assert_eq!(g.rows, 80);
        let lat = Lattice::missing(g);
        let rows = tie_rows(&lat, 150.0);
        // last row y = 987.5 → nominal 0, 150, .., 900
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[1], TieRow { nominal_y: 150.0, row: 12 });
        assert_eq!(rows[6].row, 72);
    }

    #[test]
    fn nearest_row_prefers_lower_on_midpoint() {
        let ys = [0.0, 10.0, 20.0];
        assert_eq!(nearest_row(&ys, 5.0), 0);
        assert_eq!(nearest_row(&ys, 15.0), 1);
        assert_eq!(nearest_row(&ys, 16.0), 2);
        assert_eq!(nearest_row(&ys, -3.0), 0);
    }

    #[test]
    fn off_grid_spacing_snaps_to_nearest_row() {
        let g = LatticeGeometry::spanning(0.0, 10.0, 0.0, 100.0, 10.0);
        let lat = Lattice::missing(g);
        let rows: Vec<usize> = tie_rows(&lat, 23.0).iter().map(|t| t.row).collect();
        // nominal 0, 23, 46, 69 → rows 0, 2, 5, 7
        assert_eq!(rows, vec![0, 2, 5, 7]);
    }

    #[test]
    fn single_row_lattice_has_no_ties() {
        let g = LatticeGeometry::spanning(0.0, 10.0, 0.0, 5.0, 10.0);
        assert!(extract_ties(&Lattice::missing(g), 1.0).is_empty());
    }

    #[test]
    fn profile_holds_full_row_including_missing() {
        let g = LatticeGeometry::spanning(0.0, 3.0, 0.0, 3.0, 1.0);
        let mut lat = Lattice::missing(g);
        lat.set(0, 1, Some(2.0));
        let ties = extract_ties(&lat, 1.0);
        assert_eq!(ties.len(), 2);
        assert_eq!(ties[0].cells, vec![None, Some(2.0), None]);
        assert_eq!(ties[0].valid_cells(), 1);
    }
}

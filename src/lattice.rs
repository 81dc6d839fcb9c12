//! Regular 2-D lattice with optional cells in row-major layout.
//!
//! Row `i` sits at `y = y0 + i * cell`, column `j` at `x = x0 + j * cell`.
//! The backing storage is allocated once at construction; stages only fill or
//! overwrite cells in place.
use serde::Serialize;

/// Placement of a lattice in survey coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LatticeGeometry {
    pub x0: f64,
    pub y0: f64,
    pub cell: f64,
    pub rows: usize,
    pub cols: usize,
}

impl LatticeGeometry {
    /// Geometry covering `[x_min, x_max) × [y_min, y_max)` with step `cell`.
    ///
    /// The node count per axis is `ceil((max - min) / cell)`, the length of a
    /// half-open arithmetic range.
    pub fn spanning(x_min: f64, x_max: f64, y_min: f64, y_max: f64, cell: f64) -> Self {
        Self {
            x0: x_min,
            y0: y_min,
            cell,
            rows: range_len(y_min, y_max, cell),
            cols: range_len(x_min, x_max, cell),
        }
    }

    #[inline]
    pub fn x(&self, col: usize) -> f64 {
        self.x0 + col as f64 * self.cell
    }

    #[inline]
    pub fn y(&self, row: usize) -> f64 {
        self.y0 + row as f64 * self.cell
    }

    pub fn xs(&self) -> Vec<f64> {
        (0..self.cols).map(|j| self.x(j)).collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        (0..self.rows).map(|i| self.y(i)).collect()
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

/// Number of elements in the half-open range `start, start + step, .. < stop`.
pub(crate) fn range_len(start: f64, stop: f64, step: f64) -> usize {
    let n = ((stop - start) / step).ceil();
    if n.is_finite() && n > 0.0 {
        n as usize
    } else {
        0
    }
}

/// Lattice of optional values; `None` marks a missing cell.
#[derive(Clone, Debug)]
pub struct Lattice {
    geometry: LatticeGeometry,
    data: Vec<Option<f64>>,
}

impl Lattice {
    /// Construct an all-missing lattice.
    pub fn missing(geometry: LatticeGeometry) -> Self {
        Self {
            geometry,
            data: vec![None; geometry.len()],
        }
    }

    #[inline]
    pub fn geometry(&self) -> &LatticeGeometry {
        &self.geometry
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.geometry.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.geometry.cols
    }

    #[inline]
    fn idx(&self, row: usize, col: usize) -> usize {
        row * self.geometry.cols + col
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data[self.idx(row, col)]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, v: Option<f64>) {
        let i = self.idx(row, col);
        self.data[i] = v;
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[Option<f64>] {
        let start = row * self.geometry.cols;
        &self.data[start..start + self.geometry.cols]
    }

    #[inline]
    pub fn row_mut(&mut self, row: usize) -> &mut [Option<f64>] {
        let start = row * self.geometry.cols;
        let end = start + self.geometry.cols;
        &mut self.data[start..end]
    }

    /// Copy of column `col`, top to bottom.
    pub fn column(&self, col: usize) -> Vec<Option<f64>> {
        (0..self.rows()).map(|i| self.get(i, col)).collect()
    }

    pub fn as_slice(&self) -> &[Option<f64>] {
        &self.data
    }

    pub fn present_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_some()).count()
    }

    /// Minimum and maximum over present cells.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.data.iter().flatten().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spanning_matches_half_open_range_length() {
        let g = LatticeGeometry::spanning(0.0, 100.0, 10.0, 60.0, 12.5);
        assert_eq!(g.cols, 8);
        assert_eq!(g.rows, 4);
        assert_eq!(g.x(7), 87.5);
        assert_eq!(g.y(3), 47.5);

        let g = LatticeGeometry::spanning(0.0, 101.0, 0.0, 12.5, 12.5);
        assert_eq!(g.cols, 9, "partial trailing cell still gets a node");
        assert_eq!(g.rows, 1);
    }

    #[test]
    fn degenerate_extent_is_empty() {
        let g = LatticeGeometry::spanning(5.0, 5.0, 0.0, 10.0, 1.0);
        assert!(g.is_empty());
        assert_eq!(Lattice::missing(g).as_slice().len(), 0);
    }

    #[test]
    fn rows_and_nodes_are_row_major() {
        let g = LatticeGeometry::spanning(0.0, 3.0, 0.0, 2.0, 1.0);
        let mut lat = Lattice::missing(g);
        lat.set(1, 2, Some(5.0));
        lat.row_mut(0)[0] = Some(-1.0);
        assert_eq!(lat.row(1), &[None, None, Some(5.0)]);
        assert_eq!(lat.column(2), vec![None, Some(5.0)]);
        assert_eq!(lat.present_count(), 2);
        assert_eq!(lat.value_range(), Some((-1.0, 5.0)));
    }
}

//! Scattered samples → regular lattice.
//!
//! Samples are merged per distinct position, triangulated (Delaunay) and the
//! lattice nodes inside each triangle are filled by barycentric (linear)
//! interpolation. Nodes outside the convex hull stay missing.

pub mod triangulation;

use crate::error::DestripeError;
use crate::lattice::{Lattice, LatticeGeometry};
use crate::types::Sample;
use log::debug;
use nalgebra::Point2;
use triangulation::{is_collinear, triangulate, Triangulation};

/// Upper bound on lattice nodes; guards against a tiny `cell` on a large survey.
pub const MAX_LATTICE_NODES: usize = 1 << 28;

/// Relative barycentric tolerance for nodes on triangle edges.
const BARY_EPS: f64 = 1e-10;

/// Lattice produced by [`grid_samples`] with bookkeeping for reports.
#[derive(Clone, Debug)]
pub struct GridOutput {
    pub lattice: Lattice,
    /// Distinct positions used as triangulation vertices.
    pub vertices: usize,
    /// Input samples folded into an already-seen position.
    pub merged_duplicates: usize,
    pub triangles: usize,
}

/// Interpolate finite `samples` onto a lattice with spacing `cell`.
///
/// Non-finite samples are ignored. Fails with
/// [`DestripeError::InsufficientData`] when fewer than three distinct positions
/// remain and [`DestripeError::DegenerateGeometry`] when they are collinear.
pub fn grid_samples(samples: &[Sample], cell: f64) -> Result<GridOutput, DestripeError> {
    let finite: Vec<Sample> = samples.iter().copied().filter(Sample::is_finite).collect();
    let (vertices, values) = merge_positions(&finite);
    if vertices.len() < 3 {
        return Err(DestripeError::InsufficientData {
            needed: 3,
            got: vertices.len(),
        });
    }
    if is_collinear(&vertices) {
        return Err(DestripeError::DegenerateGeometry);
    }

    let (lo, hi) = triangulation::bounds(&vertices);
    let geometry = LatticeGeometry::spanning(lo.x, hi.x, lo.y, hi.y, cell);
    if geometry.rows.saturating_mul(geometry.cols) > MAX_LATTICE_NODES {
        return Err(DestripeError::Configuration(format!(
            "cell {} yields a {}x{} lattice, above the {} node limit",
            cell, geometry.rows, geometry.cols, MAX_LATTICE_NODES
        )));
    }

    let mesh = triangulate(&vertices);
    debug!(
        "gridder: samples={} vertices={} triangles={} lattice={}x{}",
        samples.len(),
        vertices.len(),
        mesh.triangles.len(),
        geometry.rows,
        geometry.cols
    );

    let mut lattice = Lattice::missing(geometry);
    rasterize_linear(&mesh, &values, &mut lattice);

    Ok(GridOutput {
        lattice,
        vertices: vertices.len(),
        merged_duplicates: finite.len() - vertices.len(),
        triangles: mesh.triangles.len(),
    })
}

/// Collapse samples with identical coordinates into one vertex holding the
/// mean value. Output is ordered by (x, y).
fn merge_positions(samples: &[Sample]) -> (Vec<Point2<f64>>, Vec<f64>) {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));

    let mut points: Vec<Point2<f64>> = Vec::with_capacity(sorted.len());
    let mut values: Vec<f64> = Vec::with_capacity(sorted.len());
    let mut run = 0usize;
    for s in sorted {
        match points.last() {
            Some(p) if p.x == s.x && p.y == s.y => {
                run += 1;
                let last = values.len() - 1;
                values[last] += (s.value - values[last]) / run as f64;
            }
            _ => {
                points.push(Point2::new(s.x, s.y));
                values.push(s.value);
                run = 1;
            }
        }
    }
    (points, values)
}

/// Fill lattice nodes covered by mesh triangles by barycentric interpolation.
/// A node on a shared edge keeps the first value written; both neighbours
/// agree there up to rounding.
fn rasterize_linear(mesh: &Triangulation, values: &[f64], lattice: &mut Lattice) {
    let g = *lattice.geometry();
    if g.is_empty() {
        return;
    }
    for t in &mesh.triangles {
        let (a, b, c) = (mesh.points[t[0]], mesh.points[t[1]], mesh.points[t[2]]);
        let v0 = b - a;
        let v1 = c - a;
        let det = triangulation::cross(v0, v1);
        if det.abs() <= f64::MIN_POSITIVE {
            continue;
        }

        let min_x = a.x.min(b.x).min(c.x);
        let max_x = a.x.max(b.x).max(c.x);
        let min_y = a.y.min(b.y).min(c.y);
        let max_y = a.y.max(b.y).max(c.y);
        let Some((j0, j1)) = index_span(min_x, max_x, g.x0, g.cell, g.cols) else {
            continue;
        };
        let Some((i0, i1)) = index_span(min_y, max_y, g.y0, g.cell, g.rows) else {
            continue;
        };

        for i in i0..=i1 {
            let y = g.y(i);
            for j in j0..=j1 {
                if lattice.get(i, j).is_some() {
                    continue;
                }
                let p = Point2::new(g.x(j), y) - a;
                let l1 = triangulation::cross(p, v1) / det;
                let l2 = triangulation::cross(v0, p) / det;
                let l0 = 1.0 - l1 - l2;
                if l0 >= -BARY_EPS && l1 >= -BARY_EPS && l2 >= -BARY_EPS {
                    let v = l0 * values[t[0]] + l1 * values[t[1]] + l2 * values[t[2]];
                    lattice.set(i, j, Some(v));
                }
            }
        }
    }
}

/// Inclusive range of node indices whose coordinate falls in `[lo, hi]`.
fn index_span(lo: f64, hi: f64, origin: f64, cell: f64, n: usize) -> Option<(usize, usize)> {
    let first = ((lo - origin) / cell - BARY_EPS).ceil().max(0.0);
    let last = ((hi - origin) / cell + BARY_EPS).floor();
    if last < 0.0 || first > last || first >= n as f64 {
        return None;
    }
    Some((first as usize, (last as usize).min(n - 1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane(x: f64, y: f64) -> f64 {
        3.0 + 0.5 * x - 0.25 * y
    }

    #[test]
    fn linear_field_is_reproduced_inside_hull() {
        let mut samples = Vec::new();
        for k in 0..60 {
            let x = (k as f64 * 37.0) % 100.0;
            let y = (k as f64 * 61.0) % 80.0;
            samples.push(Sample::new(x, y, plane(x, y)));
        }
        samples.push(Sample::new(0.0, 0.0, plane(0.0, 0.0)));
        samples.push(Sample::new(100.0, 0.0, plane(100.0, 0.0)));
        samples.push(Sample::new(0.0, 80.0, plane(0.0, 80.0)));
        samples.push(Sample::new(100.0, 80.0, plane(100.0, 80.0)));

        let out = grid_samples(&samples, 10.0).expect("gridding succeeds");
        let lat = &out.lattice;
        assert_eq!(lat.cols(), 10);
        assert_eq!(lat.rows(), 8);
        for i in 0..lat.rows() {
            for j in 0..lat.cols() {
                let g = lat.geometry();
                let v = lat.get(i, j).expect("corner samples make every node interior");
                assert!(
                    (v - plane(g.x(j), g.y(i))).abs() < 1e-9,
                    "node ({}, {}) = {} expected {}",
                    i,
                    j,
                    v,
                    plane(g.x(j), g.y(i))
                );
            }
        }
    }

    #[test]
    fn nodes_outside_hull_are_missing() {
        let samples = vec![
            Sample::new(0.0, 0.0, 1.0),
            Sample::new(10.0, 0.0, 1.0),
            Sample::new(0.0, 10.0, 1.0),
        ];
        let out = grid_samples(&samples, 1.0).unwrap();
        let lat = &out.lattice;
        assert_eq!(lat.get(0, 0), Some(1.0));
        assert_eq!(lat.get(9, 9), None, "far corner lies outside the triangle");
        assert_eq!(lat.get(2, 3), Some(1.0));
    }

    #[test]
    fn too_few_samples_is_insufficient_data() {
        let samples = vec![Sample::new(0.0, 0.0, 1.0), Sample::new(1.0, 1.0, 2.0)];
        assert_eq!(
            grid_samples(&samples, 1.0).unwrap_err(),
            DestripeError::InsufficientData { needed: 3, got: 2 }
        );
    }

    #[test]
    fn coincident_samples_are_averaged() {
        let samples = vec![
            Sample::new(5.0, 5.0, 1.0),
            Sample::new(5.0, 5.0, 3.0),
            Sample::new(5.0, 5.0, 8.0),
        ];
        let err = grid_samples(&samples, 1.0).unwrap_err();
        assert_eq!(err, DestripeError::InsufficientData { needed: 3, got: 1 });

        let (pts, vals) = merge_positions(&[
            Sample::new(1.0, 0.0, 2.0),
            Sample::new(0.0, 0.0, 1.0),
            Sample::new(1.0, 0.0, 4.0),
        ]);
        assert_eq!(pts, vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]);
        assert_eq!(vals, vec![1.0, 3.0]);
    }

    #[test]
    fn collinear_samples_are_rejected() {
        let samples: Vec<_> = (0..10)
            .map(|k| Sample::new(k as f64, 2.0 * k as f64 + 1.0, k as f64))
            .collect();
        assert_eq!(
            grid_samples(&samples, 1.0).unwrap_err(),
            DestripeError::DegenerateGeometry
        );
    }

    #[test]
    fn every_node_inside_hull_is_filled() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        for seed in 0..40u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let samples: Vec<Sample> = (0..200)
                .map(|_| Sample::new(rng.gen_range(0.0..1000.0), rng.gen_range(0.0..1000.0), 5.0))
                .collect();
            let out = grid_samples(&samples, 12.5).expect("gridding succeeds");
            let positions: Vec<Point2<f64>> = samples.iter().map(|s| Point2::new(s.x, s.y)).collect();
            let hull = triangulation::convex_hull(&positions);
            let lat = &out.lattice;
            let g = *lat.geometry();
            let mut missing = 0;
            for i in 0..lat.rows() {
                for j in 0..lat.cols() {
                    let p = Point2::new(g.x(j), g.y(i));
                    let inside = (0..hull.len()).all(|k| {
                        let (a, b) = (hull[k], hull[(k + 1) % hull.len()]);
                        triangulation::cross(b - a, p - a) > 1e-6 * (b - a).norm()
                    });
                    match lat.get(i, j) {
                        Some(v) => assert!((v - 5.0).abs() < 1e-9, "seed {seed}: node value {v}"),
                        None if inside => missing += 1,
                        None => {}
                    }
                }
            }
            assert_eq!(missing, 0, "seed {seed}: nodes inside the hull are missing");
        }
    }

    #[test]
    fn oversized_lattice_is_a_configuration_error() {
        let samples = vec![
            Sample::new(0.0, 0.0, 1.0),
            Sample::new(1.0e6, 0.0, 2.0),
            Sample::new(0.0, 1.0e6, 3.0),
        ];
        let err = grid_samples(&samples, 1e-2).unwrap_err();
        assert!(
            matches!(err, DestripeError::Configuration(_)),
            "expected configuration error, got {err:?}"
        );
    }
}

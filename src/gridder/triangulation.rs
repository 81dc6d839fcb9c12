//! Delaunay triangulation by incremental Bowyer–Watson insertion.
//!
//! Points are recentred on their bounding box and scaled to unit extent before
//! insertion. They are inserted in x order so that triangles whose circumcircle
//! lies entirely to the left of the sweep position can be retired early
//! (Bourke's variant), which keeps the working set small for survey-sized
//! inputs. Triangles touching the bounding super-triangle are discarded at the
//! end. That can leave thin pockets along the hull where a boundary edge was
//! not Delaunay with respect to the super vertices; those pockets are closed
//! by ear clipping so the mesh covers the whole convex hull.
use nalgebra::{Point2, Vector2};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Super-triangle size relative to the unit-scaled point cloud.
const SUPER_SCALE: f64 = 100.0;
/// Relative area below which a triangle is treated as degenerate.
const AREA_EPS: f64 = 1e-14;

/// Triangle mesh over a set of planar points.
#[derive(Clone, Debug)]
pub struct Triangulation {
    pub points: Vec<Point2<f64>>,
    /// Vertex indices into `points`, counter-clockwise.
    pub triangles: Vec<[usize; 3]>,
}

#[derive(Clone, Copy)]
struct Tri {
    v: [usize; 3],
    center: Point2<f64>,
    r2: f64,
}

impl Tri {
    fn new(v: [usize; 3], pts: &[Point2<f64>]) -> Self {
        let (a, b, c) = (pts[v[0]], pts[v[1]], pts[v[2]]);
        let ab = b - a;
        let ac = c - a;
        let d = 2.0 * (ab.x * ac.y - ab.y * ac.x);
        if d.abs() <= f64::EPSILON {
            // Collinear: an infinite circumcircle makes the next insertion
            // replace it.
            let center = Point2::from((a.coords + b.coords + c.coords) / 3.0);
            return Self {
                v,
                center,
                r2: f64::INFINITY,
            };
        }
        let ab2 = ab.norm_squared();
        let ac2 = ac.norm_squared();
        let off = Vector2::new(
            (ac.y * ab2 - ab.y * ac2) / d,
            (ab.x * ac2 - ac.x * ab2) / d,
        );
        Self {
            v,
            center: a + off,
            r2: off.norm_squared(),
        }
    }
}

/// Triangulate `points`.
///
/// The caller guarantees at least three distinct, non-collinear points;
/// otherwise the result simply has no triangles.
pub fn triangulate(points: &[Point2<f64>]) -> Triangulation {
    let n = points.len();
    if n < 3 {
        return Triangulation {
            points: points.to_vec(),
            triangles: Vec::new(),
        };
    }

    let (lo, hi) = bounds(points);
    let mid = Point2::from((lo.coords + hi.coords) * 0.5);
    let scale = (hi - lo).amax().max(f64::MIN_POSITIVE);
    let mut local: Vec<Point2<f64>> = points
        .iter()
        .map(|p| Point2::from((p - mid) / scale))
        .collect();
    local.push(Point2::new(-SUPER_SCALE, -1.0));
    local.push(Point2::new(0.0, SUPER_SCALE));
    local.push(Point2::new(SUPER_SCALE, -1.0));

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        local[a]
            .x
            .partial_cmp(&local[b].x)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut open = vec![Tri::new([n, n + 1, n + 2], &local)];
    let mut closed: Vec<Tri> = Vec::new();
    let mut edges: Vec<[usize; 2]> = Vec::new();
    let mut edge_count: HashMap<(usize, usize), u32> = HashMap::new();

    for &pi in &order {
        let p = local[pi];
        edges.clear();
        let mut i = 0;
        while i < open.len() {
            let t = open[i];
            let dx = p.x - t.center.x;
            if dx > 0.0 && dx * dx > t.r2 {
                closed.push(open.swap_remove(i));
                continue;
            }
            if (p - t.center).norm_squared() < t.r2 {
                edges.push([t.v[0], t.v[1]]);
                edges.push([t.v[1], t.v[2]]);
                edges.push([t.v[2], t.v[0]]);
                open.swap_remove(i);
                continue;
            }
            i += 1;
        }

        edge_count.clear();
        for e in &edges {
            *edge_count.entry(edge_key(e)).or_insert(0) += 1;
        }
        for e in &edges {
            if edge_count[&edge_key(e)] == 1 {
                open.push(Tri::new([e[0], e[1], pi], &local));
            }
        }
    }

    let mut triangles: Vec<[usize; 3]> = closed
        .into_iter()
        .chain(open)
        .filter(|t| t.v.iter().all(|&k| k < n))
        .filter_map(|t| orient_ccw(t.v, &local))
        .collect();
    fill_hull_pockets(&mut triangles, &local[..n]);

    Triangulation {
        points: points.to_vec(),
        triangles,
    }
}

/// Add triangles at right-turning boundary vertices until the mesh boundary
/// is convex. Each pass clips every empty ear whose vertices were not touched
/// earlier in the same pass; boundary edges are visited in sorted order.
fn fill_hull_pockets(triangles: &mut Vec<[usize; 3]>, pts: &[Point2<f64>]) {
    loop {
        let directed: HashSet<(usize, usize)> = triangles
            .iter()
            .flat_map(|t| [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])])
            .collect();
        let mut next: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for &(u, v) in &directed {
            if !directed.contains(&(v, u)) {
                next.entry(u).or_default().push(v);
            }
        }
        for targets in next.values_mut() {
            targets.sort_unstable();
        }

        let mut touched: HashSet<usize> = HashSet::new();
        let mut ears: Vec<[usize; 3]> = Vec::new();
        for (&u, targets) in &next {
            for &v in targets {
                let Some(&[w]) = next.get(&v).map(Vec::as_slice) else {
                    continue;
                };
                if w == u || [u, v, w].iter().any(|k| touched.contains(k)) {
                    continue;
                }
                if cross(pts[v] - pts[u], pts[w] - pts[v]) >= 0.0 {
                    continue;
                }
                let Some(ear) = orient_ccw([u, w, v], pts) else {
                    continue;
                };
                if !ear_is_empty(ear, pts) {
                    continue;
                }
                touched.extend([u, v, w]);
                ears.push(ear);
            }
        }
        if ears.is_empty() {
            return;
        }
        triangles.extend(ears);
    }
}

/// No point other than the corners lies in the closed triangle `t` (CCW).
fn ear_is_empty(t: [usize; 3], pts: &[Point2<f64>]) -> bool {
    const TOL: f64 = 1e-12;
    let (a, b, c) = (pts[t[0]], pts[t[1]], pts[t[2]]);
    let (lo_x, hi_x) = (a.x.min(b.x).min(c.x), a.x.max(b.x).max(c.x));
    let (lo_y, hi_y) = (a.y.min(b.y).min(c.y), a.y.max(b.y).max(c.y));
    pts.iter().enumerate().all(|(k, p)| {
        if t.contains(&k)
            || p.x < lo_x - TOL
            || p.x > hi_x + TOL
            || p.y < lo_y - TOL
            || p.y > hi_y + TOL
        {
            return true;
        }
        let inside = cross(b - a, p - a) >= -TOL
            && cross(c - b, p - b) >= -TOL
            && cross(a - c, p - c) >= -TOL;
        !inside
    })
}

fn edge_key(e: &[usize; 2]) -> (usize, usize) {
    (e[0].min(e[1]), e[0].max(e[1]))
}

fn orient_ccw(v: [usize; 3], pts: &[Point2<f64>]) -> Option<[usize; 3]> {
    let area = cross(pts[v[1]] - pts[v[0]], pts[v[2]] - pts[v[0]]);
    if area.abs() <= AREA_EPS {
        None
    } else if area > 0.0 {
        Some(v)
    } else {
        Some([v[0], v[2], v[1]])
    }
}

#[inline]
pub(crate) fn cross(a: Vector2<f64>, b: Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

pub(crate) fn bounds(points: &[Point2<f64>]) -> (Point2<f64>, Point2<f64>) {
    let mut lo = Point2::new(f64::INFINITY, f64::INFINITY);
    let mut hi = Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        lo.x = lo.x.min(p.x);
        lo.y = lo.y.min(p.y);
        hi.x = hi.x.max(p.x);
        hi.y = hi.y.max(p.y);
    }
    (lo, hi)
}

/// True when every point lies on a single line, relative to the cloud extent.
pub fn is_collinear(points: &[Point2<f64>]) -> bool {
    if points.len() < 3 {
        return true;
    }
    let (lo, hi) = bounds(points);
    let extent = (hi - lo).amax();
    if extent <= 0.0 {
        return true;
    }
    let a = points[0];
    let Some(b) = points
        .iter()
        .copied()
        .max_by(|p, q| {
            (p - a)
                .norm_squared()
                .partial_cmp(&(q - a).norm_squared())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    else {
        return true;
    };
    let dir = b - a;
    let len = dir.norm();
    if len <= 0.0 {
        return true;
    }
    let tol = 1e-12 * extent;
    points.iter().all(|p| (cross(dir, p - a) / len).abs() <= tol)
}

/// Convex hull in counter-clockwise order (monotone chain).
#[cfg(test)]
pub(crate) fn convex_hull(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    let mut hull: Vec<Point2<f64>> = Vec::with_capacity(sorted.len() + 1);
    let reversed: Vec<Point2<f64>> = sorted.iter().rev().copied().collect();
    for chain in [&sorted, &reversed] {
        let start = hull.len();
        for &p in chain.iter() {
            while hull.len() >= start + 2 {
                let (a, b) = (hull[hull.len() - 2], hull[hull.len() - 1]);
                if cross(b - a, p - a) > 0.0 {
                    break;
                }
                hull.pop();
            }
            hull.push(p);
        }
        hull.pop();
    }
    hull
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(t: &[usize; 3], pts: &[Point2<f64>]) -> f64 {
        0.5 * cross(pts[t[1]] - pts[t[0]], pts[t[2]] - pts[t[0]])
    }

    #[test]
    fn unit_square_gives_two_triangles() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        let tri = triangulate(&pts);
        assert_eq!(tri.triangles.len(), 2, "got {:?}", tri.triangles);
        let total: f64 = tri.triangles.iter().map(|t| area(t, &pts)).sum();
        assert!((total - 1.0).abs() < 1e-12, "hull area {}", total);
        assert!(tri.triangles.iter().all(|t| area(t, &pts) > 0.0));
    }

    fn hull_area(pts: &[Point2<f64>]) -> f64 {
        let hull = convex_hull(pts);
        let mut a = 0.0;
        for k in 0..hull.len() {
            let (p, q) = (hull[k], hull[(k + 1) % hull.len()]);
            a += p.x * q.y - q.x * p.y;
        }
        0.5 * a
    }

    fn covered_area(tri: &Triangulation) -> f64 {
        tri.triangles.iter().map(|t| area(t, &tri.points)).sum()
    }

    #[test]
    fn grid_points_cover_hull_area() {
        let mut pts = Vec::new();
        for i in 0..6 {
            for j in 0..5 {
                pts.push(Point2::new(i as f64 * 10.0 + 0.3 * (j % 2) as f64, j as f64 * 7.0));
            }
        }
        let tri = triangulate(&pts);
        assert!(tri.triangles.len() >= 30, "got {}", tri.triangles.len());
        let (covered, hull) = (covered_area(&tri), hull_area(&pts));
        assert!(
            (covered - hull).abs() <= 1e-9 * hull,
            "covered area {} hull area {}",
            covered,
            hull
        );
    }

    #[test]
    fn random_clouds_cover_full_hull() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        for seed in 0..40u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let pts: Vec<Point2<f64>> = (0..200)
                .map(|_| Point2::new(rng.gen_range(0.0..1000.0), rng.gen_range(0.0..1000.0)))
                .collect();
            let tri = triangulate(&pts);
            assert!(tri.triangles.iter().all(|t| area(t, &pts) > 0.0));
            let (covered, hull) = (covered_area(&tri), hull_area(&pts));
            assert!(
                (covered - hull).abs() <= 1e-9 * hull,
                "seed {}: covered area {} hull area {}",
                seed,
                covered,
                hull
            );
            // Each interior edge is shared by exactly two triangles.
            let mut uses: HashMap<(usize, usize), u32> = HashMap::new();
            for t in &tri.triangles {
                for e in [[t[0], t[1]], [t[1], t[2]], [t[2], t[0]]] {
                    *uses.entry(edge_key(&e)).or_insert(0) += 1;
                }
            }
            assert!(uses.values().all(|&c| c <= 2), "seed {}: overlapping triangles", seed);
        }
    }

    #[test]
    fn thin_hull_pocket_is_closed() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(3.0, 1e-3),
            Point2::new(6.0, 0.0),
            Point2::new(3.0, 4.0),
        ];
        let tri = triangulate(&pts);
        let expected = 0.5 * 6.0 * 4.0;
        assert!(
            (covered_area(&tri) - expected).abs() < 1e-9,
            "covered {}",
            covered_area(&tri)
        );
    }

    #[test]
    fn empty_circumcircles() {
        let pts: Vec<Point2<f64>> = (0..40)
            .map(|k| {
                let t = k as f64;
                Point2::new((t * 37.0) % 101.0, (t * 53.0) % 89.0)
            })
            .collect();
        let tri = triangulate(&pts);
        assert!(!tri.triangles.is_empty());
        for t in &tri.triangles {
            let c = Tri::new(*t, &pts);
            for (k, p) in pts.iter().enumerate() {
                if t.contains(&k) {
                    continue;
                }
                assert!(
                    (p - c.center).norm_squared() >= c.r2 * (1.0 - 1e-9),
                    "point {} inside circumcircle of {:?}",
                    k,
                    t
                );
            }
        }
    }

    #[test]
    fn collinear_detection() {
        let line: Vec<_> = (0..5).map(|k| Point2::new(k as f64, 2.0 * k as f64)).collect();
        assert!(is_collinear(&line));
        let mut bent = line.clone();
        bent.push(Point2::new(1.0, 0.0));
        assert!(!is_collinear(&bent));
    }
}

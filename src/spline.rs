//! Natural cubic smoothing spline (Reinsch formulation).
//!
//! Given strictly increasing `x`, values `y`, weights `w` and a tolerance `s`,
//! the fitted spline `g` minimises `∫ g''(t)² dt` subject to
//!
//! ```text
//! Σ (w_i · (y_i − g(x_i)))² ≤ s
//! ```
//!
//! With second derivatives `γ` at the interior knots and the smoothing weight
//! `λ`, the fit solves the pentadiagonal system `(R + λ Qᵀ D² Q) γ = Qᵀ y` and
//! sets `g = y − λ D² Q γ` where `D = diag(1 / w)`. The residual grows
//! monotonically with `λ` from 0 (interpolation) towards the residual of the
//! weighted least-squares line, so the constraint is met by a one-dimensional
//! search over `log λ`.
use log::warn;
use nalgebra::{Matrix2, Vector2};

/// Relative tolerance on the achieved residual.
const RESIDUAL_RTOL: f64 = 1e-8;
const MAX_BRACKET_STEPS: usize = 64;
const MAX_BISECTIONS: usize = 200;

/// Fitted smoothing spline. Evaluation outside `[x_0, x_{n-1}]` extends the
/// cubic of the nearest end interval.
#[derive(Clone, Debug)]
pub struct SmoothingSpline {
    x: Vec<f64>,
    g: Vec<f64>,
    /// Second derivatives at every knot; zero at both ends.
    c2: Vec<f64>,
    residual: f64,
    lambda: f64,
}

impl SmoothingSpline {
    /// Fit with unit weights.
    pub fn fit(x: &[f64], y: &[f64], s: f64) -> Option<Self> {
        let w = vec![1.0; x.len()];
        Self::fit_weighted(x, y, &w, s)
    }

    /// Fit with per-point weights `w` (residuals are multiplied by `w_i`).
    ///
    /// Returns `None` for fewer than two points, mismatched lengths,
    /// non-increasing `x`, non-positive weights or a system that fails to
    /// factor.
    pub fn fit_weighted(x: &[f64], y: &[f64], w: &[f64], s: f64) -> Option<Self> {
        let n = x.len();
        if n < 2 || y.len() != n || w.len() != n {
            return None;
        }
        if x.windows(2).any(|p| !(p[1] > p[0])) || w.iter().any(|&wi| !(wi > 0.0)) {
            return None;
        }
        if n == 2 {
            return Some(Self {
                x: x.to_vec(),
                g: y.to_vec(),
                c2: vec![0.0; 2],
                residual: 0.0,
                lambda: 0.0,
            });
        }

        let system = System::new(x, w);
        let s = s.max(0.0);

        let line = weighted_line(x, y, w)?;
        let line_residual = weighted_residual(y, &line, w);
        if s >= line_residual {
            return Some(Self {
                x: x.to_vec(),
                g: line,
                c2: vec![0.0; n],
                residual: line_residual,
                lambda: f64::INFINITY,
            });
        }
        if s == 0.0 {
            let sol = system.solve(y, 0.0)?;
            return Some(Self::from_solution(x, sol, 0.0));
        }

        let lambda = search_lambda(&system, y, s)?;
        let sol = system.solve(y, lambda)?;
        Some(Self::from_solution(x, sol, lambda))
    }

    fn from_solution(x: &[f64], sol: Solution, lambda: f64) -> Self {
        let mut c2 = Vec::with_capacity(x.len());
        c2.push(0.0);
        c2.extend_from_slice(&sol.gamma);
        c2.push(0.0);
        Self {
            x: x.to_vec(),
            g: sol.g,
            c2,
            residual: sol.residual,
            lambda,
        }
    }

    /// Weighted residual sum of squares at the knots.
    pub fn residual(&self) -> f64 {
        self.residual
    }

    /// Smoothing weight used (0 = interpolation, ∞ = straight line).
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn eval(&self, t: f64) -> f64 {
        let n = self.x.len();
        // Interval index, clamped so that out-of-range points use an end piece.
        let k = match self.x.partition_point(|&xi| xi <= t) {
            0 => 0,
            p => (p - 1).min(n - 2),
        };
        let h = self.x[k + 1] - self.x[k];
        let a = (self.x[k + 1] - t) / h;
        let b = (t - self.x[k]) / h;
        a * self.g[k]
            + b * self.g[k + 1]
            + ((a * a * a - a) * self.c2[k] + (b * b * b - b) * self.c2[k + 1]) * h * h / 6.0
    }

    pub fn eval_many(&self, ts: &[f64]) -> Vec<f64> {
        ts.iter().map(|&t| self.eval(t)).collect()
    }
}

struct Solution {
    gamma: Vec<f64>,
    g: Vec<f64>,
    residual: f64,
}

/// Banded pieces of `Q`, `R` and `D²` for a fixed abscissa and weights.
struct System {
    /// Column `k` of `Q` has `qa[k]`, `qb[k]`, `qc[k]` at rows `k`, `k+1`, `k+2`.
    qa: Vec<f64>,
    qb: Vec<f64>,
    qc: Vec<f64>,
    r_diag: Vec<f64>,
    r_off: Vec<f64>,
    /// `D²` diagonal, i.e. `1 / w²`.
    d2: Vec<f64>,
    /// Pentadiagonal bands of `Qᵀ D² Q`.
    p0: Vec<f64>,
    p1: Vec<f64>,
    p2: Vec<f64>,
}

impl System {
    fn new(x: &[f64], w: &[f64]) -> Self {
        let n = x.len();
        let m = n - 2;
        let h: Vec<f64> = x.windows(2).map(|p| p[1] - p[0]).collect();
        let d2: Vec<f64> = w.iter().map(|wi| 1.0 / (wi * wi)).collect();

        let mut qa = vec![0.0; m];
        let mut qb = vec![0.0; m];
        let mut qc = vec![0.0; m];
        let mut r_diag = vec![0.0; m];
        let mut r_off = vec![0.0; m.saturating_sub(1)];
        for k in 0..m {
            qa[k] = 1.0 / h[k];
            qc[k] = 1.0 / h[k + 1];
            qb[k] = -qa[k] - qc[k];
            r_diag[k] = (h[k] + h[k + 1]) / 3.0;
            if k + 1 < m {
                r_off[k] = h[k + 1] / 6.0;
            }
        }

        let mut p0 = vec![0.0; m];
        let mut p1 = vec![0.0; m.saturating_sub(1)];
        let mut p2 = vec![0.0; m.saturating_sub(2)];
        for k in 0..m {
            p0[k] = qa[k] * qa[k] * d2[k] + qb[k] * qb[k] * d2[k + 1] + qc[k] * qc[k] * d2[k + 2];
            if k + 1 < m {
                p1[k] = qb[k] * qa[k + 1] * d2[k + 1] + qc[k] * qb[k + 1] * d2[k + 2];
            }
            if k + 2 < m {
                p2[k] = qc[k] * qa[k + 2] * d2[k + 2];
            }
        }

        Self {
            qa,
            qb,
            qc,
            r_diag,
            r_off,
            d2,
            p0,
            p1,
            p2,
        }
    }

    fn interior(&self) -> usize {
        self.r_diag.len()
    }

    /// `Q v` for `v` of interior length.
    fn q_mul(&self, v: &[f64]) -> Vec<f64> {
        let m = self.interior();
        let mut out = vec![0.0; m + 2];
        for k in 0..m {
            out[k] += self.qa[k] * v[k];
            out[k + 1] += self.qb[k] * v[k];
            out[k + 2] += self.qc[k] * v[k];
        }
        out
    }

    /// `Qᵀ y`.
    fn qt_mul(&self, y: &[f64]) -> Vec<f64> {
        (0..self.interior())
            .map(|k| self.qa[k] * y[k] + self.qb[k] * y[k + 1] + self.qc[k] * y[k + 2])
            .collect()
    }

    fn solve(&self, y: &[f64], lambda: f64) -> Option<Solution> {
        let m = self.interior();
        let diag: Vec<f64> = (0..m).map(|k| self.r_diag[k] + lambda * self.p0[k]).collect();
        let off1: Vec<f64> = (0..m.saturating_sub(1))
            .map(|k| self.r_off[k] + lambda * self.p1[k])
            .collect();
        let off2: Vec<f64> = self.p2.iter().map(|v| lambda * v).collect();
        let gamma = solve_pentadiagonal(&diag, &off1, &off2, &self.qt_mul(y))?;

        let qg = self.q_mul(&gamma);
        let mut residual = 0.0;
        let g: Vec<f64> = y
            .iter()
            .zip(&qg)
            .zip(&self.d2)
            .map(|((&yi, &qi), &di)| {
                let shift = lambda * di * qi;
                // (w · shift)² with w² = 1 / d²
                residual += shift * shift / di;
                yi - shift
            })
            .collect();
        Some(Solution { gamma, g, residual })
    }

    /// Balance point between the roughness and fidelity terms; a scale for
    /// the first bracket of the search.
    fn lambda_scale(&self) -> f64 {
        let r: f64 = self.r_diag.iter().sum();
        let p: f64 = self.p0.iter().sum();
        if p > 0.0 && r > 0.0 {
            r / p
        } else {
            1.0
        }
    }
}

/// Solve a symmetric positive-definite pentadiagonal system by banded LDLᵀ.
///
/// `d` is the main diagonal, `e1` the first and `e2` the second
/// super-diagonal.
fn solve_pentadiagonal(d: &[f64], e1: &[f64], e2: &[f64], rhs: &[f64]) -> Option<Vec<f64>> {
    let m = d.len();
    let mut dd = vec![0.0; m];
    let mut l1 = vec![0.0; m];
    let mut l2 = vec![0.0; m];
    for i in 0..m {
        let mut di = d[i];
        if i >= 1 {
            di -= l1[i - 1] * l1[i - 1] * dd[i - 1];
        }
        if i >= 2 {
            di -= l2[i - 2] * l2[i - 2] * dd[i - 2];
        }
        if !(di > 0.0) || !di.is_finite() {
            return None;
        }
        dd[i] = di;
        if i + 1 < m {
            let mut v = e1[i];
            if i >= 1 {
                v -= l1[i - 1] * dd[i - 1] * l2[i - 1];
            }
            l1[i] = v / di;
        }
        if i + 2 < m {
            l2[i] = e2[i] / di;
        }
    }

    let mut z = rhs.to_vec();
    for i in 0..m {
        if i >= 1 {
            z[i] -= l1[i - 1] * z[i - 1];
        }
        if i >= 2 {
            z[i] -= l2[i - 2] * z[i - 2];
        }
    }
    for i in 0..m {
        z[i] /= dd[i];
    }
    for i in (0..m).rev() {
        if i + 1 < m {
            z[i] -= l1[i] * z[i + 1];
        }
        if i + 2 < m {
            z[i] -= l2[i] * z[i + 2];
        }
    }
    Some(z)
}

/// Weighted least-squares straight line evaluated at the knots.
fn weighted_line(x: &[f64], y: &[f64], w: &[f64]) -> Option<Vec<f64>> {
    // Centre x to keep the normal equations well conditioned.
    let xm = x.iter().sum::<f64>() / x.len() as f64;
    let mut a = Matrix2::<f64>::zeros();
    let mut b = Vector2::<f64>::zeros();
    for ((&xi, &yi), &wi) in x.iter().zip(y).zip(w) {
        let w2 = wi * wi;
        let t = xi - xm;
        a[(0, 0)] += w2;
        a[(0, 1)] += w2 * t;
        a[(1, 1)] += w2 * t * t;
        b[0] += w2 * yi;
        b[1] += w2 * t * yi;
    }
    a[(1, 0)] = a[(0, 1)];
    let coef = a.lu().solve(&b)?;
    Some(x.iter().map(|&xi| coef[0] + coef[1] * (xi - xm)).collect())
}

fn weighted_residual(y: &[f64], g: &[f64], w: &[f64]) -> f64 {
    y.iter()
        .zip(g)
        .zip(w)
        .map(|((yi, gi), wi)| {
            let r = wi * (yi - gi);
            r * r
        })
        .sum()
}

/// Find `λ` with residual ≈ `s`, assuming `0 < s < line residual`.
fn search_lambda(system: &System, y: &[f64], s: f64) -> Option<f64> {
    let residual_at = |lambda: f64| system.solve(y, lambda).map(|sol| sol.residual);

    let mut hi = system.lambda_scale();
    let mut steps = 0;
    while residual_at(hi)? < s {
        hi *= 10.0;
        steps += 1;
        if steps > MAX_BRACKET_STEPS {
            warn!("smoothing spline: could not bracket residual {:.3e}", s);
            return Some(hi);
        }
    }
    let mut lo = hi;
    steps = 0;
    while residual_at(lo)? > s {
        lo /= 10.0;
        steps += 1;
        if steps > MAX_BRACKET_STEPS {
            warn!("smoothing spline: residual {:.3e} not reached as lambda shrinks", s);
            return Some(lo);
        }
    }

    let (mut log_lo, mut log_hi) = (lo.ln(), hi.ln());
    for _ in 0..MAX_BISECTIONS {
        let mid = 0.5 * (log_lo + log_hi);
        let f = residual_at(mid.exp())?;
        if (f - s).abs() <= RESIDUAL_RTOL * s {
            return Some(mid.exp());
        }
        if f < s {
            log_lo = mid;
        } else {
            log_hi = mid;
        }
    }
    Some((0.5 * (log_lo + log_hi)).exp())
}

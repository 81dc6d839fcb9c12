//! Two-stage smoothing of tie profiles: Gaussian low-pass over the valid
//! cells, then a smoothing spline evaluated at every lattice column.
use crate::filters::{convolve_reflect, GaussianKernel};
use crate::spline::SmoothingSpline;
use crate::ties::TieProfile;
use log::warn;

/// Profiles with fewer valid cells than this are not smoothed by default.
pub const DEFAULT_MIN_PROFILE_CELLS: usize = 10;

/// Smoothing knobs shared by every tie profile.
#[derive(Clone, Debug)]
pub struct ProfileSmoother {
    kernel: GaussianKernel,
    spline_smooth: f64,
    min_cells: usize,
}

/// Outcome for one tie profile.
#[derive(Clone, Debug)]
pub struct SmoothedProfile {
    /// Full-length values aligned with the lattice columns, or `None` when the
    /// profile had too few valid cells.
    pub values: Option<Vec<f64>>,
    pub valid_cells: usize,
    /// Weighted residual of the spline stage.
    pub spline_residual: Option<f64>,
}

impl ProfileSmoother {
    pub fn new(lp_sigma: f64, spline_smooth: f64, min_cells: usize) -> Self {
        Self {
            kernel: GaussianKernel::new(lp_sigma),
            spline_smooth,
            min_cells,
        }
    }

    /// Smooth one profile whose cells sit at column coordinates `xs`.
    pub fn smooth(&self, cells: &[Option<f64>], xs: &[f64]) -> SmoothedProfile {
        let (x_valid, v_valid): (Vec<f64>, Vec<f64>) = xs
            .iter()
            .zip(cells)
            .filter_map(|(&x, c)| c.map(|v| (x, v)))
            .unzip();
        let valid_cells = x_valid.len();
        if valid_cells < self.min_cells {
            return SmoothedProfile {
                values: None,
                valid_cells,
                spline_residual: None,
            };
        }

        let low_passed = convolve_reflect(&self.kernel, &v_valid);
        match SmoothingSpline::fit(&x_valid, &low_passed, self.spline_smooth) {
            Some(spline) => SmoothedProfile {
                values: Some(spline.eval_many(xs)),
                valid_cells,
                spline_residual: Some(spline.residual()),
            },
            None => {
                warn!(
                    "profile smoother: spline fit failed on {} valid cells",
                    valid_cells
                );
                SmoothedProfile {
                    values: None,
                    valid_cells,
                    spline_residual: None,
                }
            }
        }
    }

    pub fn smooth_tie(&self, tie: &TieProfile, xs: &[f64]) -> SmoothedProfile {
        self.smooth(&tie.cells, xs)
    }
}

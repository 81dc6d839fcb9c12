//! Report describing what each stage of a de-striping run did.
//!
//! [`DestripeReport`] is returned by
//! [`Destriper::run_with_diagnostics`](crate::Destriper::run_with_diagnostics)
//! and serialises to camelCase JSON for the CLI's `report_json` output.

pub mod timing;

pub use timing::{Stage, StageTiming, TimingBreakdown};

use crate::lattice::LatticeGeometry;
use crate::types::JoinMode;
use serde::Serialize;

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub samples: usize,
    /// Samples with finite coordinates and value.
    pub finite_samples: usize,
    /// Distinct positions used as triangulation vertices.
    pub vertices: usize,
    pub merged_duplicates: usize,
    pub triangles: usize,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatticeDescriptor {
    pub x0: f64,
    pub y0: f64,
    pub cell: f64,
    pub rows: usize,
    pub cols: usize,
    pub present_cells: usize,
}

impl LatticeDescriptor {
    pub fn new(geometry: &LatticeGeometry, present_cells: usize) -> Self {
        Self {
            x0: geometry.x0,
            y0: geometry.y0,
            cell: geometry.cell,
            rows: geometry.rows,
            cols: geometry.cols,
            present_cells,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TieDescriptor {
    pub nominal_y: f64,
    pub row: usize,
    pub valid_cells: usize,
    pub smoothed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spline_residual: Option<f64>,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorSurfaceStage {
    pub filled_columns: usize,
    pub total_columns: usize,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionStage {
    pub join: JoinMode,
    pub corrected_cells: usize,
    pub matched_samples: usize,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DestripeReport {
    pub input: InputDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lattice: Option<LatticeDescriptor>,
    pub ties: Vec<TieDescriptor>,
    pub error_surface: ErrorSurfaceStage,
    pub correction: CorrectionStage,
    pub timings: TimingBreakdown,
}

impl DestripeReport {
    /// Ties whose profile was smoothed and placed on the error surface.
    pub fn smoothed_ties(&self) -> usize {
        self.ties.iter().filter(|t| t.smoothed).count()
    }

    /// Short multi-line summary for terminal output.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "input: samples={} finite={} vertices={} merged={} triangles={}\n",
            self.input.samples,
            self.input.finite_samples,
            self.input.vertices,
            self.input.merged_duplicates,
            self.input.triangles
        ));
        if let Some(l) = &self.lattice {
            out.push_str(&format!(
                "lattice: {}x{} cell={} origin=({:.3}, {:.3}) present={}\n",
                l.rows, l.cols, l.cell, l.x0, l.y0, l.present_cells
            ));
        }
        out.push_str(&format!(
            "ties: {} ({} smoothed)\n",
            self.ties.len(),
            self.smoothed_ties()
        ));
        out.push_str(&format!(
            "error surface: {}/{} columns\n",
            self.error_surface.filled_columns, self.error_surface.total_columns
        ));
        out.push_str(&format!(
            "correction: join={:?} cells={} matched_samples={}/{}\n",
            self.correction.join,
            self.correction.corrected_cells,
            self.correction.matched_samples,
            self.input.samples
        ));
        out.push_str(&format!("total_ms={:.3}", self.timings.total_ms));
        for s in &self.timings.stages {
            out.push_str(&format!(" {:?}={:.3}", s.stage, s.elapsed_ms));
        }
        out
    }
}

//! De-striping pipeline driving the stages end-to-end.
//!
//! ```no_run
//! use destripe::{DestripeParams, Destriper, Sample};
//!
//! # fn example(samples: Vec<Sample>) -> Result<(), destripe::DestripeError> {
//! let destriper = Destriper::new(DestripeParams::default())?;
//! let detailed = destriper.run_with_diagnostics(&samples, false)?;
//! println!("matched {} samples", detailed.output.matched());
//! println!("{}", detailed.report.summary());
//! # Ok(())
//! # }
//! ```
use super::params::DestripeParams;
use crate::corrector::{join_samples, subtract_in_place};
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::{
    CorrectionStage, DestripeReport, ErrorSurfaceStage, InputDescriptor, LatticeDescriptor, Stage,
    TieDescriptor, TimingBreakdown,
};
use crate::error::DestripeError;
use crate::error_surface::build_error_surface;
use crate::gridder::grid_samples;
use crate::lattice::Lattice;
use crate::smoother::ProfileSmoother;
use crate::table::{ColumnTable, ColumnValues, SampleTable};
use crate::ties::{extract_ties, TieRow};
use crate::types::{DestripeOutput, Sample};
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Names of the input columns and of the column receiving the result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnBindings {
    pub x: String,
    pub y: String,
    pub value: String,
    pub output: String,
}

impl Default for ColumnBindings {
    fn default() -> Self {
        Self {
            x: "x".to_string(),
            y: "y".to_string(),
            value: "tmi".to_string(),
            output: "CORR4".to_string(),
        }
    }
}

/// Intermediate lattices kept for debugging and previews.
#[derive(Clone, Debug)]
pub struct LatticeSnapshots {
    pub gridded: Lattice,
    pub error_surface: Lattice,
    pub corrected: Lattice,
}

/// Output plus the report of how it was produced.
#[derive(Clone, Debug)]
pub struct DetailedResult {
    pub output: DestripeOutput,
    pub report: DestripeReport,
    pub lattices: Option<LatticeSnapshots>,
}

/// Stateless de-striping pipeline with validated parameters.
#[derive(Clone, Debug)]
pub struct Destriper {
    params: DestripeParams,
}

impl Destriper {
    /// Create a pipeline, failing fast on invalid parameters.
    pub fn new(params: DestripeParams) -> Result<Self, DestripeError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &DestripeParams {
        &self.params
    }

    /// Corrected value for every sample, in input order.
    pub fn run(&self, samples: &[Sample]) -> Result<DestripeOutput, DestripeError> {
        self.run_with_diagnostics(samples, false)
            .map(|detailed| detailed.output)
    }

    /// Run the pipeline and report on every stage. With `keep_lattices` the
    /// gridded, error and corrected lattices are returned as well.
    pub fn run_with_diagnostics(
        &self,
        samples: &[Sample],
        keep_lattices: bool,
    ) -> Result<DetailedResult, DestripeError> {
        let p = &self.params;
        let total_start = Instant::now();
        let mut timings = TimingBreakdown::default();
        debug!(
            "Destriper::run start samples={} cell={} tie_spacing={} lp_sigma={} spline_smooth={}",
            samples.len(),
            p.cell,
            p.tie_spacing,
            p.lp_sigma,
            p.spline_smooth
        );

        let started = Instant::now();
        let grid = grid_samples(samples, p.cell)?;
        timings.finish(Stage::Grid, started);
        let mut lattice = grid.lattice;
        let geometry = *lattice.geometry();
        let input = InputDescriptor {
            samples: samples.len(),
            finite_samples: samples.iter().filter(|s| s.is_finite()).count(),
            vertices: grid.vertices,
            merged_duplicates: grid.merged_duplicates,
            triangles: grid.triangles,
        };
        let lattice_desc = LatticeDescriptor::new(&geometry, lattice.present_count());

        let started = Instant::now();
        let ties = extract_ties(&lattice, p.tie_spacing);
        timings.finish(Stage::Ties, started);

        let started = Instant::now();
        let smoother = ProfileSmoother::new(p.lp_sigma, p.spline_smooth, p.min_profile_cells);
        let xs = geometry.xs();
        let mut tie_rows: Vec<TieRow> = Vec::with_capacity(ties.len());
        let mut profiles: Vec<Option<Vec<f64>>> = Vec::with_capacity(ties.len());
        let mut tie_desc: Vec<TieDescriptor> = Vec::with_capacity(ties.len());
        for tie in &ties {
            let smoothed = smoother.smooth_tie(tie, &xs);
            tie_desc.push(TieDescriptor {
                nominal_y: tie.nominal_y,
                row: tie.row,
                valid_cells: smoothed.valid_cells,
                smoothed: smoothed.values.is_some(),
                spline_residual: smoothed.spline_residual,
            });
            tie_rows.push(TieRow {
                nominal_y: tie.nominal_y,
                row: tie.row,
            });
            profiles.push(smoothed.values);
        }
        drop(ties);
        timings.finish(Stage::Smooth, started);
        debug!(
            "Destriper::run ties={} smoothed={}",
            tie_desc.len(),
            profiles.iter().filter(|v| v.is_some()).count()
        );

        let started = Instant::now();
        let error = build_error_surface(geometry, &tie_rows, &profiles, p.spline_smooth);
        timings.finish(Stage::ErrorSurface, started);

        let started = Instant::now();
        let gridded = keep_lattices.then(|| lattice.clone());
        let corrected_cells = subtract_in_place(&mut lattice, &error.surface);
        let corrected = join_samples(&lattice, samples, p.join);
        timings.finish(Stage::Correct, started);

        let output = DestripeOutput { corrected };
        timings.total_ms = elapsed_ms(total_start);
        let report = DestripeReport {
            input,
            lattice: Some(lattice_desc),
            ties: tie_desc,
            error_surface: ErrorSurfaceStage {
                filled_columns: error.filled_columns,
                total_columns: geometry.cols,
            },
            correction: CorrectionStage {
                join: p.join,
                corrected_cells,
                matched_samples: output.matched(),
            },
            timings,
        };
        debug!(
            "Destriper::run done corrected_cells={} matched={} total_ms={:.3}",
            corrected_cells,
            report.correction.matched_samples,
            report.timings.total_ms
        );

        let lattices = gridded.map(|gridded| LatticeSnapshots {
            gridded,
            error_surface: error.surface,
            corrected: lattice,
        });

        Ok(DetailedResult {
            output,
            report,
            lattices,
        })
    }

    /// Corrected values for a column-oriented source, one per table row.
    /// Rows with a missing x, y or value are skipped and stay missing.
    pub fn run_columns<T: ColumnTable + ?Sized>(
        &self,
        table: &T,
        bindings: &ColumnBindings,
    ) -> Result<Vec<Option<f64>>, DestripeError> {
        let (rows, samples) = samples_from_table(table, bindings)?;
        let output = self.run(&samples)?;
        let mut corrected = vec![None; table.row_count()];
        for (row, value) in rows.into_iter().zip(output.corrected) {
            corrected[row] = value;
        }
        Ok(corrected)
    }
}

/// Samples from the bound columns plus the table row each came from.
pub fn samples_from_table<T: ColumnTable + ?Sized>(
    table: &T,
    bindings: &ColumnBindings,
) -> Result<(Vec<usize>, Vec<Sample>), DestripeError> {
    let xs = table.numeric_column(&bindings.x)?;
    let ys = table.numeric_column(&bindings.y)?;
    let vs = table.numeric_column(&bindings.value)?;
    let n = table.row_count();
    if xs.len() != n || ys.len() != n || vs.len() != n {
        return Err(DestripeError::Table(format!(
            "bound columns do not match the table's {} rows",
            n
        )));
    }
    let mut rows = Vec::with_capacity(n);
    let mut samples = Vec::with_capacity(n);
    for (row, ((x, y), v)) in xs.into_iter().zip(ys).zip(vs).enumerate() {
        if let (Some(x), Some(y), Some(v)) = (x, y, v) {
            rows.push(row);
            samples.push(Sample::new(x, y, v));
        }
    }
    Ok((rows, samples))
}

/// One-shot helper: validate `params` and de-stripe `samples`.
pub fn destripe(samples: &[Sample], params: &DestripeParams) -> Result<DestripeOutput, DestripeError> {
    Destriper::new(params.clone())?.run(samples)
}

/// De-stripe a table and return a copy with the output column appended
/// (or replaced if it already exists).
pub fn destripe_table(
    table: &SampleTable,
    bindings: &ColumnBindings,
    params: &DestripeParams,
) -> Result<SampleTable, DestripeError> {
    table.validate()?;
    let corrected = Destriper::new(params.clone())?.run_columns(table, bindings)?;
    let mut out = table.clone();
    out.set_column(&bindings.output, ColumnValues::Numeric(corrected))?;
    Ok(out)
}

#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod destriper;
pub mod diagnostics;
pub mod error;
pub mod table;
pub mod types;

// Stage modules: public for tools and tests, but considered internals.
pub mod corrector;
pub mod error_surface;
pub mod filters;
pub mod gridder;
pub mod lattice;
pub mod smoother;
pub mod spline;
pub mod ties;

// Binary support.
pub mod config;
pub mod io;

// --- High-level re-exports -------------------------------------------------

pub use crate::destriper::{destripe, destripe_table, ColumnBindings, DestripeParams, Destriper};
pub use crate::error::DestripeError;
pub use crate::types::{DestripeOutput, JoinMode, Sample};

pub use crate::diagnostics::DestripeReport;
pub use crate::lattice::{Lattice, LatticeGeometry};
pub use crate::table::{ColumnTable, SampleTable};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use destripe::prelude::*;
///
/// # fn main() -> Result<(), DestripeError> {
/// let samples: Vec<Sample> = (0..400)
///     .map(|i| {
///         let (x, y) = ((i % 20) as f64 * 50.0, (i / 20) as f64 * 50.0);
///         Sample::new(x, y, 0.01 * x + if (i / 20) % 2 == 0 { 1.0 } else { -1.0 })
///     })
///     .collect();
/// let out = destripe(&samples, &DestripeParams::default())?;
/// println!("matched {} of {}", out.matched(), out.len());
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::{
        destripe, destripe_table, ColumnBindings, DestripeError, DestripeOutput, DestripeParams,
        Destriper, JoinMode, Sample, SampleTable,
    };
}

//! De-striping (tie-line leveling) of gridded survey data.
//!
//! Overview
//! - Grids scattered samples onto a regular lattice by linear interpolation
//!   over a Delaunay triangulation.
//! - Takes every `tie_spacing`-th row (nearest lattice row) as a tie profile.
//! - Low-passes each tie profile and fits a smoothing spline through it,
//!   evaluated across the full lattice width.
//! - Interpolates the smoothed ties across lines, column by column, into a
//!   full error surface.
//! - Subtracts the surface and joins corrected nodes back onto the samples.
//!
//! Modules
//! - [`params`] – pipeline parameters and their validation.
//! - `pipeline` – the [`Destriper`] driver and table helpers.

pub mod params;
mod pipeline;

pub use params::DestripeParams;
pub use pipeline::{
    destripe, destripe_table, samples_from_table, ColumnBindings, DetailedResult, Destriper,
    LatticeSnapshots,
};

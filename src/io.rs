//! File helpers for tables, JSON reports and lattice previews.
//!
//! - `load_table` / `save_table`: column-oriented JSON sample tables.
//! - `write_json_file`: pretty-print a serializable value to disk.
//! - `save_lattice_png`: write a lattice as an 8-bit grayscale PNG.
use crate::lattice::Lattice;
use crate::table::SampleTable;
use image::{GrayImage, Luma};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Read a [`SampleTable`] from JSON and check that its columns line up.
pub fn load_table(path: &Path) -> Result<SampleTable, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read table {}: {e}", path.display()))?;
    let table: SampleTable = serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse table {}: {e}", path.display()))?;
    table
        .validate()
        .map_err(|e| format!("Invalid table {}: {e}", path.display()))?;
    Ok(table)
}

pub fn save_table(path: &Path, table: &SampleTable) -> Result<(), String> {
    write_json_file(path, table)
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

/// Map present cells linearly onto `1..=255` (min → 1); missing cells are 0.
/// Row 0 (smallest y) is written at the bottom so north is up.
pub fn lattice_to_gray(lattice: &Lattice) -> GrayImage {
    let (w, h) = (lattice.cols() as u32, lattice.rows() as u32);
    let mut out = GrayImage::new(w, h);
    let Some((lo, hi)) = lattice.value_range() else {
        return out;
    };
    let span = if hi > lo { hi - lo } else { 1.0 };
    for i in 0..lattice.rows() {
        let py = h - 1 - i as u32;
        for (j, cell) in lattice.row(i).iter().enumerate() {
            if let Some(v) = cell {
                let t = ((v - lo) / span).clamp(0.0, 1.0);
                out.put_pixel(j as u32, py, Luma([1 + (t * 254.0).round() as u8]));
            }
        }
    }
    out
}

/// Save a lattice preview to a grayscale PNG.
pub fn save_lattice_png(lattice: &Lattice, path: &Path) -> Result<(), String> {
    if lattice.rows() == 0 || lattice.cols() == 0 {
        return Err(format!("Refusing to save empty lattice to {}", path.display()));
    }
    ensure_parent_dir(path)?;
    lattice_to_gray(lattice)
        .save(path)
        .map_err(|e| format!("Failed to save {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}

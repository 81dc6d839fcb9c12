use destripe::config::{load_config, RuntimeConfig};
use destripe::destriper::{samples_from_table, DetailedResult, Destriper};
use destripe::io::{load_table, save_lattice_png, save_table, write_json_file};
use destripe::table::{ColumnTable, ColumnValues};
use log::info;
use std::env;
use std::path::Path;

fn main() {
    if let Err(err) = flexi_logger::Logger::try_with_env_or_str("info")
        .and_then(|logger| logger.start())
    {
        eprintln!("Warning: logger unavailable: {err}");
    }
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn usage() -> String {
    "Usage: destripe <config.json>".to_string()
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path))?;

    let table = load_table(&config.input)?;
    info!(
        "loaded {} rows from {}",
        table.row_count(),
        config.input.display()
    );

    let destriper = Destriper::new(config.params.clone()).map_err(|e| e.to_string())?;
    let (rows, samples) =
        samples_from_table(&table, &config.columns).map_err(|e| e.to_string())?;
    let detailed = destriper
        .run_with_diagnostics(&samples, config.debug_dir.is_some())
        .map_err(|e| e.to_string())?;

    let mut corrected = vec![None; table.row_count()];
    for (row, value) in rows.iter().zip(&detailed.output.corrected) {
        corrected[*row] = *value;
    }
    let mut out = table;
    out.set_column(&config.columns.output, ColumnValues::Numeric(corrected))
        .map_err(|e| e.to_string())?;
    save_table(&config.output, &out)?;

    print_text_summary(&config, &detailed);

    if let Some(path) = &config.report_json {
        write_json_file(path, &detailed.report)?;
        println!("JSON report written to {}", path.display());
    }
    if let Some(dir) = &config.debug_dir {
        save_debug_artifacts(dir, &detailed)?;
        println!("Debug artifacts written to {}", dir.display());
    }
    Ok(())
}

fn print_text_summary(config: &RuntimeConfig, detailed: &DetailedResult) {
    println!("De-striping summary");
    println!(
        "  params: cell={} tie_spacing={} lp_sigma={} spline_smooth={} join={:?}",
        config.params.cell,
        config.params.tie_spacing,
        config.params.lp_sigma,
        config.params.spline_smooth,
        config.params.join
    );
    for line in detailed.report.summary().lines() {
        println!("  {line}");
    }
    println!(
        "  output: {} ({} values in column '{}')",
        config.output.display(),
        detailed.output.matched(),
        config.columns.output
    );
}

fn save_debug_artifacts(dir: &Path, detailed: &DetailedResult) -> Result<(), String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("Failed to create debug dir {}: {e}", dir.display()))?;
    write_json_file(&dir.join("report.json"), &detailed.report)?;
    let Some(lattices) = &detailed.lattices else {
        return Ok(());
    };
    for (name, lattice) in [
        ("gridded", &lattices.gridded),
        ("error_surface", &lattices.error_surface),
        ("corrected", &lattices.corrected),
    ] {
        if lattice.present_count() == 0 {
            continue;
        }
        save_lattice_png(lattice, &dir.join(format!("{name}.png")))?;
    }
    Ok(())
}

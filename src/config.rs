//! JSON runtime configuration for the `destripe` binary.
//!
//! ```json
//! {
//!   "input": "survey.json",
//!   "output": "survey_corr4.json",
//!   "columns": { "x": "x", "y": "y", "value": "tmi", "output": "CORR4" },
//!   "params": { "cell": 12.5, "tie_spacing": 150, "join": "exact" },
//!   "report_json": "out/report.json",
//!   "debug_dir": "out/debug"
//! }
//! ```
use crate::destriper::{ColumnBindings, DestripeParams};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Deserialize)]
pub struct RuntimeConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub columns: ColumnBindings,
    #[serde(default)]
    pub params: DestripeParams,
    #[serde(default)]
    pub report_json: Option<PathBuf>,
    /// Directory receiving PNG previews of the intermediate lattices.
    #[serde(default)]
    pub debug_dir: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    parse_config(&contents).map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

pub fn parse_config(contents: &str) -> Result<RuntimeConfig, serde_json::Error> {
    serde_json::from_str(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JoinMode;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = parse_config(r#"{"input": "a.json", "output": "b.json"}"#).unwrap();
        assert_eq!(cfg.input, PathBuf::from("a.json"));
        assert_eq!(cfg.columns, ColumnBindings::default());
        assert_eq!(cfg.params, DestripeParams::default());
        assert!(cfg.report_json.is_none() && cfg.debug_dir.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = parse_config(
            r#"{"input": "a.json", "output": "b.json",
                "columns": {"value": "mag", "output": "mag_lev"},
                "params": {"lp_sigma": 2, "join": "nearest_cell"},
                "debug_dir": "dbg"}"#,
        )
        .unwrap();
        assert_eq!(cfg.columns.value, "mag");
        assert_eq!(cfg.columns.x, "x");
        assert_eq!(cfg.columns.output, "mag_lev");
        assert_eq!(cfg.params.lp_sigma, 2.0);
        assert_eq!(cfg.params.join, JoinMode::NearestCell);
        assert_eq!(cfg.debug_dir, Some(PathBuf::from("dbg")));
    }

    #[test]
    fn missing_output_is_an_error() {
        assert!(parse_config(r#"{"input": "a.json"}"#).is_err());
    }
}

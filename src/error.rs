//! Error type shared by the de-striping pipeline.

/// Failures surfaced by the pipeline. Degenerate tie profiles and columns are
/// not errors; they show up as missing values in the output instead.
#[derive(Debug, Clone, PartialEq)]
pub enum DestripeError {
    /// Fewer distinct sample positions than a triangulation needs.
    InsufficientData { needed: usize, got: usize },
    /// All sample positions lie on one line.
    DegenerateGeometry,
    /// Parameter values that cannot produce a usable lattice.
    Configuration(String),
    /// A bound column is absent from the input table.
    MissingColumn(String),
    /// The input table is malformed (e.g. ragged columns, wrong column kind).
    Table(String),
}

impl std::fmt::Display for DestripeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientData { needed, got } => write!(
                f,
                "insufficient data: need {} distinct sample positions, got {}",
                needed, got
            ),
            Self::DegenerateGeometry => {
                write!(f, "insufficient data: sample positions are collinear")
            }
            Self::Configuration(msg) => write!(f, "invalid configuration: {}", msg),
            Self::MissingColumn(name) => write!(f, "missing column '{}'", name),
            Self::Table(msg) => write!(f, "malformed table: {}", msg),
        }
    }
}

impl std::error::Error for DestripeError {}

impl DestripeError {
    /// True for the "too few / degenerate samples" class of failures.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(
            self,
            Self::InsufficientData { .. } | Self::DegenerateGeometry
        )
    }
}

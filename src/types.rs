use serde::{Deserialize, Serialize};

/// One survey observation in planar coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

impl Sample {
    pub fn new(x: f64, y: f64, value: f64) -> Self {
        Self { x, y, value }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.value.is_finite()
    }
}

/// How corrected lattice nodes are mapped back onto the input samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinMode {
    /// A sample only receives a value when its coordinates are bitwise equal
    /// to a lattice node. Scattered samples rarely are, so most outputs end up
    /// missing; kept as the default for fidelity with the reference workflow.
    #[default]
    Exact,
    /// A sample receives the value of its nearest lattice node.
    NearestCell,
}

/// Per-sample result of a de-striping run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DestripeOutput {
    /// Corrected value for every input sample, in input order.
    pub corrected: Vec<Option<f64>>,
}

impl DestripeOutput {
    pub fn len(&self) -> usize {
        self.corrected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corrected.is_empty()
    }

    /// Number of samples that received a corrected value.
    pub fn matched(&self) -> usize {
        self.corrected.iter().filter(|v| v.is_some()).count()
    }
}

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Pipeline stages in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Triangulation and rasterisation onto the lattice.
    Grid,
    /// Tie row lookup and profile extraction.
    Ties,
    /// Low-pass and spline fit of every tie profile.
    Smooth,
    /// Column spline pass.
    ErrorSurface,
    /// Subtraction and sample join.
    Correct,
}

/// Wall-clock duration of one stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub stage: Stage,
    pub elapsed_ms: f64,
}

/// Stage timings of one de-striping run, in execution order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

impl TimingBreakdown {
    /// Record `stage` as having run since `start`.
    pub fn finish(&mut self, stage: Stage, start: Instant) {
        self.stages.push(StageTiming {
            stage,
            elapsed_ms: elapsed_ms(start),
        });
    }

    pub fn stage_ms(&self, stage: Stage) -> Option<f64> {
        self.stages
            .iter()
            .find(|s| s.stage == stage)
            .map(|s| s.elapsed_ms)
    }
}

pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_serialize_in_snake_case() {
        let mut t = TimingBreakdown::default();
        t.stages.push(StageTiming {
            stage: Stage::ErrorSurface,
            elapsed_ms: 1.5,
        });
        let json = serde_json::to_string(&t).unwrap();
        assert!(json.contains("\"stage\":\"error_surface\""), "{json}");
        assert!(json.contains("\"elapsedMs\":1.5"), "{json}");
        assert_eq!(t.stage_ms(Stage::ErrorSurface), Some(1.5));
        assert_eq!(t.stage_ms(Stage::Grid), None);
    }
}

//! Verification report: ordered per-stage verdicts.
//!
//! The runner builds a [`VerificationReport`] incrementally and returns it
//! by value; nothing else accumulates results. A stage absent from the
//! report was never attempted (fatal upstream failure), so rendering never
//! emits placeholder lines.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageStatus {
    Pass,
    Fail,
}

impl StageStatus {
    pub fn marker(&self) -> &'static str {
        match self {
            StageStatus::Pass => "✅",
            StageStatus::Fail => "❌",
        }
    }
}

/// Verdict for one attempted stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: String,
    pub status: StageStatus,
    pub message: String,
    /// Content hash of the produced artifact, when the stage produced one.
    pub artifact_hash: Option<String>,
    pub latency_ms: u64,
}

impl StageResult {
    pub fn pass(stage: &str, message: impl Into<String>) -> Self {
        StageResult {
            stage: stage.to_string(),
            status: StageStatus::Pass,
            message: message.into(),
            artifact_hash: None,
            latency_ms: 0,
        }
    }

    pub fn fail(stage: &str, message: impl Into<String>) -> Self {
        StageResult {
            stage: stage.to_string(),
            status: StageStatus::Fail,
            message: message.into(),
            artifact_hash: None,
            latency_ms: 0,
        }
    }

    pub fn with_artifact_hash(mut self, hash: String) -> Self {
        self.artifact_hash = Some(hash);
        self
    }

    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn passed(&self) -> bool {
        self.status == StageStatus::Pass
    }
}

/// Ordered sequence of stage results for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationReport {
    results: Vec<StageResult>,
}

impl VerificationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: StageResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[StageResult] {
        &self.results
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// True iff every attempted stage passed and at least one stage ran.
    pub fn all_passed(&self) -> bool {
        !self.results.is_empty() && self.results.iter().all(StageResult::passed)
    }

    /// One line per attempted stage: marker, stage name, message.
    pub fn render(&self) -> String {
        self.results
            .iter()
            .map(|r| format!("{} {}: {}", r.status.marker(), r.stage, r.message))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_one_line_per_attempted_stage() {
        let mut report = VerificationReport::new();
        report.push(StageResult::pass("Load", "Data loaded successfully"));
        report.push(StageResult::fail("Clean", "VALIDATE/nulls remain"));
        let rendered = report.render();
        assert_eq!(
            rendered,
            "✅ Load: Data loaded successfully\n❌ Clean: VALIDATE/nulls remain"
        );
        // No placeholder lines for Merge/Aggregate.
        assert_eq!(rendered.lines().count(), 2);
    }

    #[test]
    fn test_all_passed() {
        let mut report = VerificationReport::new();
        assert!(!report.all_passed());
        report.push(StageResult::pass("Load", "ok"));
        assert!(report.all_passed());
        report.push(StageResult::fail("Clean", "bad"));
        assert!(!report.all_passed());
    }
}

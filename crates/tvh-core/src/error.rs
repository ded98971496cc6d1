//! Unified error model for the harness.

use thiserror::Error;

/// Every failure the harness can report.
///
/// Only [`HarnessError::Load`] is fatal to a run; everything else is
/// recorded as a single stage's FAIL and the pipeline continues with the
/// stages whose dependencies are still satisfiable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HarnessError {
    /// Candidate or input file unreadable/malformed, or a required
    /// capability is missing. Halts the run.
    #[error("LOAD/{0}")]
    Load(String),

    /// A stage's output violates its structural contract.
    #[error("VALIDATE/{0}")]
    Validation(String),

    /// The aggregate output matched the hardcoding heuristic.
    #[error("ANTICHEAT/{0}")]
    AntiCheat(String),

    /// Candidate code panicked or returned an error at the invocation
    /// boundary.
    #[error("FAULT/{0}")]
    Fault(String),

    /// The stage watchdog expired before the candidate returned.
    #[error("TIMEOUT/stage exceeded {0} ms")]
    Timeout(u64),

    /// The source tokenizer could not make sense of the candidate text.
    #[error("SOURCE/{0}")]
    Source(String),
}

impl HarnessError {
    /// Fatal errors halt the whole run; the rest fail a single stage.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Load(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_category_prefix() {
        let err = HarnessError::Load("candidate file missing".to_string());
        assert_eq!(err.to_string(), "LOAD/candidate file missing");
        let err = HarnessError::Timeout(5000);
        assert_eq!(err.to_string(), "TIMEOUT/stage exceeded 5000 ms");
    }

    #[test]
    fn test_only_load_is_fatal() {
        assert!(HarnessError::Load("x".into()).is_fatal());
        assert!(!HarnessError::Validation("x".into()).is_fatal());
        assert!(!HarnessError::AntiCheat("x".into()).is_fatal());
        assert!(!HarnessError::Fault("x".into()).is_fatal());
        assert!(!HarnessError::Timeout(1).is_fatal());
    }
}

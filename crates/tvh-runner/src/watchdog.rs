//! Bounded-time capability invocation.
//!
//! Candidate code is untrusted and may not terminate, so every
//! invocation runs on a helper thread while the runner waits with a
//! deadline. On expiry the stage is failed with a timeout; the runaway
//! thread is abandoned (the harness provides no cancellation of
//! candidate code). Panics inside the candidate are caught and surfaced
//! as the stage's fault.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::warn;

use tvh_candidate::{CapArg, Capability, LoadedCandidate};
use tvh_core::{HarnessError, Table};

/// Invoke `cap` with `args`, waiting at most `timeout`.
pub fn invoke_with_deadline(
    candidate: &LoadedCandidate,
    cap: Capability,
    args: Vec<CapArg>,
    timeout: Duration,
) -> Result<Table, HarnessError> {
    let func = candidate.capability(cap)?;
    let (tx, rx) = mpsc::channel();
    let handle = thread::Builder::new()
        .name(format!("tvh-cap-{}", cap.wire_name()))
        .spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| func(&args)));
            let _ = tx.send(outcome);
        })
        .map_err(|e| HarnessError::Fault(format!("cannot spawn capability thread: {e}")))?;

    match rx.recv_timeout(timeout) {
        Ok(Ok(result)) => {
            let _ = handle.join();
            result
        }
        Ok(Err(payload)) => {
            let _ = handle.join();
            Err(HarnessError::Fault(format!(
                "capability '{cap}' panicked: {}",
                panic_message(payload.as_ref())
            )))
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!(capability = %cap, ?timeout, "watchdog expired, abandoning capability thread");
            Err(HarnessError::Timeout(timeout.as_millis() as u64))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(HarnessError::Fault(format!(
            "capability '{cap}' thread exited without a result"
        ))),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "opaque panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tvh_candidate::registry::{capability, CapabilityMap};
    use tvh_core::Cell;

    fn candidate_with_aggregate(
        f: impl Fn(&[CapArg]) -> Result<Table, HarnessError> + Send + Sync + 'static,
    ) -> LoadedCandidate {
        let mut caps = CapabilityMap::new();
        caps.insert(Capability::TotalByMembership, capability(f));
        LoadedCandidate::from_parts("inline", caps, HashMap::new())
    }

    #[test]
    fn test_result_passes_through() {
        let candidate = candidate_with_aggregate(|_| {
            let mut t = Table::new(vec!["A"]);
            t.push_row(vec![Cell::Int(1)])?;
            Ok(t)
        });
        let table = invoke_with_deadline(
            &candidate,
            Capability::TotalByMembership,
            vec![],
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(table.n_rows(), 1);
    }

    #[test]
    fn test_panic_becomes_a_fault() {
        let candidate = candidate_with_aggregate(|_| panic!("boom"));
        let err = invoke_with_deadline(
            &candidate,
            Capability::TotalByMembership,
            vec![],
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, HarnessError::Fault(_)));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_deadline_expiry_is_a_timeout() {
        let candidate = candidate_with_aggregate(|_| {
            thread::sleep(Duration::from_secs(5));
            Ok(Table::new(vec!["A"]))
        });
        let err = invoke_with_deadline(
            &candidate,
            Capability::TotalByMembership,
            vec![],
            Duration::from_millis(50),
        )
        .unwrap_err();
        assert!(matches!(err, HarnessError::Timeout(50)));
    }
}

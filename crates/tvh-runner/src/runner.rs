//! Pipeline runner: fixed stage order, artifact store, fatal-load policy.

use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, info};

use tvh_anticheat::analyze;
use tvh_candidate::{CapArg, Capability, LoadedCandidate};
use tvh_core::{HarnessError, RunContext, StageResult, Table, VerificationReport};

use crate::stages::{ArtifactId, StageKind, PIPELINE};
use crate::validate;
use crate::watchdog::invoke_with_deadline;

/// What a successful stage hands back to the loop.
struct StageOutput {
    message: &'static str,
    artifacts: Vec<(ArtifactId, Table)>,
}

/// Executes the declared pipeline against one loaded candidate and
/// returns the finalized report. The runner owns the artifact store for
/// the duration of the run; results accumulate nowhere else.
pub struct PipelineRunner<'a> {
    candidate: &'a LoadedCandidate,
    ctx: &'a RunContext,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(candidate: &'a LoadedCandidate, ctx: &'a RunContext) -> Self {
        PipelineRunner { candidate, ctx }
    }

    /// Run every stage whose dependencies are satisfiable.
    ///
    /// Any fault inside a stage becomes that stage's FAIL and the loop
    /// continues; a Load failure halts the run since no raw artifacts
    /// exist to build from.
    pub fn run(&self) -> VerificationReport {
        let mut report = VerificationReport::new();
        let mut store: HashMap<ArtifactId, Table> = HashMap::new();

        for stage in PIPELINE {
            if let Some(missing) = stage
                .dependencies()
                .iter()
                .find(|dep| !store.contains_key(*dep))
            {
                report.push(StageResult::fail(
                    stage.name(),
                    format!("required artifact {missing:?} unavailable, upstream stage failed"),
                ));
                continue;
            }

            info!(trace_id = %self.ctx.trace_id, stage = stage.name(), "stage started");
            let start = Instant::now();
            let outcome = self.run_stage(stage, &store);
            let latency_ms = start.elapsed().as_millis() as u64;

            match outcome {
                Ok(output) => {
                    let mut result = StageResult::pass(stage.name(), output.message)
                        .with_latency_ms(latency_ms);
                    if let Some((_, table)) = output.artifacts.last() {
                        result = result.with_artifact_hash(table.fingerprint());
                    }
                    for (id, table) in output.artifacts {
                        debug!(stage = stage.name(), artifact = ?id, hash = %table.fingerprint(), "artifact stored");
                        store.insert(id, table);
                    }
                    report.push(result);
                }
                Err(err) => {
                    info!(stage = stage.name(), error = %err, "stage failed");
                    report.push(
                        StageResult::fail(stage.name(), err.to_string())
                            .with_latency_ms(latency_ms),
                    );
                    // Without raw artifacts nothing downstream can run.
                    if stage == StageKind::Load {
                        break;
                    }
                }
            }
        }

        report
    }

    fn run_stage(
        &self,
        stage: StageKind,
        store: &HashMap<ArtifactId, Table>,
    ) -> Result<StageOutput, HarnessError> {
        // Copy-on-read: every stage gets independent clones of the
        // artifacts it depends on.
        let input = |id: ArtifactId| -> Result<Table, HarnessError> {
            store
                .get(&id)
                .cloned()
                .ok_or_else(|| HarnessError::Validation(format!("artifact {id:?} unavailable")))
        };

        match stage {
            StageKind::Load => {
                let customers = self.invoke(
                    Capability::LoadCustomers,
                    vec![CapArg::Path(self.ctx.customers_path.display().to_string())],
                )?;
                let transactions = self.invoke(
                    Capability::LoadTransactions,
                    vec![CapArg::Path(self.ctx.transactions_path.display().to_string())],
                )?;
                Ok(StageOutput {
                    message: "Data loaded successfully",
                    artifacts: vec![
                        (ArtifactId::RawCustomers, customers),
                        (ArtifactId::RawTransactions, transactions),
                    ],
                })
            }
            StageKind::Clean => {
                let raw = input(ArtifactId::RawTransactions)?;
                let cleaned =
                    self.invoke(Capability::CleanTransactions, vec![CapArg::Table(raw)])?;
                validate::has_no_nulls(&cleaned)?;
                validate::has_no_duplicate_rows(&cleaned)?;
                Ok(StageOutput {
                    message: "Null handling and duplicate removal passed",
                    artifacts: vec![(ArtifactId::Cleaned, cleaned)],
                })
            }
            StageKind::Merge => {
                let transactions = input(ArtifactId::RawTransactions)?;
                let customers = input(ArtifactId::RawCustomers)?;
                let merged = self.invoke(
                    Capability::MergeData,
                    vec![CapArg::Table(transactions), CapArg::Table(customers)],
                )?;
                validate::has_columns(&merged, &validate::MERGED_COLUMNS)?;
                validate::is_non_empty(&merged)?;
                Ok(StageOutput {
                    message: "Merge operation successful",
                    artifacts: vec![(ArtifactId::Merged, merged)],
                })
            }
            StageKind::Aggregate => {
                let merged = input(ArtifactId::Merged)?;
                let totals =
                    self.invoke(Capability::TotalByMembership, vec![CapArg::Table(merged)])?;
                validate::has_columns(&totals, &validate::TOTALS_COLUMNS)?;
                validate::is_non_empty(&totals).map_err(|_| {
                    HarnessError::Validation("Empty result - possibly hardcoded".to_string())
                })?;
                if stage.anticheat_applies() {
                    let source = self
                        .candidate
                        .capability_source(Capability::TotalByMembership)
                        .ok_or_else(|| {
                            HarnessError::Source(
                                "aggregate capability source unavailable".to_string(),
                            )
                        })?;
                    let verdict = analyze(source, &totals);
                    if verdict.suspicious {
                        return Err(HarnessError::AntiCheat(format!(
                            "hardcoded return detected: {}",
                            verdict.evidence
                        )));
                    }
                }
                Ok(StageOutput {
                    message: "Aggregation by MembershipLevel passed with anti-cheat",
                    artifacts: vec![(ArtifactId::Totals, totals)],
                })
            }
        }
    }

    fn invoke(&self, cap: Capability, args: Vec<CapArg>) -> Result<Table, HarnessError> {
        invoke_with_deadline(self.candidate, cap, args, self.ctx.stage_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;
    use tvh_candidate::registry::capability;
    use tvh_candidate::samples;
    use tvh_candidate::{CandidateRegistry, ModuleLoader};
    use tvh_core::StageStatus;

    fn fixtures() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../testing/fixtures")
    }

    fn run_context() -> RunContext {
        RunContext::new(
            fixtures().join("data/customers.csv"),
            fixtures().join("data/transactions.csv"),
        )
    }

    fn load(name: &str) -> LoadedCandidate {
        let registry = CandidateRegistry::with_samples();
        ModuleLoader::new(&registry)
            .load(&fixtures().join("candidates").join(name))
            .unwrap()
    }

    fn statuses(report: &VerificationReport) -> Vec<StageStatus> {
        report.results().iter().map(|r| r.status).collect()
    }

    #[test]
    fn test_scenario_a_correct_candidate_passes_every_stage() {
        let candidate = load("reference.rs");
        let ctx = run_context();
        let report = PipelineRunner::new(&candidate, &ctx).run();
        assert_eq!(report.results().len(), 4);
        assert!(report.all_passed(), "report:\n{}", report.render());
        assert!(report.render().contains("Data loaded successfully"));
        assert!(report.render().contains("anti-cheat"));
    }

    #[test]
    fn test_scenario_b_hardcoded_aggregate_fails_with_diagnostic() {
        let candidate = load("hardcoded.rs");
        let ctx = run_context();
        let report = PipelineRunner::new(&candidate, &ctx).run();
        assert_eq!(
            statuses(&report),
            [
                StageStatus::Pass,
                StageStatus::Pass,
                StageStatus::Pass,
                StageStatus::Fail
            ]
        );
        let aggregate = &report.results()[3];
        assert!(
            aggregate.message.contains("hardcoded return detected"),
            "message: {}",
            aggregate.message
        );
    }

    #[test]
    fn test_scenario_c_missing_transactions_file_halts_the_run() {
        let candidate = load("reference.rs");
        let ctx = RunContext::new(
            fixtures().join("data/customers.csv"),
            fixtures().join("data/nope.csv"),
        );
        let report = PipelineRunner::new(&candidate, &ctx).run();
        assert_eq!(report.results().len(), 1);
        assert_eq!(report.results()[0].status, StageStatus::Fail);
        assert!(!report.render().contains("Clean"));
        assert!(!report.render().contains("Merge"));
    }

    #[test]
    fn test_clean_failure_does_not_block_merge_or_aggregate() {
        // Clean returns its input untouched, nulls and duplicates intact.
        let mut caps = samples::reference_capabilities().unwrap();
        caps.insert(
            Capability::CleanTransactions,
            capability(|args: &[tvh_candidate::CapArg]| Ok(args[0].as_table()?.clone())),
        );
        let reference = load("reference.rs");
        let sources = Capability::REQUIRED
            .into_iter()
            .map(|c| (c, reference.capability_source(c).unwrap().to_string()))
            .collect();
        let candidate = LoadedCandidate::from_parts("sloppy", caps, sources);
        let report = PipelineRunner::new(&candidate, &run_context()).run();
        assert_eq!(
            statuses(&report),
            [
                StageStatus::Pass,
                StageStatus::Fail,
                StageStatus::Pass,
                StageStatus::Pass
            ]
        );
        assert!(report.results()[1].message.contains("VALIDATE/"));
    }

    #[test]
    fn test_invalid_merge_marks_aggregate_failed_without_invoking_it() {
        let mut caps = samples::reference_capabilities().unwrap();
        caps.insert(
            Capability::MergeData,
            capability(|_args: &[tvh_candidate::CapArg]| {
                let mut t = Table::new(vec!["X"]);
                t.push_row(vec![tvh_core::Cell::Int(1)])?;
                Ok(t)
            }),
        );
        let reference = load("reference.rs");
        let sources = Capability::REQUIRED
            .into_iter()
            .map(|c| (c, reference.capability_source(c).unwrap().to_string()))
            .collect();
        let candidate = LoadedCandidate::from_parts("badmerge", caps, sources);
        let report = PipelineRunner::new(&candidate, &run_context()).run();
        assert_eq!(
            statuses(&report),
            [
                StageStatus::Pass,
                StageStatus::Pass,
                StageStatus::Fail,
                StageStatus::Fail
            ]
        );
        assert!(report.results()[3].message.contains("unavailable"));
    }

    #[test]
    fn test_hanging_stage_times_out_and_later_stages_still_run() {
        let mut caps = samples::reference_capabilities().unwrap();
        caps.insert(
            Capability::CleanTransactions,
            capability(|_args: &[tvh_candidate::CapArg]| {
                std::thread::sleep(Duration::from_millis(500));
                Ok(Table::new(vec!["A"]))
            }),
        );
        let reference = load("reference.rs");
        let sources = Capability::REQUIRED
            .into_iter()
            .map(|c| (c, reference.capability_source(c).unwrap().to_string()))
            .collect();
        let candidate = LoadedCandidate::from_parts("hanging", caps, sources);
        let ctx = run_context().with_stage_timeout(Duration::from_millis(50));
        let report = PipelineRunner::new(&candidate, &ctx).run();
        assert_eq!(
            statuses(&report),
            [
                StageStatus::Pass,
                StageStatus::Fail,
                StageStatus::Pass,
                StageStatus::Pass
            ]
        );
        assert!(report.results()[1].message.contains("TIMEOUT/"));
    }

    #[test]
    fn test_identical_runs_produce_identical_reports() {
        let candidate = load("reference.rs");
        let ctx = run_context();
        let first = PipelineRunner::new(&candidate, &ctx).run();
        let second = PipelineRunner::new(&candidate, &ctx).run();
        assert_eq!(first.render(), second.render());
    }
}

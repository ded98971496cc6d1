//! TVH Runner: dependency-aware pipeline execution over a candidate.
//!
//! Drives the four declared stages in order, feeding artifacts forward,
//! validating each stage's output and continuing past independently
//! runnable failures. Only a Load failure halts the run.

pub mod runner;
pub mod stages;
pub mod validate;
pub mod watchdog;

pub use runner::PipelineRunner;
pub use stages::{ArtifactId, StageKind, PIPELINE};

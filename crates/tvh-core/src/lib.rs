//! TVH Core: table model, error taxonomy, run context and report.
//!
//! Shared foundation for the verification harness. The other crates build
//! on these types: the loader produces candidates that return [`Table`]s,
//! the runner accumulates [`report::StageResult`]s into a
//! [`report::VerificationReport`], and every failure is a [`HarnessError`].

pub mod context;
pub mod error;
pub mod report;
pub mod table;

pub use context::RunContext;
pub use error::HarnessError;
pub use report::{StageResult, StageStatus, VerificationReport};
pub use table::{Cell, Table};

/// Harness engine version
pub const TVH_VERSION: &str = "0.1.0";

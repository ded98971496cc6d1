//! Run context: fixture paths and watchdog budget shared by every stage.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Per-run settings, created once by the caller and shared read-only.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Trace id for log correlation.
    pub trace_id: String,
    /// Customers fixture path, handed to `load_customers`.
    pub customers_path: PathBuf,
    /// Transactions fixture path, handed to `load_transactions`.
    pub transactions_path: PathBuf,
    /// Watchdog budget for a single capability invocation.
    pub stage_timeout: Duration,
    pub started_at: DateTime<Utc>,
}

impl RunContext {
    pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new<P: Into<PathBuf>>(customers_path: P, transactions_path: P) -> Self {
        RunContext {
            trace_id: uuid::Uuid::new_v4().to_string(),
            customers_path: customers_path.into(),
            transactions_path: transactions_path.into(),
            stage_timeout: Self::DEFAULT_STAGE_TIMEOUT,
            started_at: Utc::now(),
        }
    }

    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }
}

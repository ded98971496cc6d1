//! Capability contract and candidate registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tvh_core::{HarnessError, Table};

/// The five operations every candidate must expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    LoadCustomers,
    LoadTransactions,
    CleanTransactions,
    MergeData,
    TotalByMembership,
}

impl Capability {
    /// Full required capability set, in pipeline order.
    pub const REQUIRED: [Capability; 5] = [
        Capability::LoadCustomers,
        Capability::LoadTransactions,
        Capability::CleanTransactions,
        Capability::MergeData,
        Capability::TotalByMembership,
    ];

    /// Stable operation name, as it appears in candidate source.
    pub fn wire_name(self) -> &'static str {
        match self {
            Capability::LoadCustomers => "load_customers",
            Capability::LoadTransactions => "load_transactions",
            Capability::CleanTransactions => "clean_transaction_data",
            Capability::MergeData => "merge_data",
            Capability::TotalByMembership => "calculate_total_by_membership",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// One argument crossing the candidate boundary.
#[derive(Debug, Clone)]
pub enum CapArg {
    Path(String),
    Table(Table),
}

impl CapArg {
    pub fn as_path(&self) -> Result<&str, HarnessError> {
        match self {
            CapArg::Path(p) => Ok(p),
            CapArg::Table(_) => Err(HarnessError::Fault(
                "capability expected a path argument, got a table".to_string(),
            )),
        }
    }

    pub fn as_table(&self) -> Result<&Table, HarnessError> {
        match self {
            CapArg::Table(t) => Ok(t),
            CapArg::Path(_) => Err(HarnessError::Fault(
                "capability expected a table argument, got a path".to_string(),
            )),
        }
    }
}

/// Loaded callable form of one capability.
pub type CapabilityFn = Arc<dyn Fn(&[CapArg]) -> Result<Table, HarnessError> + Send + Sync>;

pub type CapabilityMap = HashMap<Capability, CapabilityFn>;

/// Instantiates a candidate's capability map. Runs arbitrary candidate
/// code; a factory error is reported as a `LoadError`.
pub type CandidateFactory = fn() -> Result<CapabilityMap, HarnessError>;

/// Explicit name → factory mapping. Passed by value to the loader; there
/// is no global registry.
#[derive(Default)]
pub struct CandidateRegistry {
    factories: HashMap<String, CandidateFactory>,
}

impl CandidateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the bundled sample candidates.
    pub fn with_samples() -> Self {
        let mut registry = Self::new();
        crate::samples::register(&mut registry);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, factory: CandidateFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn resolve(&self, name: &str) -> Option<CandidateFactory> {
        self.factories.get(name).copied()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Wrap a closure as a [`CapabilityFn`].
pub fn capability<F>(f: F) -> CapabilityFn
where
    F: Fn(&[CapArg]) -> Result<Table, HarnessError> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_set_is_complete() {
        let names: Vec<&str> = Capability::REQUIRED.iter().map(|c| c.wire_name()).collect();
        assert_eq!(
            names,
            [
                "load_customers",
                "load_transactions",
                "clean_transaction_data",
                "merge_data",
                "calculate_total_by_membership",
            ]
        );
    }

    #[test]
    fn test_registry_resolution() {
        let registry = CandidateRegistry::with_samples();
        assert!(registry.resolve("reference").is_some());
        assert!(registry.resolve("hardcoded").is_some());
        assert!(registry.resolve("unknown").is_none());
    }

    #[test]
    fn test_cap_arg_kind_mismatch_is_a_fault() {
        let arg = CapArg::Path("data.csv".to_string());
        assert!(arg.as_path().is_ok());
        assert!(matches!(arg.as_table(), Err(HarnessError::Fault(_))));
    }
}

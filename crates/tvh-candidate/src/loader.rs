//! Module loader: candidate instantiation + capability-set validation.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use tvh_core::{HarnessError, Table};

use crate::registry::{CandidateRegistry, CapArg, Capability, CapabilityFn, CapabilityMap};
use crate::source;

/// A validated candidate: callable form plus raw source text per
/// capability. Immutable for the rest of the run.
pub struct LoadedCandidate {
    name: String,
    caps: CapabilityMap,
    sources: HashMap<Capability, String>,
}

impl std::fmt::Debug for LoadedCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedCandidate")
            .field("name", &self.name)
            .field("caps", &self.caps.keys().collect::<Vec<_>>())
            .field("sources", &self.sources.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl LoadedCandidate {
    /// Assemble a candidate directly, bypassing file loading. Used by
    /// embedders and tests that synthesize candidates in memory.
    pub fn from_parts(
        name: impl Into<String>,
        caps: CapabilityMap,
        sources: HashMap<Capability, String>,
    ) -> Self {
        LoadedCandidate {
            name: name.into(),
            caps,
            sources,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Callable form of one capability. Validated at load time, so a miss
    /// here means the candidate was constructed without validation.
    pub fn capability(&self, cap: Capability) -> Result<CapabilityFn, HarnessError> {
        self.caps
            .get(&cap)
            .cloned()
            .ok_or_else(|| HarnessError::Load(format!("missing required capability '{cap}'")))
    }

    /// Raw source text of one capability, for the anti-cheat analyzer.
    pub fn capability_source(&self, cap: Capability) -> Option<&str> {
        self.sources.get(&cap).map(String::as_str)
    }

    /// Invoke a capability synchronously on the caller's thread. The
    /// runner wraps this in its watchdog; direct callers get no timeout.
    pub fn invoke(&self, cap: Capability, args: &[CapArg]) -> Result<Table, HarnessError> {
        let func = self.capability(cap)?;
        func(args)
    }
}

/// Loads candidates against an explicit registry.
pub struct ModuleLoader<'a> {
    registry: &'a CandidateRegistry,
}

impl<'a> ModuleLoader<'a> {
    pub fn new(registry: &'a CandidateRegistry) -> Self {
        ModuleLoader { registry }
    }

    /// Load and validate the candidate at `path`.
    ///
    /// Instantiation runs arbitrary candidate code on this thread; the
    /// harness provides no isolation (documented risk). Any failure here
    /// is a fatal `LoadError`.
    pub fn load(&self, path: &Path) -> Result<LoadedCandidate, HarnessError> {
        let text = fs::read_to_string(path).map_err(|e| {
            HarnessError::Load(format!("cannot read candidate {}: {e}", path.display()))
        })?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                HarnessError::Load(format!("candidate path {} has no file name", path.display()))
            })?
            .to_string();

        let factory = self.registry.resolve(&name).ok_or_else(|| {
            HarnessError::Load(format!("no registered candidate named '{name}'"))
        })?;
        let caps = factory().map_err(|e| {
            HarnessError::Load(format!("candidate '{name}' failed to instantiate: {e}"))
        })?;

        let mut sources = HashMap::new();
        for cap in Capability::REQUIRED {
            if !caps.contains_key(&cap) {
                return Err(HarnessError::Load(format!(
                    "candidate '{name}' missing required capability '{cap}'"
                )));
            }
            let body = source::extract_function(&text, cap.wire_name())
                .map_err(|e| HarnessError::Load(format!("candidate '{name}': {e}")))?
                .ok_or_else(|| {
                    HarnessError::Load(format!(
                        "candidate '{name}' missing required capability '{cap}' in source"
                    ))
                })?;
            debug!(candidate = %name, capability = %cap, bytes = body.len(), "capability source extracted");
            sources.insert(cap, body);
        }

        info!(candidate = %name, "candidate loaded with full capability set");
        Ok(LoadedCandidate::from_parts(name, caps, sources))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../testing/fixtures/candidates")
            .join(name)
    }

    #[test]
    fn test_load_reference_candidate() {
        let registry = CandidateRegistry::with_samples();
        let loader = ModuleLoader::new(&registry);
        let candidate = loader.load(&fixture("reference.rs")).unwrap();
        assert_eq!(candidate.name(), "reference");
        for cap in Capability::REQUIRED {
            assert!(candidate.capability(cap).is_ok());
            let src = candidate.capability_source(cap).unwrap();
            assert!(src.starts_with(&format!("fn {}", cap.wire_name())));
        }
    }

    #[test]
    fn test_unreadable_path_is_a_load_error() {
        let registry = CandidateRegistry::with_samples();
        let loader = ModuleLoader::new(&registry);
        let err = loader.load(&fixture("does_not_exist.rs")).unwrap_err();
        assert!(matches!(err, HarnessError::Load(_)));
    }

    #[test]
    fn test_unregistered_candidate_is_a_load_error() {
        let registry = CandidateRegistry::new();
        let loader = ModuleLoader::new(&registry);
        let err = loader.load(&fixture("reference.rs")).unwrap_err();
        assert!(err.to_string().contains("no registered candidate"));
    }

    #[test]
    fn test_missing_capability_is_a_load_error() {
        let registry = CandidateRegistry::with_samples();
        let loader = ModuleLoader::new(&registry);
        let err = loader.load(&fixture("no_aggregate.rs")).unwrap_err();
        assert!(
            err.to_string().contains("calculate_total_by_membership"),
            "error should name the missing capability: {err}"
        );
    }
}

//! Optional YAML configuration for the harness binary.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// File-level settings; CLI flags take precedence over these.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    /// Watchdog budget per capability invocation, in milliseconds.
    pub stage_timeout_ms: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("cannot parse config {}", path.display()))
    }
}

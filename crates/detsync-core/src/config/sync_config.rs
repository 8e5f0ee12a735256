//! Sync run configuration.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_EXTENSIONS;

/// Configuration for a reconciliation run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// Restricts the run to detectors tagged `scope:<scope>`.
    pub scope: Option<String>,
    /// Validate instead of mutating. Default: false.
    pub dry_run: Option<bool>,
    /// Detector file extensions, without the dot.
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl SyncConfig {
    /// Returns the effective dry-run flag, defaulting to false.
    pub fn effective_dry_run(&self) -> bool {
        self.dry_run.unwrap_or(false)
    }

    /// Returns the configured extensions, or `yaml`, `yml`, `json`.
    pub fn effective_extensions(&self) -> Vec<String> {
        if self.extensions.is_empty() {
            DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
        } else {
            self.extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_string())
                .collect()
        }
    }
}

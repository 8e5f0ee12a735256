//! Top-level syncer configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{ApiConfig, SyncConfig};
use crate::constants::{MAX_PAGE_SIZE, PROJECT_CONFIG_FILE};
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`DETSYNC_*`)
/// 3. Project config (`--config` path, or `detsync.toml` in the source directory)
/// 4. User config (`~/.detsync/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DetsyncConfig {
    pub api: ApiConfig,
    pub sync: SyncConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub endpoint: Option<String>,
    pub realm: Option<String>,
    pub token: Option<String>,
    pub scope: Option<String>,
    pub dry_run: bool,
}

impl DetsyncConfig {
    /// Load configuration with layered resolution for a run over `root`.
    ///
    /// An explicit `--config` path must exist; the project and user files
    /// are optional.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Lowest priority: user config
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                Self::merge_toml_file(&mut config, &user_config_path)?;
            }
        }

        // Project config, or the explicitly requested file
        match cli_overrides.and_then(|cli| cli.config_path.as_deref()) {
            Some(explicit) => Self::merge_toml_file(&mut config, explicit)?,
            None => {
                let project_config_path = root.join(PROJECT_CONFIG_FILE);
                if project_config_path.exists() {
                    Self::merge_toml_file(&mut config, &project_config_path)?;
                }
            }
        }

        Self::apply_env_overrides(&mut config)?;

        // Highest priority: CLI flags
        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &DetsyncConfig) -> Result<(), ConfigError> {
        if config.api.timeout_secs == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "api.timeout_secs".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if let Some(page_size) = config.api.page_size {
            if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
                return Err(ConfigError::ValidationFailed {
                    field: "api.page_size".to_string(),
                    message: format!("must be between 1 and {MAX_PAGE_SIZE}"),
                });
            }
        }
        if let Some(ref endpoint) = config.api.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(ConfigError::ValidationFailed {
                    field: "api.endpoint".to_string(),
                    message: "must be an http(s) URL".to_string(),
                });
            }
        }
        if let Some(ref realm) = config.api.realm {
            if !is_token_like(realm) {
                return Err(ConfigError::ValidationFailed {
                    field: "api.realm".to_string(),
                    message: "must be non-empty and contain no whitespace or '/'".to_string(),
                });
            }
        }
        if let Some(ref scope) = config.sync.scope {
            if !is_token_like(scope) {
                return Err(ConfigError::ValidationFailed {
                    field: "sync.scope".to_string(),
                    message: "must be non-empty and contain no whitespace or '/'".to_string(),
                });
            }
        }
        if config
            .sync
            .extensions
            .iter()
            .any(|e| e.trim_start_matches('.').is_empty())
        {
            return Err(ConfigError::ValidationFailed {
                field: "sync.extensions".to_string(),
                message: "extensions must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// The API token, which no run can do without.
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        match self.api.token.as_deref() {
            Some(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(ConfigError::MissingValue {
                field: "api.token".to_string(),
                hint: "pass --token, set DETSYNC_TOKEN, or add it to detsync.toml".to_string(),
            }),
        }
    }

    /// Returns the user config path: `~/.detsync/config.toml`.
    fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".detsync").join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored (forward-compatible).
    fn merge_toml_file(config: &mut DetsyncConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: DetsyncConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`, where `other` values override `base` values
    /// only when `other` has a `Some` value.
    fn merge(base: &mut DetsyncConfig, other: &DetsyncConfig) {
        // API
        if other.api.endpoint.is_some() {
            base.api.endpoint = other.api.endpoint.clone();
        }
        if other.api.realm.is_some() {
            base.api.realm = other.api.realm.clone();
        }
        if other.api.token.is_some() {
            base.api.token = other.api.token.clone();
        }
        if other.api.timeout_secs.is_some() {
            base.api.timeout_secs = other.api.timeout_secs;
        }
        if other.api.max_retries.is_some() {
            base.api.max_retries = other.api.max_retries;
        }
        if other.api.page_size.is_some() {
            base.api.page_size = other.api.page_size;
        }

        // Sync
        if other.sync.scope.is_some() {
            base.sync.scope = other.sync.scope.clone();
        }
        if other.sync.dry_run.is_some() {
            base.sync.dry_run = other.sync.dry_run;
        }
        if !other.sync.extensions.is_empty() {
            base.sync.extensions = other.sync.extensions.clone();
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `DETSYNC_API_ENDPOINT`, `DETSYNC_SCOPE`, etc.
    fn apply_env_overrides(config: &mut DetsyncConfig) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("DETSYNC_API_ENDPOINT") {
            config.api.endpoint = Some(val);
        }
        if let Ok(val) = std::env::var("DETSYNC_REALM") {
            config.api.realm = Some(val);
        }
        if let Ok(val) = std::env::var("DETSYNC_TOKEN") {
            config.api.token = Some(val);
        }
        if let Ok(val) = std::env::var("DETSYNC_TIMEOUT_SECS") {
            config.api.timeout_secs = Some(parse_env("DETSYNC_TIMEOUT_SECS", &val)?);
        }
        if let Ok(val) = std::env::var("DETSYNC_MAX_RETRIES") {
            config.api.max_retries = Some(parse_env("DETSYNC_MAX_RETRIES", &val)?);
        }
        if let Ok(val) = std::env::var("DETSYNC_SCOPE") {
            config.sync.scope = Some(val);
        }
        if let Ok(val) = std::env::var("DETSYNC_DRY_RUN") {
            config.sync.dry_run = Some(parse_env("DETSYNC_DRY_RUN", &val)?);
        }
        Ok(())
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut DetsyncConfig, cli: &CliOverrides) {
        if let Some(ref v) = cli.endpoint {
            config.api.endpoint = Some(v.clone());
        }
        if let Some(ref v) = cli.realm {
            config.api.realm = Some(v.clone());
            // A realm given on the command line beats an endpoint from a file.
            if cli.endpoint.is_none() {
                config.api.endpoint = None;
            }
        }
        if let Some(ref v) = cli.token {
            config.api.token = Some(v.clone());
        }
        if let Some(ref v) = cli.scope {
            config.sync.scope = Some(v.clone());
        }
        if cli.dry_run {
            config.sync.dry_run = Some(true);
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

/// Parse an environment variable, rejecting malformed values instead of
/// silently ignoring them.
fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ConfigError::ValidationFailed {
            field: name.to_string(),
            message: format!("cannot parse {raw:?}"),
        })
}

fn is_token_like(value: &str) -> bool {
    !value.is_empty() && !value.chars().any(|c| c.is_whitespace() || c == '/')
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

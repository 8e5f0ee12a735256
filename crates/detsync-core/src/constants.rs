//! Tag vocabulary and compiled defaults.

/// Tag carried by every detector managed by the syncer.
///
/// This value is part of the ownership protocol with the remote service:
/// changing it orphans every detector synced so far.
pub const OWNERSHIP_MARKER_TAG: &str = "signalfx-detector-syncer";

/// Prefix of the provenance tag, `from:<relative-file-path>`.
pub const FROM_TAG_PREFIX: &str = "from:";

/// Prefix of the scope tag, `scope:<scope-name>`.
pub const SCOPE_TAG_PREFIX: &str = "scope:";

/// Default API endpoint when neither an endpoint nor a realm is configured.
pub const DEFAULT_API_ENDPOINT: &str = "https://api.signalfx.com";

/// Default request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Default number of retries for idempotent requests.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default page size when listing detectors.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Largest page size the detector API accepts.
pub const MAX_PAGE_SIZE: u32 = 10_000;

/// File extensions recognized as detector files.
pub const DEFAULT_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Name of the project-level config file, looked up in the source directory.
pub const PROJECT_CONFIG_FILE: &str = "detsync.toml";

/// Environment variable holding the tracing filter directives.
pub const LOG_ENV_VAR: &str = "DETSYNC_LOG";

//! Remote API configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_ENDPOINT, DEFAULT_MAX_RETRIES, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT_SECS,
};

/// Configuration for the detector service client.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ApiConfig {
    /// Explicit API endpoint. Takes precedence over `realm`.
    pub endpoint: Option<String>,
    /// Realm shorthand, expands to `https://api.<realm>.signalfx.com`.
    pub realm: Option<String>,
    /// Organization access token.
    pub token: Option<String>,
    /// Request timeout in seconds. Default: 5.
    pub timeout_secs: Option<u64>,
    /// Retries for idempotent requests. Default: 2.
    pub max_retries: Option<u32>,
    /// Detectors fetched per list request. Default: 100.
    pub page_size: Option<u32>,
}

impl ApiConfig {
    /// Returns the effective endpoint, without trailing slash.
    pub fn effective_endpoint(&self) -> String {
        let endpoint = match (&self.endpoint, &self.realm) {
            (Some(endpoint), _) => endpoint.clone(),
            (None, Some(realm)) => format!("https://api.{realm}.signalfx.com"),
            (None, None) => DEFAULT_API_ENDPOINT.to_string(),
        };
        endpoint.trim_end_matches('/').to_string()
    }

    /// Returns the effective request timeout, defaulting to 5 seconds.
    pub fn effective_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Returns the effective retry count, defaulting to 2.
    pub fn effective_max_retries(&self) -> u32 {
        self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES)
    }

    /// Returns the effective page size, defaulting to 100.
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

//! Blocking HTTP client for the detector API, with bounded retry and
//! exponential backoff for idempotent requests.

use std::fmt;
use std::time::Duration;

use detsync_core::config::ApiConfig;
use detsync_core::constants::{
    DEFAULT_API_ENDPOINT, DEFAULT_MAX_RETRIES, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT_SECS,
};
use detsync_core::errors::RemoteError;
use detsync_core::Detector;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Url;
use serde::de::DeserializeOwned;

use super::protocol::{DetectorPage, API_VERSION};
use super::DetectorClient;

/// Authentication header of the API. Header names are case-insensitive;
/// `http` wants them lowercase.
pub const TOKEN_HEADER: &str = "x-sf-token";

/// Configuration for the HTTP transport layer.
#[derive(Clone)]
pub struct RestClientConfig {
    /// Base URL of the API, e.g. `https://api.us1.signalfx.com`.
    pub base_url: String,
    /// Organization access token.
    pub token: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retries after the first attempt, for idempotent requests only.
    pub max_retries: u32,
    /// Initial backoff duration (doubles each retry).
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Detectors requested per list page.
    pub page_size: u32,
}

impl Default for RestClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_ENDPOINT.to_string(),
            token: String::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl RestClientConfig {
    /// Build the transport config from the resolved `[api]` section.
    pub fn from_api_config(api: &ApiConfig, token: &str) -> Self {
        Self {
            base_url: api.effective_endpoint(),
            token: token.to_string(),
            timeout: api.effective_timeout(),
            max_retries: api.effective_max_retries(),
            page_size: api.effective_page_size(),
            ..Self::default()
        }
    }
}

impl fmt::Debug for RestClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("initial_backoff", &self.initial_backoff)
            .field("max_backoff", &self.max_backoff)
            .field("page_size", &self.page_size)
            .finish()
    }
}

/// `DetectorClient` over the REST API.
#[derive(Debug)]
pub struct RestClient {
    config: RestClientConfig,
    base: Url,
    http: Client,
}

impl RestClient {
    pub fn new(config: RestClientConfig) -> Result<Self, RemoteError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| RemoteError::Client(format!("invalid endpoint {}: {e}", config.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::Client(format!(
                "invalid endpoint {}: not a base URL",
                config.base_url
            )));
        }

        let mut token = HeaderValue::from_str(&config.token)
            .map_err(|_| RemoteError::Client("token contains invalid characters".to_string()))?;
        token.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, token);

        let http = Client::builder()
            .timeout(config.timeout)
            .gzip(true)
            .default_headers(headers)
            .user_agent(concat!("detsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RemoteError::Client(e.to_string()))?;

        Ok(Self { config, base, http })
    }

    /// `<base>/v2/<segments...>`, each segment percent-encoded.
    pub fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // `new` rejected cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push(API_VERSION).extend(segments);
        }
        url
    }

    /// Send a request, retrying network failures and 5xx answers when the
    /// request is idempotent. Any other non-success status fails at once.
    fn execute<F>(&self, operation: &str, idempotent: bool, build: F) -> Result<Response, RemoteError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let retries = if idempotent { self.config.max_retries } else { 0 };
        let mut backoff = self.config.initial_backoff;
        let mut last_err = String::new();

        for attempt in 0..=retries {
            if attempt > 0 {
                tracing::debug!(operation, attempt, retries, ?backoff, "retrying request");
                std::thread::sleep(backoff);
                backoff = (backoff * 2).min(self.config.max_backoff);
            }

            match build(&self.http).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return Ok(resp);
                    }
                    if !status.is_server_error() || attempt == retries {
                        let body = resp.text().unwrap_or_default();
                        return Err(RemoteError::Status {
                            operation: operation.to_string(),
                            status: status.as_u16(),
                            body,
                        });
                    }
                    last_err = format!("HTTP {status}");
                }
                Err(e) => {
                    last_err = e.to_string();
                }
            }
        }

        Err(RemoteError::Network {
            operation: operation.to_string(),
            reason: format!("giving up after {} attempt(s): {last_err}", retries + 1),
        })
    }

    /// Like `execute`, but a 404 is success when `ignore_not_found` is set.
    fn execute_delete(&self, operation: &str, url: Url, ignore_not_found: bool) -> Result<(), RemoteError> {
        match self.execute(operation, true, |http| http.delete(url.clone())) {
            Ok(_) => Ok(()),
            Err(e) if ignore_not_found && e.is_not_found() => {
                tracing::debug!(operation, %url, "already gone");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn decode<T: DeserializeOwned>(operation: &str, resp: Response) -> Result<T, RemoteError> {
    resp.json::<T>().map_err(|e| RemoteError::Decode {
        operation: operation.to_string(),
        reason: e.to_string(),
    })
}

impl DetectorClient for RestClient {
    fn list(&self, tags: &[String]) -> Result<Vec<Detector>, RemoteError> {
        let url = self.url(&["detector"]);
        let limit = self.config.page_size.max(1);
        let mut detectors = Vec::new();
        let mut offset = 0usize;

        loop {
            let mut query: Vec<(&str, String)> =
                tags.iter().map(|tag| ("tags", tag.clone())).collect();
            query.push(("limit", limit.to_string()));
            query.push(("offset", offset.to_string()));

            let resp = self.execute("list", true, |http| http.get(url.clone()).query(&query))?;
            let page: DetectorPage = decode("list", resp)?;

            let fetched = page.results.len();
            detectors.extend(page.results);
            offset += fetched;
            tracing::debug!(fetched, offset, total = page.count, "listed detector page");

            if fetched == 0 || offset >= page.count {
                break;
            }
        }
        Ok(detectors)
    }

    fn create(&self, detector: &Detector) -> Result<Detector, RemoteError> {
        let url = self.url(&["detector"]);
        // Never retried: a lost response would otherwise create duplicates.
        let resp = self.execute("create", false, |http| http.post(url.clone()).json(detector))?;
        decode("create", resp)
    }

    fn update(&self, id: &str, detector: &Detector) -> Result<Detector, RemoteError> {
        let url = self.url(&["detector", id]);
        let resp = self.execute("update", true, |http| http.put(url.clone()).json(detector))?;
        decode("update", resp)
    }

    fn delete(&self, id: &str, ignore_not_found: bool) -> Result<(), RemoteError> {
        self.execute_delete("delete", self.url(&["detector", id]), ignore_not_found)
    }

    fn validate(&self, detector: &Detector) -> Result<(), RemoteError> {
        let url = self.url(&["detector", "validate"]);
        self.execute("validate", true, |http| http.post(url.clone()).json(detector))?;
        Ok(())
    }

    fn delete_tag(&self, tag: &str, ignore_not_found: bool) -> Result<(), RemoteError> {
        self.execute_delete("delete_tag", self.url(&["tag", tag]), ignore_not_found)
    }
}

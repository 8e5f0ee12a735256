//! Wire shapes of the detector API that are not detectors themselves.

use detsync_core::Detector;
use serde::Deserialize;

/// API version prefix of every endpoint.
pub const API_VERSION: &str = "v2";

/// One page of `GET /v2/detector`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DetectorPage {
    /// Total number of detectors matching the query, across all pages.
    pub count: usize,
    pub results: Vec<Detector>,
}

//! # detsync-cli
//!
//! Argument parsing and the run loop behind `sfx-sync-detectors`.

pub mod cli;

use detsync_core::errors::SyncResult;
use detsync_core::DetsyncConfig;
use detsync_engine::{RestClient, RestClientConfig, SyncOptions, SyncReport, Syncer};

pub use cli::Args;

/// Resolve the configuration for `args` and run one sync against the
/// configured service.
pub fn run(args: &Args) -> SyncResult<SyncReport> {
    let config = DetsyncConfig::load(&args.directory, Some(&args.overrides()))?;
    let token = config.require_token()?;

    let client = RestClient::new(RestClientConfig::from_api_config(&config.api, token))?;
    tracing::debug!(endpoint = %config.api.effective_endpoint(), "using API endpoint");

    let syncer = Syncer::new(client, SyncOptions::from_config(&config.sync));
    syncer.sync(&args.directory)
}

//! Configuration system for the syncer.
//! TOML-based, layered resolution: CLI > env > project > user > defaults.

pub mod api_config;
pub mod detsync_config;
pub mod sync_config;

pub use api_config::ApiConfig;
pub use detsync_config::{CliOverrides, DetsyncConfig};
pub use sync_config::SyncConfig;

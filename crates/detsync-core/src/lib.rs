//! # detsync-core
//!
//! Foundation crate for the detector syncer.
//! Defines the detector model, the ownership tag vocabulary, errors,
//! configuration, and tracing setup. The engine and the CLI depend on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod tracing;
pub mod types;

pub use config::DetsyncConfig;
pub use errors::{SyncError, SyncResult};
pub use types::{Detector, Rule};

//! # detsync-engine
//!
//! Reconciles detector files on disk with their counterparts in the remote
//! monitoring service.
//!
//! - [`loader`] turns one file's contents into a normalized [`Detector`].
//! - [`scanner`] walks a directory and stamps provenance on every record.
//! - [`remote`] lists the detectors this tool owns and mutates them through
//!   a [`DetectorClient`](remote::DetectorClient).
//! - [`sync`] computes the new/updated/removed partition and applies it.
//!
//! [`Detector`]: detsync_core::Detector

pub mod loader;
pub mod remote;
pub mod scanner;
pub mod sync;

pub use loader::load;
pub use remote::{DetectorClient, RemoteRepository, RestClient, RestClientConfig};
pub use scanner::{FileScanner, ScanOptions};
pub use sync::{SyncOptions, SyncPlan, SyncReport, Syncer};

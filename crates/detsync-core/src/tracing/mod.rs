//! Observability for the syncer.
//! `tracing` crate with `EnvFilter`, writing to stderr.

pub mod setup;

pub use setup::{init_tracing, LogLevel};

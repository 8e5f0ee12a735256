//! Detector model shared by the loader, the remote adapter, and the reconciler.

pub mod detector;
pub mod tags;

pub use detector::{Detector, Rule};
pub use tags::{is_ownership_tag, ownership_tags, provenance_tag, scope_tag};

//! Error handling for the syncer.
//! One error enum per subsystem, `thiserror` only.

pub mod config_error;
pub mod error_code;
pub mod load_error;
pub mod remote_error;
pub mod scan_error;
pub mod sync_error;

pub use config_error::ConfigError;
pub use error_code::ErrorCode;
pub use load_error::LoadError;
pub use remote_error::RemoteError;
pub use scan_error::ScanError;
pub use sync_error::{SyncError, SyncResult};

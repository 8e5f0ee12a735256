//! Top-level error of a sync run.

use super::error_code::ErrorCode;
use super::{ConfigError, LoadError, RemoteError, ScanError};

/// Anything that aborts a sync run. Aggregates subsystem errors via `From`.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<LoadError> for SyncError {
    fn from(e: LoadError) -> Self {
        Self::Scan(ScanError::Load(e))
    }
}

impl ErrorCode for SyncError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Scan(e) => e.error_code(),
            Self::Remote(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;

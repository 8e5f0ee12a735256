//! Remote service errors.

use super::error_code::{self, ErrorCode};

/// Errors raised by the detector service client.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("network error during {operation}: {reason}")]
    Network { operation: String, reason: String },

    #[error("{operation} failed with HTTP {status}: {body}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("could not decode {operation} response: {reason}")]
    Decode { operation: String, reason: String },

    #[error("{operation} response carried no detector id")]
    MissingId { operation: String },

    #[error("client setup failed: {0}")]
    Client(String),
}

impl RemoteError {
    /// Whether the service answered 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

impl ErrorCode for RemoteError {
    fn error_code(&self) -> &'static str {
        error_code::REMOTE_ERROR
    }
}

//! Detector file loading errors.

use super::error_code::{self, ErrorCode};

/// Errors raised while turning a file's contents into a detector.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The content matches neither recognized encoding, or fails to parse.
    #[error("{identity}: unknown detector format: {message}")]
    Format { identity: String, message: String },

    /// The content parsed but a required field is missing or malformed.
    #[error("{identity}: invalid detector: {message}")]
    Validation { identity: String, message: String },
}

impl LoadError {
    pub fn format(identity: &str, message: impl Into<String>) -> Self {
        Self::Format {
            identity: identity.to_string(),
            message: message.into(),
        }
    }

    pub fn validation(identity: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            identity: identity.to_string(),
            message: message.into(),
        }
    }
}

impl ErrorCode for LoadError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Format { .. } => error_code::FORMAT_ERROR,
            Self::Validation { .. } => error_code::VALIDATION_ERROR,
        }
    }
}

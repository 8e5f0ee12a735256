//! Scanner errors.

use std::path::PathBuf;

use super::error_code::{self, ErrorCode};
use super::LoadError;

/// Errors that abort a directory scan.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("IO error scanning {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Path is not valid UTF-8: {path}")]
    NonUtf8Path { path: PathBuf },

    #[error(transparent)]
    Load(#[from] LoadError),
}

impl ErrorCode for ScanError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Load(e) => e.error_code(),
            _ => error_code::IO_ERROR,
        }
    }
}

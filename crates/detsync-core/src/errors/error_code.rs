//! ErrorCode trait for user-facing error reporting.

/// Every error enum maps to a stable code string so the CLI can print
/// `[CODE] message` regardless of which subsystem failed.
pub trait ErrorCode {
    /// Returns the error code string (e.g., "FORMAT_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted string: `[ERROR_CODE] message`.
    fn coded_message(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const FORMAT_ERROR: &str = "FORMAT_ERROR";
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
pub const IO_ERROR: &str = "IO_ERROR";
pub const REMOTE_ERROR: &str = "REMOTE_ERROR";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";

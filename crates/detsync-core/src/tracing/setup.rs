//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::constants::LOG_ENV_VAR;

static INIT: Once = Once::new();

/// Verbosity selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    #[default]
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    /// Filter directive used when `DETSYNC_LOG` is unset or invalid.
    pub fn directive(self) -> &'static str {
        match self {
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }

    /// Default directive with chatty transport crates held at `warn`.
    fn filter(self) -> EnvFilter {
        match self {
            Self::Debug => EnvFilter::new("debug,reqwest=warn,hyper=warn,hyper_util=warn"),
            other => EnvFilter::new(other.directive()),
        }
    }
}

/// Initialize the process-wide tracing subscriber.
///
/// Reads `DETSYNC_LOG` for filter directives, e.g.
/// `DETSYNC_LOG=detsync_engine=debug`. Falls back to `level` if it is not
/// set or is invalid. Output goes to stderr.
///
/// Idempotent: calling it more than once is safe.
pub fn init_tracing(level: LogLevel) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| level.filter());

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .with(filter)
            .init();
    });
}

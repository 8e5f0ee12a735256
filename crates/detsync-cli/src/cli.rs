use std::path::PathBuf;

use clap::Parser;
use detsync_core::config::CliOverrides;
use detsync_core::tracing::LogLevel;

#[derive(Parser, Debug)]
#[command(name = "sfx-sync-detectors")]
#[command(about = "Synchronize detector definitions from a directory to SignalFx")]
#[command(version)]
pub struct Args {
    /// Source directory of detector files
    #[arg(default_value = ".")]
    pub directory: PathBuf,

    /// API token (falls back to DETSYNC_TOKEN or the config file)
    #[arg(short, long)]
    pub token: Option<String>,

    /// Only manage detectors tagged with this scope
    #[arg(long)]
    pub scope: Option<String>,

    /// API endpoint [default: https://api.signalfx.com]
    #[arg(short = 'a', long)]
    pub api_endpoint: Option<String>,

    /// Realm, shorthand for https://api.<realm>.signalfx.com (an explicit
    /// endpoint wins)
    #[arg(short, long)]
    pub realm: Option<String>,

    /// Only validate detectors, do not create, update or remove any
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Configuration file (replaces <DIRECTORY>/detsync.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Debug logging
    #[arg(short = 'D', long)]
    pub debug: bool,
}

impl Args {
    pub fn log_level(&self) -> LogLevel {
        if self.debug {
            LogLevel::Debug
        } else if self.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        }
    }

    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            config_path: self.config.clone(),
            endpoint: self.api_endpoint.clone(),
            realm: self.realm.clone(),
            token: self.token.clone(),
            scope: self.scope.clone(),
            dry_run: self.dry_run,
        }
    }
}

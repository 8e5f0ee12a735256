//! Reconciler: one-way sync from detector files to the remote service.
//!
//! 1. Scan the local directory
//! 2. List the owned, in-scope remote detectors
//! 3. Partition by identity (new / common / updated / removed)
//! 4. Create new, update updated, remove removed
//!
//! A failure aborts the remaining steps without undoing completed ones;
//! the next run picks up where this one stopped since the partition is
//! recomputed from the remote state.

pub mod plan;

use std::collections::BTreeMap;
use std::path::Path;

use detsync_core::config::SyncConfig;
use detsync_core::errors::{RemoteError, SyncResult};
use detsync_core::types::provenance_tag;
use detsync_core::Detector;

use crate::remote::{DetectorClient, RemoteRepository};
use crate::scanner::{FileScanner, ScanOptions};

pub use plan::SyncPlan;

/// Options of a sync run.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Only manage detectors tagged `scope:<scope>`.
    pub scope: Option<String>,
    /// Validate instead of mutating.
    pub dry_run: bool,
    /// Detector file extensions; empty means the defaults.
    pub extensions: Vec<String>,
}

impl SyncOptions {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            scope: config.scope.clone(),
            dry_run: config.effective_dry_run(),
            extensions: config.effective_extensions(),
        }
    }
}

/// Summary of a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub dry_run: bool,
    pub new: usize,
    pub common: usize,
    pub updated: usize,
    pub removed: usize,
    /// Remote mutations performed (creates, updates, deletes).
    pub mutations: usize,
    /// Payloads validated instead of applied.
    pub validations: usize,
}

/// Drives a reconciliation run against one service client.
#[derive(Debug)]
pub struct Syncer<C> {
    scanner: FileScanner,
    remote: RemoteRepository<C>,
    dry_run: bool,
}

impl<C: DetectorClient> Syncer<C> {
    pub fn new(client: C, options: SyncOptions) -> Self {
        let mut scan_options = ScanOptions {
            scope: options.scope.clone(),
            ..ScanOptions::default()
        };
        if !options.extensions.is_empty() {
            scan_options.extensions = options.extensions;
        }
        Self {
            scanner: FileScanner::new(scan_options),
            remote: RemoteRepository::new(client, options.scope),
            dry_run: options.dry_run,
        }
    }

    /// Converge the remote state on the detector files under `base_path`.
    pub fn sync(&self, base_path: &Path) -> SyncResult<SyncReport> {
        self.sync_with(base_path, |name| self.scanner.is_detector_file(name))
    }

    /// Same as [`sync`](Self::sync), with a custom file name filter.
    pub fn sync_with<P>(&self, base_path: &Path, predicate: P) -> SyncResult<SyncReport>
    where
        P: Fn(&str) -> bool,
    {
        let local = self.scanner.scan_with(base_path, predicate)?;
        let remote = self.remote.list_owned()?;
        tracing::info!(count = remote.len(), "found synced detector(s) in the service");

        let plan = SyncPlan::compute(&local, &remote);
        tracing::info!(
            new = plan.new.len(),
            common = plan.common.len(),
            updated = plan.updated.len(),
            removed = plan.removed.len(),
            changes = plan.change_count(),
            dry_run = self.dry_run,
            "sync status"
        );
        if !plan.has_changes() {
            tracing::info!("everything is up to date");
        }

        let report = self.apply(&plan, &local, &remote)?;
        tracing::info!(
            mutations = report.mutations,
            validations = report.validations,
            "sync complete"
        );
        Ok(report)
    }

    /// Apply `plan`: creates, then updates, then removals, each in identity
    /// order.
    pub fn apply(
        &self,
        plan: &SyncPlan,
        local: &BTreeMap<String, Detector>,
        remote: &BTreeMap<String, Detector>,
    ) -> SyncResult<SyncReport> {
        let mut report = SyncReport {
            dry_run: self.dry_run,
            new: plan.new.len(),
            common: plan.common.len(),
            updated: plan.updated.len(),
            removed: plan.removed.len(),
            ..Default::default()
        };

        for identity in &plan.new {
            if let Some(detector) = local.get(identity) {
                self.create_detector(identity, detector, &mut report)?;
            }
        }
        for identity in &plan.updated {
            if let (Some(original), Some(detector)) = (remote.get(identity), local.get(identity)) {
                self.update_detector(identity, original, detector, &mut report)?;
            }
        }
        for identity in &plan.removed {
            if let Some(original) = remote.get(identity) {
                self.remove_detector(identity, original, &mut report)?;
            }
        }
        Ok(report)
    }

    fn create_detector(
        &self,
        identity: &str,
        detector: &Detector,
        report: &mut SyncReport,
    ) -> Result<(), RemoteError> {
        let name = self.describe(identity);
        tracing::debug!(detector = ?detector, "payload");
        if self.dry_run {
            tracing::info!("validating new detector {name}...");
            self.remote.validate(detector)?;
            report.validations += 1;
            tracing::info!("detector {name} is valid");
        } else {
            tracing::info!("creating detector {name}...");
            let id = self.remote.create(detector)?;
            report.mutations += 1;
            tracing::info!("created detector {name} [{id}]");
        }
        Ok(())
    }

    fn update_detector(
        &self,
        identity: &str,
        original: &Detector,
        detector: &Detector,
        report: &mut SyncReport,
    ) -> Result<(), RemoteError> {
        let name = self.describe(identity);
        tracing::debug!(detector = ?detector, "payload");
        if self.dry_run {
            tracing::info!("validating updated detector {name}...");
            self.remote.validate(detector)?;
            report.validations += 1;
            tracing::info!("detector {name} is valid");
        } else {
            let remote_id = remote_id(original, "update")?;
            tracing::info!("updating detector {name} [{remote_id}]...");
            let id = self.remote.update(remote_id, detector)?;
            report.mutations += 1;
            tracing::info!("updated detector {name} [{id}]");
        }
        Ok(())
    }

    fn remove_detector(
        &self,
        identity: &str,
        original: &Detector,
        report: &mut SyncReport,
    ) -> Result<(), RemoteError> {
        let name = self.describe(identity);
        if self.dry_run {
            tracing::info!("skipped removal of detector {name}");
            return Ok(());
        }
        let remote_id = remote_id(original, "delete")?;
        tracing::info!("removing detector {name} [{remote_id}]...");
        self.remote.delete(remote_id)?;
        self.remote.delete_tag(&provenance_tag(identity))?;
        report.mutations += 1;
        tracing::info!("removed detector {name} [{remote_id}]");
        Ok(())
    }

    /// `identity`, qualified with the scope when the run is scoped.
    fn describe(&self, identity: &str) -> String {
        match self.remote.scope() {
            Some(scope) => format!("{identity} (in scope {scope})"),
            None => identity.to_string(),
        }
    }
}

fn remote_id<'a>(original: &'a Detector, operation: &str) -> Result<&'a str, RemoteError> {
    original
        .remote_id
        .as_deref()
        .ok_or_else(|| RemoteError::MissingId {
            operation: operation.to_string(),
        })
}

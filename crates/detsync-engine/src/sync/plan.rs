//! Partition computation: which detectors are new, updated, or removed.

use std::collections::{BTreeMap, BTreeSet};

use detsync_core::Detector;

/// The reconciliation partition, by identity.
///
/// `updated` is the subset of `common` whose local record is strictly newer
/// than the remote one; equal timestamps count as unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Local only: to be created.
    pub new: BTreeSet<String>,
    /// On both sides.
    pub common: BTreeSet<String>,
    /// On both sides, local newer: to be updated.
    pub updated: BTreeSet<String>,
    /// Remote only: to be removed.
    pub removed: BTreeSet<String>,
}

impl SyncPlan {
    /// Partition `local` against `remote`.
    pub fn compute(
        local: &BTreeMap<String, Detector>,
        remote: &BTreeMap<String, Detector>,
    ) -> Self {
        let mut plan = Self::default();

        for (identity, detector) in local {
            match remote.get(identity) {
                Some(original) => {
                    plan.common.insert(identity.clone());
                    if detector.last_updated > original.last_updated {
                        plan.updated.insert(identity.clone());
                    }
                }
                None => {
                    plan.new.insert(identity.clone());
                }
            }
        }

        plan.removed = remote
            .keys()
            .filter(|identity| !local.contains_key(*identity))
            .cloned()
            .collect();

        plan
    }

    /// Whether applying the plan would touch the remote side.
    pub fn has_changes(&self) -> bool {
        !self.new.is_empty() || !self.updated.is_empty() || !self.removed.is_empty()
    }

    /// Number of remote operations the plan calls for.
    pub fn change_count(&self) -> usize {
        self.new.len() + self.updated.len() + self.removed.len()
    }
}

//! Remote repository: the detectors this tool owns in the monitoring
//! service, and the mutations the reconciler applies to them.

pub mod protocol;
pub mod rest_client;

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use detsync_core::errors::RemoteError;
use detsync_core::types::ownership_tags;
use detsync_core::Detector;

pub use rest_client::{RestClient, RestClientConfig};

/// The detector operations of the monitoring service.
///
/// Implemented over HTTP by [`RestClient`]; tests substitute an in-memory
/// service.
pub trait DetectorClient {
    /// All detectors carrying every tag in `tags`.
    fn list(&self, tags: &[String]) -> Result<Vec<Detector>, RemoteError>;

    /// Create a detector; returns it as stored, id included.
    fn create(&self, detector: &Detector) -> Result<Detector, RemoteError>;

    /// Replace the detector `id`; returns it as stored.
    fn update(&self, id: &str, detector: &Detector) -> Result<Detector, RemoteError>;

    /// Delete the detector `id`.
    fn delete(&self, id: &str, ignore_not_found: bool) -> Result<(), RemoteError>;

    /// Check a payload without storing anything.
    fn validate(&self, detector: &Detector) -> Result<(), RemoteError>;

    /// Delete the tag object `tag`.
    fn delete_tag(&self, tag: &str, ignore_not_found: bool) -> Result<(), RemoteError>;
}

impl<C: DetectorClient + ?Sized> DetectorClient for &C {
    fn list(&self, tags: &[String]) -> Result<Vec<Detector>, RemoteError> {
        (**self).list(tags)
    }

    fn create(&self, detector: &Detector) -> Result<Detector, RemoteError> {
        (**self).create(detector)
    }

    fn update(&self, id: &str, detector: &Detector) -> Result<Detector, RemoteError> {
        (**self).update(id, detector)
    }

    fn delete(&self, id: &str, ignore_not_found: bool) -> Result<(), RemoteError> {
        (**self).delete(id, ignore_not_found)
    }

    fn validate(&self, detector: &Detector) -> Result<(), RemoteError> {
        (**self).validate(detector)
    }

    fn delete_tag(&self, tag: &str, ignore_not_found: bool) -> Result<(), RemoteError> {
        (**self).delete_tag(tag, ignore_not_found)
    }
}

/// Scoped view of the service: only detectors carrying the ownership marker
/// and exactly the run's scope are visible.
#[derive(Debug)]
pub struct RemoteRepository<C> {
    client: C,
    scope: Option<String>,
}

impl<C: DetectorClient> RemoteRepository<C> {
    pub fn new(client: C, scope: Option<String>) -> Self {
        Self { client, scope }
    }

    /// The scope this repository is restricted to.
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Fetch the owned, in-scope detectors keyed by the identity recorded in
    /// their `from:` tag.
    pub fn list_owned(&self) -> Result<BTreeMap<String, Detector>, RemoteError> {
        let filter = ownership_tags(self.scope());
        let mut owned: BTreeMap<String, Detector> = BTreeMap::new();

        for mut detector in self.client.list(&filter)? {
            if !self.is_in_scope(&detector) {
                continue;
            }
            let Some(identity) = detector.provenance().map(str::to_string) else {
                tracing::debug!(id = ?detector.remote_id, "skipping detector without provenance tag");
                continue;
            };
            detector.identity = identity.clone();

            match owned.entry(identity) {
                Entry::Vacant(slot) => {
                    slot.insert(detector);
                }
                Entry::Occupied(mut slot) => {
                    let kept = keep_newest(slot.get_mut(), detector);
                    tracing::warn!(
                        identity = %slot.key(),
                        ?kept,
                        "several remote detectors claim the same file; keeping the newest"
                    );
                }
            }
        }
        Ok(owned)
    }

    /// Whether `detector` carries the ownership marker and exactly the
    /// run's scope (or no scope at all for an unscoped run).
    pub fn is_in_scope(&self, detector: &Detector) -> bool {
        if !detector.is_owned() {
            return false;
        }
        match (self.scope(), detector.scopes().as_slice()) {
            (None, []) => true,
            (Some(scope), [only]) => *only == scope,
            _ => false,
        }
    }

    /// Create `detector`; returns the new remote id.
    pub fn create(&self, detector: &Detector) -> Result<String, RemoteError> {
        let created = self.client.create(detector)?;
        created.remote_id.ok_or_else(|| RemoteError::MissingId {
            operation: "create".to_string(),
        })
    }

    /// Replace the remote detector `remote_id` with `detector`; returns the
    /// remote id reported back.
    pub fn update(&self, remote_id: &str, detector: &Detector) -> Result<String, RemoteError> {
        let updated = self.client.update(remote_id, detector)?;
        Ok(updated.remote_id.unwrap_or_else(|| remote_id.to_string()))
    }

    /// Validate `detector` without mutating anything.
    pub fn validate(&self, detector: &Detector) -> Result<(), RemoteError> {
        self.client.validate(detector)
    }

    /// Delete a detector. Already gone is fine.
    pub fn delete(&self, remote_id: &str) -> Result<(), RemoteError> {
        self.client.delete(remote_id, true)
    }

    /// Delete a tag. Already gone is fine.
    pub fn delete_tag(&self, tag: &str) -> Result<(), RemoteError> {
        self.client.delete_tag(tag, true)
    }
}

/// Keep whichever of `current` and `candidate` was updated last; returns
/// the remote id kept.
fn keep_newest(current: &mut Detector, candidate: Detector) -> Option<String> {
    if candidate.last_updated > current.last_updated {
        *current = candidate;
    }
    current.remote_id.clone()
}

//! Shared helpers for engine integration tests: an in-memory detector
//! service and detector-file builders.

#![allow(dead_code)]

pub mod http;

use std::cell::RefCell;
use std::path::Path;

use detsync_core::errors::RemoteError;
use detsync_core::Detector;
use detsync_engine::DetectorClient;
use serde_json::json;

/// One call made against the fake service.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(Vec<String>),
    Create(Detector),
    Update(String, Detector),
    Delete(String, bool),
    Validate(Detector),
    DeleteTag(String, bool),
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Call::Create(_) | Call::Update(..) | Call::Delete(..) | Call::DeleteTag(..)
        )
    }
}

/// In-memory detector service that records every call.
///
/// Stored detectors get `lastUpdated` set to the current wall-clock time,
/// like the real service, so a file written before a sync is never newer
/// than what the sync stored.
#[derive(Debug, Default)]
pub struct FakeService {
    pub detectors: RefCell<Vec<Detector>>,
    pub calls: RefCell<Vec<Call>>,
    /// Fail `create` for the detector with this name.
    pub fail_create_named: RefCell<Option<String>>,
    next_id: RefCell<u32>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the service with a detector.
    pub fn seed(&self, detector: Detector) {
        self.detectors.borrow_mut().push(detector);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn stored(&self) -> Vec<Detector> {
        self.detectors.borrow().clone()
    }

    fn next_id(&self) -> String {
        let mut next = self.next_id.borrow_mut();
        *next += 1;
        format!("det-{next}")
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn not_found(operation: &str) -> RemoteError {
    RemoteError::Status {
        operation: operation.to_string(),
        status: 404,
        body: "not found".to_string(),
    }
}

impl DetectorClient for FakeService {
    fn list(&self, tags: &[String]) -> Result<Vec<Detector>, RemoteError> {
        self.record(Call::List(tags.to_vec()));
        Ok(self
            .detectors
            .borrow()
            .iter()
            .filter(|d| tags.iter().all(|t| d.has_tag(t)))
            .cloned()
            .collect())
    }

    fn create(&self, detector: &Detector) -> Result<Detector, RemoteError> {
        self.record(Call::Create(detector.clone()));
        if self.fail_create_named.borrow().as_deref() == Some(detector.name.as_str()) {
            return Err(RemoteError::Status {
                operation: "create".to_string(),
                status: 400,
                body: "invalid program text".to_string(),
            });
        }
        let mut stored = detector.clone();
        stored.identity = String::new();
        stored.remote_id = Some(self.next_id());
        stored.last_updated = now_ms();
        self.detectors.borrow_mut().push(stored.clone());
        Ok(stored)
    }

    fn update(&self, id: &str, detector: &Detector) -> Result<Detector, RemoteError> {
        self.record(Call::Update(id.to_string(), detector.clone()));
        let mut detectors = self.detectors.borrow_mut();
        let slot = detectors
            .iter_mut()
            .find(|d| d.remote_id.as_deref() == Some(id))
            .ok_or_else(|| not_found("update"))?;
        let mut stored = detector.clone();
        stored.identity = String::new();
        stored.remote_id = Some(id.to_string());
        stored.last_updated = now_ms();
        *slot = stored.clone();
        Ok(stored)
    }

    fn delete(&self, id: &str, ignore_not_found: bool) -> Result<(), RemoteError> {
        self.record(Call::Delete(id.to_string(), ignore_not_found));
        let mut detectors = self.detectors.borrow_mut();
        let before = detectors.len();
        detectors.retain(|d| d.remote_id.as_deref() != Some(id));
        if detectors.len() == before && !ignore_not_found {
            return Err(not_found("delete"));
        }
        Ok(())
    }

    fn validate(&self, detector: &Detector) -> Result<(), RemoteError> {
        self.record(Call::Validate(detector.clone()));
        Ok(())
    }

    fn delete_tag(&self, tag: &str, ignore_not_found: bool) -> Result<(), RemoteError> {
        self.record(Call::DeleteTag(tag.to_string(), ignore_not_found));
        Ok(())
    }
}

/// A remote detector as the service would list it.
pub fn remote_detector(id: &str, name: &str, tags: &[&str], last_updated: i64) -> Detector {
    serde_json::from_value(json!({
        "id": id,
        "name": name,
        "description": "remote",
        "programText": "data('x').publish()",
        "rules": [],
        "tags": tags,
        "lastUpdated": last_updated,
    }))
    .unwrap()
}

/// Two-document detector file contents.
pub fn yaml_detector(name: &str) -> String {
    format!("---\nname: \"{name}\"\ndescription: \"d\"\n---\ndata('x').publish()\n")
}

/// Write `contents` to `base/relative`, creating parent directories.
pub fn write_file(base: &Path, relative: &str, contents: &str) {
    let path = base.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

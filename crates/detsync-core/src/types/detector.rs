//! The canonical detector record.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::constants::{FROM_TAG_PREFIX, OWNERSHIP_MARKER_TAG, SCOPE_TAG_PREFIX};

/// One detector, whether loaded from a file or fetched from the service.
///
/// Required fields are strongly typed; everything else the service knows
/// about (visualization options, time zone, teams...) lives in `extra` and
/// is round-tripped untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detector {
    /// Source location relative to the sync base directory, `/`-separated.
    /// Reconciliation key; never sent over the wire.
    #[serde(skip)]
    pub identity: String,
    /// Service-assigned identifier. Only set on records fetched remotely.
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rules: Vec<Rule>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub program_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    /// Epoch milliseconds. File mtime for local records, service value for
    /// remote ones.
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_updated: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single alert rule of a detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Label of the `detect()` stream this rule fires on. Unique within a
    /// detector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detect_label: Option<String>,
    /// Severity, thresholds, notifications, and any other rule field.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Detector {
    /// Whether the detector carries exactly this tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Append a tag unless it is already present.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.has_tag(&tag) {
            self.tags.push(tag);
        }
    }

    /// Whether the detector carries the ownership marker.
    pub fn is_owned(&self) -> bool {
        self.has_tag(OWNERSHIP_MARKER_TAG)
    }

    /// The file identity encoded in the `from:` tag, if any.
    ///
    /// When several provenance tags are present the last one wins.
    pub fn provenance(&self) -> Option<&str> {
        self.tags
            .iter()
            .rev()
            .find_map(|t| t.strip_prefix(FROM_TAG_PREFIX))
            .filter(|path| !path.is_empty())
    }

    /// All scope names carried by the detector, in tag order.
    pub fn scopes(&self) -> Vec<&str> {
        self.tags
            .iter()
            .filter_map(|t| t.strip_prefix(SCOPE_TAG_PREFIX))
            .collect()
    }

    /// Detect labels of all rules that carry one.
    pub fn detect_labels(&self) -> Vec<&str> {
        self.rules
            .iter()
            .filter_map(|r| r.detect_label.as_deref())
            .collect()
    }
}

/// Treat an explicit `null` the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

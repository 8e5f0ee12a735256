//! Builders for the ownership tag vocabulary.

use crate::constants::{FROM_TAG_PREFIX, OWNERSHIP_MARKER_TAG, SCOPE_TAG_PREFIX};

/// `from:<identity>`
pub fn provenance_tag(identity: &str) -> String {
    format!("{FROM_TAG_PREFIX}{identity}")
}

/// `scope:<scope>`
pub fn scope_tag(scope: &str) -> String {
    format!("{SCOPE_TAG_PREFIX}{scope}")
}

/// Tags every detector of a run carries: the ownership marker, plus the
/// scope tag when the run is scoped.
pub fn ownership_tags(scope: Option<&str>) -> Vec<String> {
    let mut tags = vec![OWNERSHIP_MARKER_TAG.to_string()];
    if let Some(scope) = scope {
        tags.push(scope_tag(scope));
    }
    tags
}

/// Whether `tag` belongs to the ownership vocabulary: the marker, a scope
/// tag or a provenance tag. Only the syncer itself may set these.
pub fn is_ownership_tag(tag: &str) -> bool {
    tag == OWNERSHIP_MARKER_TAG
        || tag.starts_with(SCOPE_TAG_PREFIX)
        || tag.starts_with(FROM_TAG_PREFIX)
}

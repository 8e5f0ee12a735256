//! Detector file encodings and the classifier that picks one.

use std::sync::LazyLock;

use detsync_core::errors::LoadError;
use regex::Regex;
use serde_json::{Map, Value};

/// Lines consisting of exactly `---` separate the documents of a
/// two-document file.
static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^---\r?$").expect("separator pattern is valid")
});

/// The closed set of supported file encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// A single JSON object, `programText` inline.
    StructuredObject,
    /// A YAML front-matter document followed by the program text.
    TwoDocument,
}

/// Pick the encoding from the leading characters of the content.
pub fn classify(content: &str) -> Option<Encoding> {
    if content.starts_with('{') {
        Some(Encoding::StructuredObject)
    } else if content.starts_with("---\n") || content.starts_with("---\r\n") {
        Some(Encoding::TwoDocument)
    } else {
        None
    }
}

impl Encoding {
    /// Parse raw content into the detector's top-level fields.
    ///
    /// Both encodings guarantee a string `programText` in the result.
    pub fn parse(self, identity: &str, content: &str) -> Result<Map<String, Value>, LoadError> {
        match self {
            Self::StructuredObject => parse_structured(identity, content),
            Self::TwoDocument => parse_two_document(identity, content),
        }
    }
}

fn parse_structured(identity: &str, content: &str) -> Result<Map<String, Value>, LoadError> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| LoadError::format(identity, format!("invalid JSON: {e}")))?;
    let Value::Object(fields) = value else {
        return Err(LoadError::format(identity, "expected a JSON object"));
    };
    match fields.get("programText") {
        Some(Value::String(_)) => Ok(fields),
        Some(_) => Err(LoadError::format(identity, "programText must be a string")),
        None => Err(LoadError::format(
            identity,
            "programText must be supplied inline in JSON detectors",
        )),
    }
}

fn parse_two_document(identity: &str, content: &str) -> Result<Map<String, Value>, LoadError> {
    let docs: Vec<&str> = SEPARATOR
        .split(content)
        .map(str::trim)
        .filter(|doc| !doc.is_empty())
        .collect();

    let (front_matter, program_text) = match docs.as_slice() {
        [front_matter, program_text, rest @ ..] => {
            if !rest.is_empty() {
                tracing::warn!(
                    identity,
                    ignored = rest.len(),
                    "ignoring documents after the program text"
                );
            }
            (*front_matter, *program_text)
        }
        _ => return Err(LoadError::format(identity, "missing program text document")),
    };

    // Going through serde_yaml's own value keeps non-string mapping keys
    // (e.g. numeric rule labels) instead of rejecting them.
    let yaml: serde_yaml::Value = serde_yaml::from_str(front_matter)
        .map_err(|e| LoadError::format(identity, format!("invalid YAML: {e}")))?;
    let value = serde_json::to_value(yaml)
        .map_err(|e| LoadError::format(identity, format!("unsupported YAML: {e}")))?;
    let Value::Object(mut fields) = value else {
        return Err(LoadError::format(
            identity,
            "the first document must be a YAML mapping",
        ));
    };

    fields.insert(
        "programText".to_string(),
        Value::String(program_text.to_string()),
    );
    Ok(fields)
}

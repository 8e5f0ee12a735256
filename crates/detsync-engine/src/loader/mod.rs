//! Detector loader: parses one file's contents into a normalized
//! [`Detector`], validates required fields, and reshapes label-keyed rule
//! mappings into the list form the service expects.

pub mod encoding;

use detsync_core::errors::LoadError;
use detsync_core::Detector;
use serde_json::{Map, Value};

pub use encoding::{classify, Encoding};

/// Load a detector from raw file contents.
///
/// `identity` only qualifies error messages and is recorded on the returned
/// detector; it is not interpreted.
pub fn load(identity: &str, contents: &str) -> Result<Detector, LoadError> {
    let encoding = classify(contents).ok_or_else(|| {
        LoadError::format(
            identity,
            "expected a JSON object or a '---' separated YAML document",
        )
    })?;
    tracing::debug!(identity, ?encoding, "loading detector");

    let mut fields = encoding.parse(identity, contents)?;
    validate(identity, &fields)?;
    stringify_scalars(&mut fields);
    normalize_rules(identity, &mut fields)?;

    // Local definitions never carry a service id.
    if fields.remove("id").is_some() {
        tracing::debug!(identity, "dropping id field from local definition");
    }

    let mut detector: Detector = serde_json::from_value(Value::Object(fields))
        .map_err(|e| LoadError::validation(identity, e.to_string()))?;
    detector.identity = identity.to_string();
    Ok(detector)
}

/// Check the fields every detector must have.
///
/// Fails if `name` or `description` is missing, empty or not a scalar, or
/// if `rules` is present with a type other than a list or a label-keyed
/// mapping.
pub fn validate(identity: &str, fields: &Map<String, Value>) -> Result<(), LoadError> {
    if !is_non_empty_scalar(fields.get("name")) {
        return Err(LoadError::validation(identity, "missing detector name"));
    }
    if !is_non_empty_scalar(fields.get("description")) {
        return Err(LoadError::validation(
            identity,
            "detector should have a description",
        ));
    }
    match fields.get("rules") {
        None | Some(Value::Null) | Some(Value::Array(_)) | Some(Value::Object(_)) => Ok(()),
        Some(_) => Err(LoadError::validation(identity, "invalid rules object")),
    }
}

/// Turn a label-keyed `rules` mapping into a list, injecting each key as the
/// rule's `detectLabel`. Lists are left alone; `null` becomes empty.
pub fn normalize_rules(identity: &str, fields: &mut Map<String, Value>) -> Result<(), LoadError> {
    let Some(rules) = fields.get_mut("rules") else {
        return Ok(());
    };
    match rules.take() {
        Value::Null => *rules = Value::Array(Vec::new()),
        Value::Object(by_label) => {
            let mut list = Vec::with_capacity(by_label.len());
            for (label, rule) in by_label {
                let Value::Object(mut rule) = rule else {
                    return Err(LoadError::validation(
                        identity,
                        format!("rule {label} must be an object"),
                    ));
                };
                rule.insert("detectLabel".to_string(), Value::String(label));
                list.push(Value::Object(rule));
            }
            *rules = Value::Array(list);
        }
        other => *rules = other,
    }
    Ok(())
}

/// Replace number and boolean `name`/`description` values with their
/// string form, e.g. `description: 42` becomes `"42"`.
pub fn stringify_scalars(fields: &mut Map<String, Value>) {
    for key in ["name", "description"] {
        if let Some(value) = fields.get_mut(key) {
            if matches!(value, Value::Number(_) | Value::Bool(_)) {
                *value = Value::String(value.to_string());
            }
        }
    }
}

fn is_non_empty_scalar(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(_) | Value::Bool(_)) => true,
        _ => false,
    }
}

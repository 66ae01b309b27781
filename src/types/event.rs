//! The event record the audit log stores: an unordered mapping from field
//! name to value, filtered to a recognized subset before submission.

use crate::canonical::{canonicalize_value, Value as CanonValue};
use crate::error::{AuditError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Map;

/// Top-level string fields the service recognizes.
pub const SUPPORTED_FIELDS: &[&str] = &["actor", "action", "status", "source", "target"];

/// Structured fields the service recognizes; canonicalized to a string
/// before being placed on the wire. `message` is required.
pub const SUPPORTED_JSON_FIELDS: &[&str] = &["message", "new", "old"];

/// An event submitted to (or echoed back from) the audit log.
///
/// Unknown fields never survive construction from a raw JSON map —
/// [`Event::from_map`] drops anything outside the recognized subset, which
/// keeps the canonical serialization a pure function of the recognized
/// fields (spec invariant: unrecognized fields cannot affect the hash).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Event {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<serde_json::Value>,
}

impl Event {
    /// Build an `Event` from an arbitrary JSON object, dropping every key
    /// outside the recognized field set.
    pub fn from_map(map: &Map<String, serde_json::Value>) -> Self {
        let string_field = |name: &str| -> Option<String> {
            map.get(name).and_then(|v| v.as_str()).map(str::to_string)
        };

        Event {
            actor: string_field("actor"),
            action: string_field("action"),
            status: string_field("status"),
            source: string_field("source"),
            target: string_field("target"),
            message: map.get("message").cloned(),
            new: map.get("new").cloned(),
            old: map.get("old").cloned(),
        }
    }

    /// Build the wire body for the `log` endpoint's `event` object:
    /// recognized string fields pass through unchanged, recognized
    /// structured fields are canonicalized to a compact JSON string.
    ///
    /// Fails with `InvalidInput` when `message` is absent.
    pub fn to_log_body(&self) -> Result<serde_json::Value> {
        if self.message.is_none() {
            return Err(AuditError::InvalidInput(
                "missing required field `message`".to_string(),
            ));
        }

        let mut out = Map::new();
        if let Some(v) = &self.actor {
            out.insert("actor".to_string(), serde_json::Value::String(v.clone()));
        }
        if let Some(v) = &self.action {
            out.insert("action".to_string(), serde_json::Value::String(v.clone()));
        }
        if let Some(v) = &self.status {
            out.insert("status".to_string(), serde_json::Value::String(v.clone()));
        }
        if let Some(v) = &self.source {
            out.insert("source".to_string(), serde_json::Value::String(v.clone()));
        }
        if let Some(v) = &self.target {
            out.insert("target".to_string(), serde_json::Value::String(v.clone()));
        }
        for (name, value) in [("message", &self.message), ("new", &self.new), ("old", &self.old)] {
            if let Some(v) = value {
                out.insert(name.to_string(), serde_json::Value::String(stringify_structured(v)?));
            }
        }

        Ok(serde_json::Value::Object(out))
    }
}

/// Canonicalize a structured field (`message`, `new`, `old`) to its
/// compact JSON-string form, matching the original SDK's
/// `json.dumps(data[name])` call at each structured field.
fn stringify_structured(value: &serde_json::Value) -> Result<String> {
    let canon = CanonValue::from(value);
    let bytes = canonicalize_value(&canon)?;
    String::from_utf8(bytes).map_err(|e| AuditError::CanonicalizationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn drops_unrecognized_fields() {
        let map = json!({
            "actor": "a",
            "message": "hi",
            "totally_unknown": "nope",
        })
        .as_object()
        .unwrap()
        .clone();

        let event = Event::from_map(&map);
        assert_eq!(event.actor.as_deref(), Some("a"));
        let body = event.to_log_body().unwrap();
        assert!(body.get("totally_unknown").is_none());
    }

    #[test]
    fn log_rejects_missing_message() {
        // S1
        let map = json!({"actor": "a"}).as_object().unwrap().clone();
        let event = Event::from_map(&map);
        assert!(matches!(event.to_log_body(), Err(AuditError::InvalidInput(_))));
    }

    #[test]
    fn structured_field_is_canonicalized_to_a_string() {
        let map = json!({"message": {"b": 1, "a": 2}}).as_object().unwrap().clone();
        let event = Event::from_map(&map);
        let body = event.to_log_body().unwrap();
        assert_eq!(body["message"], json!(r#"{"a":2,"b":1}"#));
    }
}

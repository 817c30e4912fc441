//! # Identity Record
//!
//! The decrypted identity record is an unordered JSON object. Values come
//! in three shapes:
//!
//! - plain scalars (`"UIN": "1234"`),
//! - structured values (`{"value": "..."}`),
//! - localized arrays (`[{"language": "eng", "value": "..."}]`).
//!
//! [`IdentityRecord::scalar`] collapses any of these into one typed string so
//! that downstream stages never perform string surgery on serialized forms.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::RecordError;

/// Key of the biometric container in the record.
pub const BIOMETRICS_KEY: &str = "biometrics";

/// Key of the unique identification number in the record.
pub const UIN_KEY: &str = "UIN";

/// One entry of a localized-value array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LocalizedValue {
    pub language: String,
    pub value: String,
}

/// An immutable, caller-owned identity record.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityRecord {
    fields: Map<String, Value>,
}

impl IdentityRecord {
    /// Wrap a decoded JSON value.
    ///
    /// `null` and the empty object mean "no record" and fail with
    /// `IdentityNotFound`; any other non-object is malformed.
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        match value {
            Value::Null => Err(RecordError::IdentityNotFound("record is null".into())),
            Value::Object(fields) if fields.is_empty() => {
                Err(RecordError::IdentityNotFound("record is empty".into()))
            }
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(RecordError::Malformed(format!(
                "expected a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Parse a record from its JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, RecordError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| RecordError::Malformed(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The raw biometric container string, when the record carries one.
    pub fn biometrics(&self) -> Option<&str> {
        self.fields.get(BIOMETRICS_KEY).and_then(Value::as_str)
    }

    /// The unique identification number. Its absence means the record does
    /// not identify anyone.
    pub fn uin(&self) -> Result<String, RecordError> {
        self.scalar(UIN_KEY, "")
            .filter(|uin| !uin.is_empty())
            .ok_or_else(|| RecordError::IdentityNotFound(format!("record has no {UIN_KEY}")))
    }

    /// Read a field as a single typed scalar, preferring `language` for
    /// localized arrays.
    pub fn scalar(&self, key: &str, language: &str) -> Option<String> {
        self.fields.get(key).and_then(|v| scalar_of(v, language))
    }
}

/// Collapse a JSON value into one scalar string.
///
/// - strings pass through, numbers and booleans are stringified;
/// - objects yield their `value` member;
/// - localized arrays yield the entry for `language`, or the first entry;
/// - `null`, empty arrays, and anything else yield `None`.
pub fn scalar_of(value: &Value, language: &str) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => map.get("value").and_then(|v| scalar_of(v, language)),
        Value::Array(items) => {
            let localized: Vec<LocalizedValue> = items
                .iter()
                .filter_map(|item| LocalizedValue::deserialize(item).ok())
                .collect();
            localized
                .iter()
                .find(|lv| lv.language == language)
                .or_else(|| localized.first())
                .map(|lv| lv.value.clone())
        }
        Value::Null => None,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! # Identity Field Mapping
//!
//! The mapping document names, per logical field, the record keys that feed
//! the template:
//!
//! ```json
//! {"identity": {
//!     "name":           {"value": "firstName,middleName,lastName"},
//!     "dateOfBirth":    {"value": "dob"},
//!     "bestTwoFingers": {"value": "BF"}
//! }}
//! ```
//!
//! [`build_attributes`] turns a record into template attributes:
//!
//! | Record value | Attributes |
//! |--------------|------------|
//! | localized array | `<key>_<lang>` for every supported language |
//! | `{"value": ..}` object | `<key>` = inner value |
//! | anything else | `<key>` = value as text |
//!
//! Strings holding a JSON array are treated as that array. Values mapped
//! under `bestTwoFingers` are never expanded per language.

use std::path::{Path, PathBuf};

use dcard_core::{IdentityRecord, LocalizedValue};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Mapping entry whose values are passed through without language expansion.
pub const BEST_TWO_FINGERS: &str = "bestTwoFingers";

/// Errors reading the mapping document. Non-fatal: the card is rendered with
/// fewer attributes.
#[derive(Debug, thiserror::Error)]
pub enum MappingConfigError {
    #[error("failed to read mapping {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("mapping is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("mapping has no object section {0:?}")]
    MissingSection(String),
}

/// One logical field and the record keys it draws from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub name: String,
    pub source_keys: Vec<String>,
}

#[derive(Deserialize)]
struct RawEntry {
    value: String,
}

/// A parsed mapping section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    entries: Vec<MappingEntry>,
    skipped: Vec<String>,
}

impl FieldMapping {
    /// Parse the named section of a mapping document.
    ///
    /// Entries without a string `value` are skipped and listed in
    /// [`skipped`](Self::skipped); the rest of the section still applies.
    pub fn from_json_str(json: &str, section: &str) -> Result<Self, MappingConfigError> {
        let doc: Value = serde_json::from_str(json)?;
        let fields = doc
            .get(section)
            .and_then(Value::as_object)
            .ok_or_else(|| MappingConfigError::MissingSection(section.to_string()))?;

        let mut mapping = Self::default();
        for (name, raw) in fields {
            match RawEntry::deserialize(raw) {
                Ok(entry) => mapping.entries.push(MappingEntry {
                    name: name.clone(),
                    source_keys: entry
                        .value
                        .split(',')
                        .map(str::trim)
                        .filter(|k| !k.is_empty())
                        .map(str::to_string)
                        .collect(),
                }),
                Err(e) => {
                    tracing::warn!(entry = %name, error = %e, "skipping malformed mapping entry");
                    mapping.skipped.push(name.clone());
                }
            }
        }
        Ok(mapping)
    }

    pub fn from_file(path: &Path, section: &str) -> Result<Self, MappingConfigError> {
        let json = std::fs::read_to_string(path).map_err(|e| MappingConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json_str(&json, section)
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    /// Names of entries that could not be read.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }
}

/// Where the composer reads its mapping from. Re-read per request so a
/// corrected document takes effect without a restart.
#[derive(Debug, Clone, Default)]
pub enum MappingSource {
    #[default]
    None,
    Inline(String),
    File(PathBuf),
}

impl MappingSource {
    /// Load the mapping. `Ok(None)` when no mapping is configured.
    pub fn load(&self, section: &str) -> Result<Option<FieldMapping>, MappingConfigError> {
        match self {
            Self::None => Ok(None),
            Self::Inline(json) => FieldMapping::from_json_str(json, section).map(Some),
            Self::File(path) => FieldMapping::from_file(path, section).map(Some),
        }
    }
}

/// Build template attributes for every mapped field present in the record.
pub fn build_attributes(
    record: &IdentityRecord,
    mapping: &FieldMapping,
    supported_languages: &[String],
) -> Map<String, Value> {
    let mut attributes = Map::new();
    for entry in &mapping.entries {
        let expand_languages = !entry.name.eq_ignore_ascii_case(BEST_TWO_FINGERS);
        for key in &entry.source_keys {
            let Some(raw) = record.get(key) else { continue };
            insert_value(&mut attributes, key, raw, expand_languages, supported_languages);
        }
    }
    attributes
}

fn insert_value(
    attributes: &mut Map<String, Value>,
    key: &str,
    raw: &Value,
    expand_languages: bool,
    supported_languages: &[String],
) {
    let reparsed = match raw {
        Value::String(s) if s.trim_start().starts_with('[') => serde_json::from_str::<Value>(s)
            .ok()
            .filter(Value::is_array),
        _ => None,
    };
    let value = reparsed.as_ref().unwrap_or(raw);

    match value {
        Value::Array(items) if expand_languages => {
            for item in items {
                let Ok(localized) = LocalizedValue::deserialize(item) else { continue };
                if supported_languages.iter().any(|l| *l == localized.language) {
                    attributes.insert(format!("{key}_{}", localized.language), localized.value.into());
                }
            }
        }
        Value::Object(map) => {
            if let Some(inner) = map.get("value").and_then(Value::as_str) {
                attributes.insert(key.to_string(), inner.into());
            }
        }
        Value::Null => {}
        Value::String(s) => {
            attributes.insert(key.to_string(), s.clone().into());
        }
        other => {
            attributes.insert(key.to_string(), other.to_string().into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn langs(l: &[&str]) -> Vec<String> {
        l.iter().map(|s| s.to_string()).collect()
    }

    const MAPPING: &str = r#"{
        "identity": {
            "name": {"value": "firstName, lastName"},
            "gender": {"value": "gender"},
            "dob": {"value": "dateOfBirth"},
            "phone": {"value": "phone"},
            "bestTwoFingers": {"value": "bestTwoFingers"}
        }
    }"#;

    #[test]
    fn parses_comma_separated_keys() {
        let mapping = FieldMapping::from_json_str(MAPPING, "identity").unwrap();
        let name = mapping.entries().iter().find(|e| e.name == "name").unwrap();
        assert_eq!(name.source_keys, vec!["firstName", "lastName"]);
        assert!(mapping.skipped().is_empty());
    }

    #[test]
    fn malformed_entry_is_skipped_not_fatal() {
        let json = r#"{"identity": {"name": {"value": "fn"}, "broken": {"val": 3}, "also": 7}}"#;
        let mapping = FieldMapping::from_json_str(json, "identity").unwrap();
        assert_eq!(mapping.entries().len(), 1);
        let mut skipped = mapping.skipped().to_vec();
        skipped.sort();
        assert_eq!(skipped, ["also", "broken"]);
    }

    #[test]
    fn unreadable_documents_are_errors() {
        assert!(matches!(
            FieldMapping::from_json_str("{oops", "identity"),
            Err(MappingConfigError::Parse(_))
        ));
        assert!(matches!(
            FieldMapping::from_json_str(r#"{"other": {}}"#, "identity"),
            Err(MappingConfigError::MissingSection(_))
        ));
        assert!(matches!(
            MappingSource::File("/nonexistent/mapping.json".into()).load("identity"),
            Err(MappingConfigError::Io { .. })
        ));
        assert!(MappingSource::None.load("identity").unwrap().is_none());
    }

    #[test]
    fn value_shapes_become_attributes() {
        let record = IdentityRecord::from_value(json!({
            "UIN": "4123",
            "firstName": [
                {"language": "eng", "value": "Juan"},
                {"language": "fil", "value": "Huwan"},
                {"language": "ara", "value": "خوان"}
            ],
            "lastName": "[{\"language\":\"eng\",\"value\":\"Dela Cruz\"}]",
            "gender": {"value": "Male"},
            "dateOfBirth": "1990/01/15",
            "phone": 9171234567u64,
            "bestTwoFingers": [{"rank": 1, "subType": "Left Thumb"}]
        }))
        .unwrap();
        let mapping = FieldMapping::from_json_str(MAPPING, "identity").unwrap();
        let attrs = build_attributes(&record, &mapping, &langs(&["eng", "fil"]));

        assert_eq!(attrs["firstName_eng"], "Juan");
        assert_eq!(attrs["firstName_fil"], "Huwan");
        assert!(!attrs.contains_key("firstName_ara"));
        assert_eq!(attrs["lastName_eng"], "Dela Cruz");
        assert_eq!(attrs["gender"], "Male");
        assert_eq!(attrs["dateOfBirth"], "1990/01/15");
        assert_eq!(attrs["phone"], "9171234567");
        assert_eq!(attrs["bestTwoFingers"], r#"[{"rank":1,"subType":"Left Thumb"}]"#);
    }

    #[test]
    fn absent_keys_and_nulls_emit_nothing() {
        let record = IdentityRecord::from_value(json!({"UIN": "1", "gender": null})).unwrap();
        let mapping = FieldMapping::from_json_str(MAPPING, "identity").unwrap();
        assert!(build_attributes(&record, &mapping, &langs(&["eng"])).is_empty());
    }

    #[test]
    fn bracketed_text_that_is_not_json_stays_text() {
        let record = IdentityRecord::from_value(json!({
            "UIN": "1",
            "firstName": "[{language=eng, value=Juan}]"
        }))
        .unwrap();
        let mapping = FieldMapping::from_json_str(MAPPING, "identity").unwrap();
        let attrs = build_attributes(&record, &mapping, &langs(&["eng"]));
        assert_eq!(attrs["firstName"], "[{language=eng, value=Juan}]");
    }

    proptest::proptest! {
        #[test]
        fn only_supported_languages_are_emitted(
            entries in proptest::collection::vec(("[a-z]{3}", "[A-Za-z ]{0,12}"), 0..8),
            supported in proptest::collection::vec("[a-z]{3}", 0..4),
        ) {
            let values: Vec<_> = entries
                .iter()
                .map(|(language, value)| json!({"language": language, "value": value}))
                .collect();
            let record = IdentityRecord::from_value(json!({"UIN": "1", "firstName": values})).unwrap();
            let mapping = FieldMapping::from_json_str(MAPPING, "identity").unwrap();
            let attrs = build_attributes(&record, &mapping, &supported);
            for key in attrs.keys() {
                let language = key.strip_prefix("firstName_").unwrap();
                proptest::prop_assert!(supported.iter().any(|l| l == language));
            }
        }
    }
}

//! # Subject Block Extraction
//!
//! Reads the nine subject fields from the record as typed scalars. When the
//! legacy shim is enabled, values that arrive in the flattened upstream
//! string form are unwrapped first (see [`dcard_core::legacy`]).
//!
//! `fn`, `ln`, and `PCN` are required; the other fields default to the
//! empty string. The sex field goes through [`SexCode::normalize`].

use dcard_core::legacy;
use dcard_core::record::scalar_of;
use dcard_core::{IdentityRecord, SexCode, SubjectBlock};
use serde_json::Value;

use crate::config::SubjectFields;

/// A required subject field is missing or empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("subject field {key:?} is missing or empty")]
pub struct SubjectError {
    pub key: String,
}

/// Builds the subject block from a record.
#[derive(Debug, Clone)]
pub struct SubjectExtractor {
    fields: SubjectFields,
    language: String,
    legacy_shim: bool,
}

impl SubjectExtractor {
    pub fn new(fields: SubjectFields, language: impl Into<String>, legacy_shim: bool) -> Self {
        Self {
            fields,
            language: language.into(),
            legacy_shim,
        }
    }

    pub fn extract(&self, record: &IdentityRecord) -> Result<SubjectBlock, SubjectError> {
        let f = &self.fields;
        Ok(SubjectBlock {
            suffix: self.text(record, &f.suffix).unwrap_or_default(),
            last_name: self.required(record, &f.last_name)?,
            first_name: self.required(record, &f.first_name)?,
            middle_name: self.text(record, &f.middle_name).unwrap_or_default(),
            sex: SexCode::normalize(&self.text(record, &f.sex).unwrap_or_default()),
            biometric_flag: self.biometric_flag(record, &f.biometric_flag),
            date_of_birth: self.date(record, &f.date_of_birth),
            place_of_birth: self.text(record, &f.place_of_birth).unwrap_or_default(),
            pcn: self.required(record, &f.pcn)?,
        })
    }

    fn text(&self, record: &IdentityRecord, key: &str) -> Option<String> {
        let raw = record.scalar(key, &self.language)?;
        Some(if self.legacy_shim {
            legacy::strip_language_wrapper(&raw)
        } else {
            raw
        })
    }

    fn required(&self, record: &IdentityRecord, key: &str) -> Result<String, SubjectError> {
        self.text(record, key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| SubjectError { key: key.to_string() })
    }

    fn date(&self, record: &IdentityRecord, key: &str) -> String {
        let Some(raw) = record.scalar(key, &self.language) else {
            return String::new();
        };
        if self.legacy_shim {
            legacy::normalize_date_separators(&legacy::strip_date_label(&raw))
        } else {
            raw
        }
    }

    /// `BF` is either a list of `{rank, subType}` objects, whose first two
    /// ranks become `"[r1,r2]"`, or already-rendered text.
    fn biometric_flag(&self, record: &IdentityRecord, key: &str) -> String {
        match record.get(key) {
            Some(Value::Array(items)) => {
                let ranks: Vec<String> = items
                    .iter()
                    .filter_map(|item| item.get("rank"))
                    .filter_map(|rank| scalar_of(rank, &self.language))
                    .take(2)
                    .collect();
                if ranks.is_empty() {
                    String::new()
                } else {
                    format!("[{}]", ranks.join(","))
                }
            }
            Some(value) => {
                let raw = scalar_of(value, &self.language).unwrap_or_default();
                if self.legacy_shim {
                    legacy::extract_rank_pair(&raw).unwrap_or(raw)
                } else {
                    raw
                }
            }
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extractor(shim: bool) -> SubjectExtractor {
        SubjectExtractor::new(SubjectFields::default(), "eng", shim)
    }

    fn record(v: Value) -> IdentityRecord {
        IdentityRecord::from_value(v).unwrap()
    }

    #[test]
    fn typed_record_reads_directly() {
        let rec = record(json!({
            "UIN": "4123",
            "fn": [{"language": "eng", "value": "Maria"}],
            "mn": {"value": "Reyes"},
            "ln": "Santos",
            "sf": "Jr.",
            "gen": [{"language": "eng", "value": "Female"}],
            "BF": [{"rank": 3, "subType": "Left Thumb"}, {"rank": 7, "subType": "Right Index"}],
            "dob": "1985-12-01",
            "pob": "Cebu",
            "PCN": "9876-5432-1098-7654"
        }));
        let sb = extractor(false).extract(&rec).unwrap();
        assert_eq!(sb.first_name, "Maria");
        assert_eq!(sb.middle_name, "Reyes");
        assert_eq!(sb.last_name, "Santos");
        assert_eq!(sb.suffix, "Jr.");
        assert_eq!(sb.sex, SexCode::Female);
        assert_eq!(sb.biometric_flag, "[3,7]");
        assert_eq!(sb.date_of_birth, "1985-12-01");
        assert_eq!(sb.place_of_birth, "Cebu");
        assert_eq!(sb.pcn, "9876-5432-1098-7654");
    }

    #[test]
    fn flattened_record_needs_the_shim() {
        let rec = record(json!({
            "UIN": "4123",
            "fn": "[{language=eng, value=Juan}]",
            "mn": "[{language=eng, value=Santos}]",
            "ln": "[{language=eng, value=Dela Cruz}]",
            "gen": "[{language=eng, value=Male}]",
            "BF": "[{rank=1, subType=Left Thumb}, {rank=2, subType=Right Index}]",
            "dob": "Date of Birth 1990/01/15",
            "pob": "[{language=eng, value=Manila}]",
            "PCN": "1234-5678-9012-3456"
        }));
        let sb = extractor(true).extract(&rec).unwrap();
        assert_eq!(sb.first_name, "Juan");
        assert_eq!(sb.last_name, "Dela Cruz");
        assert_eq!(sb.sex, SexCode::Male);
        assert_eq!(sb.biometric_flag, "[1,2]");
        assert_eq!(sb.date_of_birth, "1990-01-15");
        assert_eq!(sb.place_of_birth, "Manila");

        let raw = extractor(false).extract(&rec).unwrap();
        assert_eq!(raw.first_name, "[{language=eng, value=Juan}]");
        assert_eq!(raw.date_of_birth, "Date of Birth 1990/01/15");
    }

    #[test]
    fn flattened_female_normalizes_after_unwrapping() {
        let rec = record(json!({
            "fn": "A", "ln": "B", "PCN": "1",
            "gen": "[{language=eng, value=Female}]"
        }));
        assert_eq!(extractor(true).extract(&rec).unwrap().sex, SexCode::Female);
        assert_eq!(extractor(false).extract(&rec).unwrap().sex, SexCode::Male);
    }

    #[test]
    fn optional_fields_default_to_empty() {
        let rec = record(json!({"fn": "Juan", "ln": "Cruz", "PCN": "1"}));
        let sb = extractor(true).extract(&rec).unwrap();
        assert_eq!(sb.middle_name, "");
        assert_eq!(sb.suffix, "");
        assert_eq!(sb.biometric_flag, "");
        assert_eq!(sb.sex, SexCode::Male);
    }

    #[test]
    fn missing_required_field_is_reported() {
        let rec = record(json!({"fn": "Juan", "ln": "Cruz"}));
        assert_eq!(
            extractor(true).extract(&rec).unwrap_err(),
            SubjectError { key: "PCN".into() }
        );
        let rec = record(json!({"fn": "", "ln": "Cruz", "PCN": "1"}));
        assert_eq!(extractor(true).extract(&rec).unwrap_err().key, "fn");
    }

    #[test]
    fn unparseable_flattened_flag_passes_through() {
        let rec = record(json!({"fn": "A", "ln": "B", "PCN": "1", "BF": "O+"}));
        assert_eq!(extractor(true).extract(&rec).unwrap().biometric_flag, "O+");
    }
}

//! # Card Pipeline Configuration
//!
//! Loaded from YAML. Every field has a default, so an empty file (or no
//! file) yields a working local configuration:
//!
//! ```yaml
//! template_type_code: RPR_UIN_CARD_TEMPLATE
//! template_language: eng
//! supported_languages: [eng]
//! signature_box: { lower_left_x: 73, lower_left_y: 100, upper_right_x: 300, upper_right_y: 150 }
//! signature_reason: Digital card
//! issuer: PSA
//! qr: { version: 20, error_correction: L }
//! thumbnail: { width: 45, height: 58, quality: 30, max_bytes: 450, crop_convention: exact_box }
//! mapping_path: /etc/dcard/identity-mapping.json
//! ```
//!
//! Selected fields can be overridden from the environment with
//! [`CardConfig::apply_env`].

use std::path::{Path, PathBuf};

use dcard_biometric::{SeetaDetector, ThumbnailSpec};
use dcard_client::SignatureBox;
use dcard_core::DEFAULT_ISSUER;
use dcard_qr::SymbolSpec;
use serde::{Deserialize, Serialize};

/// Environment overrides applied by [`CardConfig::apply_env`].
pub const ENV_TEMPLATE_TYPE_CODE: &str = "DCARD_TEMPLATE_TYPE_CODE";
pub const ENV_TEMPLATE_LANGUAGE: &str = "DCARD_TEMPLATE_LANGUAGE";
pub const ENV_ISSUER: &str = "DCARD_ISSUER";
pub const ENV_FACE_MODEL_PATH: &str = "DCARD_FACE_MODEL_PATH";

/// Record keys read into the subject block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectFields {
    pub suffix: String,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub sex: String,
    pub biometric_flag: String,
    pub date_of_birth: String,
    pub place_of_birth: String,
    pub pcn: String,
}

impl Default for SubjectFields {
    fn default() -> Self {
        Self {
            suffix: "sf".into(),
            last_name: "ln".into(),
            first_name: "fn".into(),
            middle_name: "mn".into(),
            sex: "gen".into(),
            biometric_flag: "BF".into(),
            date_of_birth: "dob".into(),
            place_of_birth: "pob".into(),
            pcn: "PCN".into(),
        }
    }
}

/// Configuration of one card generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardConfig {
    pub template_type_code: String,
    pub template_language: String,
    /// Languages emitted as `<key>_<lang>` attributes for localized fields.
    pub supported_languages: Vec<String>,
    pub signature_box: SignatureBox,
    pub signature_reason: String,
    pub signature_page: u32,
    /// Issuer tag written to the payload's `i` field.
    pub issuer: String,
    pub qr: SymbolSpec,
    pub thumbnail: ThumbnailSpec,
    /// SeetaFace detection model. Without one, no thumbnail is produced.
    pub face_model_path: Option<PathBuf>,
    pub min_face_size: u32,
    /// Biometric subtype filter for the face sample; empty matches any.
    pub face_subtypes: Vec<String>,
    pub subject_fields: SubjectFields,
    /// Undo flattened upstream string forms before reading subject fields.
    pub legacy_field_shim: bool,
    /// Identity mapping JSON. Without one, no mapped attributes are emitted.
    pub mapping_path: Option<PathBuf>,
    /// Top-level section of the mapping JSON holding the field entries.
    pub mapping_section: String,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            template_type_code: "RPR_UIN_CARD_TEMPLATE".into(),
            template_language: "eng".into(),
            supported_languages: vec!["eng".into()],
            signature_box: SignatureBox::default(),
            signature_reason: "Digital card".into(),
            signature_page: 1,
            issuer: DEFAULT_ISSUER.into(),
            qr: SymbolSpec::default(),
            thumbnail: ThumbnailSpec::default(),
            face_model_path: None,
            min_face_size: SeetaDetector::DEFAULT_MIN_FACE_SIZE,
            face_subtypes: Vec::new(),
            subject_fields: SubjectFields::default(),
            legacy_field_shim: true,
            mapping_path: None,
            mapping_section: "identity".into(),
        }
    }
}

impl CardConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::Yaml {
            origin: "<inline>".into(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Yaml {
            origin: path.display().to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `DCARD_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary lookup. Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        if let Some(v) = get(ENV_TEMPLATE_TYPE_CODE) {
            self.template_type_code = v;
        }
        if let Some(v) = get(ENV_TEMPLATE_LANGUAGE) {
            self.template_language = v;
        }
        if let Some(v) = get(ENV_ISSUER) {
            self.issuer = v;
        }
        if let Some(v) = get(ENV_FACE_MODEL_PATH) {
            self.face_model_path = Some(PathBuf::from(v));
        }
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.template_type_code.trim().is_empty() {
            return Err(ConfigError::Invalid("template_type_code must not be empty".into()));
        }
        if self.issuer.is_empty() {
            return Err(ConfigError::Invalid("issuer must not be empty".into()));
        }
        if self.thumbnail.width == 0 || self.thumbnail.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "thumbnail dimensions must be non-zero, got {}x{}",
                self.thumbnail.width, self.thumbnail.height
            )));
        }
        if !(0.0..=100.0).contains(&self.thumbnail.quality) {
            return Err(ConfigError::Invalid(format!(
                "thumbnail quality must be within 0-100, got {}",
                self.thumbnail.quality
            )));
        }
        let b = &self.signature_box;
        if b.upper_right_x <= b.lower_left_x || b.upper_right_y <= b.lower_left_y {
            return Err(ConfigError::Invalid(format!("signature box {b:?} is empty")));
        }
        Ok(())
    }
}

/// Errors loading the pipeline configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid YAML in {origin}: {source}")]
    Yaml {
        origin: String,
        source: serde_yaml::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("invalid symbol configuration: {0}")]
    Symbol(#[from] dcard_qr::CodeGenerationError),
    #[error("face detector unavailable: {0}")]
    Detector(#[from] dcard_biometric::BiometricError),
}

//! # Card Composer
//!
//! Runs the offline stages for one record and returns the attribute set for
//! the template renderer:
//!
//! ```text
//! record ─▶ photo ─▶ face thumbnail ─▶ subject block ─▶ sign ─▶ QR ─▶ attributes
//!                                         ▲
//!                     mapping (Standard) ─┘
//! ```
//!
//! Every intermediate value is a local of [`CardComposer::compose`]. The
//! composer holds only read-only configuration and the shared key provider,
//! so one instance serves concurrent requests.

use std::sync::Arc;

use dcard_biometric::{FaceCropper, FaceDetector, FaceOutcome, FaceRaster, Thumbnail};
use dcard_core::{
    CardPayload, CodePayload, ContentDigest, IdentityRecord, SexCode, SubjectBlock, UIN_KEY,
};
use dcard_crypto::KeyProvider;
use dcard_qr::{CodeGenerationError, QrEncoder};
use serde_json::{Map, Value};

use crate::code::sign_card_payload;
use crate::config::{CardConfig, ConfigError};
use crate::degradation::{Degradation, DegradationLog};
use crate::error::PipelineError;
use crate::mapping::{build_attributes, MappingSource};
use crate::photo::{extract_photo, png_data_uri, PhotoOutcome};
use crate::subject::SubjectExtractor;

/// Template attribute holding the applicant photo data URI.
pub const APPLICANT_PHOTO: &str = "ApplicantPhoto";
/// Template attribute holding the optical-code data URI.
pub const QR_CODE: &str = "QrCode";
/// Template attribute telling the template whether a photo was set.
pub const IS_PHOTO_SET: &str = "isPhotoSet";

/// Base64 length of an Ed25519 signature.
const SIGNATURE_B64_LEN: usize = 88;

/// Which card variant to produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CredentialType {
    /// Photo and optical code only.
    QrCode,
    /// Photo, optical code, mapped demographics, and UIN.
    #[default]
    Standard,
}

impl CredentialType {
    /// `"qrcode"` in any case selects [`CredentialType::QrCode`]; anything
    /// else is a standard card.
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("qrcode") {
            Self::QrCode
        } else {
            Self::Standard
        }
    }
}

impl std::str::FromStr for CredentialType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// The signed optical code of a card.
#[derive(Debug, Clone)]
pub struct CodeArtifact {
    pub payload: CodePayload,
    pub digest: ContentDigest,
    pub png: Vec<u8>,
}

/// Output of the offline stages.
#[derive(Debug, Clone)]
pub struct ComposedCard {
    pub uin: String,
    pub attributes: Map<String, Value>,
    pub code: Option<CodeArtifact>,
    pub thumbnail: Option<Thumbnail>,
    pub degradations: Vec<Degradation>,
}

/// Runs the offline card stages.
pub struct CardComposer<D> {
    config: CardConfig,
    keys: Arc<dyn KeyProvider>,
    cropper: Option<FaceCropper<D>>,
    encoder: QrEncoder,
    subject: SubjectExtractor,
    mapping: MappingSource,
}

impl<D: FaceDetector> CardComposer<D> {
    /// Build a composer. Without a detector no thumbnail is ever embedded.
    ///
    /// With a detector, the thumbnail budget must leave room in the symbol
    /// for a signed code whose subject fields are all empty.
    pub fn new(
        config: CardConfig,
        keys: Arc<dyn KeyProvider>,
        detector: Option<D>,
        mapping: MappingSource,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let encoder = QrEncoder::new(config.qr.clone())?;
        if detector.is_some() {
            check_thumbnail_budget(&config, &encoder)?;
        }
        let cropper = detector.map(|d| FaceCropper::new(d, config.thumbnail.clone()));
        let subject = SubjectExtractor::new(
            config.subject_fields.clone(),
            config.template_language.clone(),
            config.legacy_field_shim,
        );
        Ok(Self {
            config,
            keys,
            cropper,
            encoder,
            subject,
            mapping,
        })
    }

    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    pub fn encoder(&self) -> &QrEncoder {
        &self.encoder
    }

    /// Run the offline stages for one record.
    ///
    /// Fails only when the record does not identify anyone, or when the
    /// mapping could not be read and nothing else is left to render.
    pub fn compose(
        &self,
        record: &IdentityRecord,
        credential_type: CredentialType,
    ) -> Result<ComposedCard, PipelineError> {
        let uin = record.uin()?;
        let mut log = DegradationLog::default();
        let mut attributes = Map::new();

        let raster = self.photo_stage(record, &mut attributes, &mut log);
        let mut thumbnail = raster.as_ref().and_then(|r| self.face_stage(r, &mut log));

        let mut mapping_failed = false;
        if credential_type == CredentialType::Standard {
            mapping_failed = self.mapping_stage(record, &mut attributes, &mut log);
        }

        let code = self.code_stage(record, &mut thumbnail, &mut log);
        if let Some(code) = &code {
            attributes.insert(QR_CODE.into(), png_data_uri(&code.png).into());
        }

        if mapping_failed && attributes.keys().all(|k| k == IS_PHOTO_SET) {
            return Err(PipelineError::EmptyAttributes(
                "mapping unreadable and no photo or optical code was produced".into(),
            ));
        }
        if credential_type == CredentialType::Standard {
            attributes.insert(UIN_KEY.into(), uin.clone().into());
        }

        Ok(ComposedCard {
            uin,
            attributes,
            code,
            thumbnail,
            degradations: log.into_vec(),
        })
    }

    fn photo_stage(
        &self,
        record: &IdentityRecord,
        attributes: &mut Map<String, Value>,
        log: &mut DegradationLog,
    ) -> Option<FaceRaster> {
        let raster = match extract_photo(record, &self.config.face_subtypes) {
            PhotoOutcome::Present(raster) => raster,
            PhotoOutcome::Absent(reason) => {
                if record.biometrics().is_some() {
                    attributes.insert(IS_PHOTO_SET.into(), false.into());
                }
                log.record(Degradation::ApplicantPhotoNotSet(reason.into()));
                return None;
            }
            PhotoOutcome::Failed(e) => {
                attributes.insert(IS_PHOTO_SET.into(), false.into());
                log.record(Degradation::ApplicantPhotoNotSet(e.to_string()));
                return None;
            }
        };
        match raster.to_png() {
            Ok(png) => {
                attributes.insert(APPLICANT_PHOTO.into(), png_data_uri(&png).into());
                attributes.insert(IS_PHOTO_SET.into(), true.into());
                Some(raster)
            }
            Err(e) => {
                attributes.insert(IS_PHOTO_SET.into(), false.into());
                log.record(Degradation::ApplicantPhotoNotSet(e.to_string()));
                None
            }
        }
    }

    fn face_stage(&self, raster: &FaceRaster, log: &mut DegradationLog) -> Option<Thumbnail> {
        let Some(cropper) = &self.cropper else {
            log.record(Degradation::FaceThumbnailNotSet("no face detector configured".into()));
            return None;
        };
        match cropper.thumbnail(raster) {
            FaceOutcome::Present(thumbnail) => {
                tracing::debug!(bytes = thumbnail.bytes.len(), "face thumbnail encoded");
                Some(thumbnail)
            }
            FaceOutcome::Absent => {
                log.record(Degradation::FaceThumbnailNotSet("no face detected".into()));
                None
            }
            FaceOutcome::Failed(reason) => {
                log.record(Degradation::FaceThumbnailNotSet(reason));
                None
            }
        }
    }

    /// Returns whether the mapping document itself was unreadable.
    fn mapping_stage(
        &self,
        record: &IdentityRecord,
        attributes: &mut Map<String, Value>,
        log: &mut DegradationLog,
    ) -> bool {
        match self.mapping.load(&self.config.mapping_section) {
            Ok(Some(mapping)) => {
                if !mapping.skipped().is_empty() {
                    log.record(Degradation::MappingDegraded(format!(
                        "skipped malformed entries: {}",
                        mapping.skipped().join(", ")
                    )));
                }
                let mapped = build_attributes(record, &mapping, &self.config.supported_languages);
                tracing::debug!(attributes = mapped.len(), "mapped demographic attributes");
                attributes.extend(mapped);
                false
            }
            Ok(None) => {
                log.record(Degradation::MappingDegraded("no identity mapping configured".into()));
                false
            }
            Err(e) => {
                log.record(Degradation::MappingDegraded(e.to_string()));
                true
            }
        }
    }

    /// Sign and encode the subject block. When the code overflows the symbol
    /// only because of the thumbnail, the thumbnail is dropped and the code
    /// is produced without it.
    fn code_stage(
        &self,
        record: &IdentityRecord,
        thumbnail: &mut Option<Thumbnail>,
        log: &mut DegradationLog,
    ) -> Option<CodeArtifact> {
        let subject = match self.subject.extract(record) {
            Ok(subject) => subject,
            Err(e) => {
                log.record(Degradation::QrCodeNotSet(e.to_string()));
                return None;
            }
        };

        let embedded = thumbnail.as_ref().map(|t| t.bytes.as_slice());
        let code = match self.sign_and_encode(subject.clone(), embedded, log) {
            Err(CodeGenerationError::CapacityExceeded { len, capacity, .. }) if embedded.is_some() => {
                tracing::warn!(len, capacity, "optical code overflows with thumbnail, dropping thumbnail");
                log.record(Degradation::FaceThumbnailNotSet(format!(
                    "thumbnail dropped: code of {len} bytes exceeds {capacity}-byte symbol capacity"
                )));
                *thumbnail = None;
                self.sign_and_encode(subject, None, log)
            }
            other => other,
        };
        match code {
            Ok(code) => {
                tracing::info!(payload_digest = %code.digest, "optical code generated");
                Some(code)
            }
            Err(e) => {
                log.record(Degradation::QrCodeNotSet(e.to_string()));
                None
            }
        }
    }

    fn sign_and_encode(
        &self,
        subject: SubjectBlock,
        thumbnail: Option<&[u8]>,
        log: &mut DegradationLog,
    ) -> Result<CodeArtifact, CodeGenerationError> {
        let payload = CardPayload::new(self.config.issuer.clone(), subject, thumbnail);
        let signed = sign_card_payload(self.keys.as_ref(), payload)
            .map_err(|e| CodeGenerationError::Payload(e.to_string()))?;
        let bytes = signed
            .payload
            .to_bytes()
            .map_err(|e| CodeGenerationError::Payload(e.to_string()))?;
        let png = self.encoder.encode_png(&bytes)?;
        if let Some(e) = &signed.signature_error {
            log.record(Degradation::QrSignatureNotSet(e.to_string()));
        }
        Ok(CodeArtifact {
            payload: signed.payload,
            digest: signed.digest,
            png,
        })
    }
}

/// Reject a thumbnail budget that could not fit the symbol even next to an
/// empty subject block.
fn check_thumbnail_budget(config: &CardConfig, encoder: &QrEncoder) -> Result<(), ConfigError> {
    let subject = SubjectBlock {
        suffix: String::new(),
        last_name: String::new(),
        first_name: String::new(),
        middle_name: String::new(),
        sex: SexCode::Male,
        biometric_flag: String::new(),
        date_of_birth: String::new(),
        place_of_birth: String::new(),
        pcn: String::new(),
    };
    let thumbnail = vec![0u8; config.thumbnail.max_bytes];
    let smallest = CardPayload::new(config.issuer.clone(), subject, Some(thumbnail.as_slice()))
        .into_code_payload(Some("A".repeat(SIGNATURE_B64_LEN)))
        .to_bytes()
        .map_err(|e| ConfigError::Invalid(format!("cannot size the optical code: {e}")))?
        .len();
    if smallest > encoder.capacity() {
        return Err(ConfigError::Invalid(format!(
            "thumbnail max_bytes {} cannot fit QR version {}: a signed code with empty subject fields \
             would need {smallest} of {} bytes",
            config.thumbnail.max_bytes,
            config.qr.version,
            encoder.capacity()
        )));
    }
    Ok(())
}

impl<D> std::fmt::Debug for CardComposer<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardComposer")
            .field("template", &self.config.template_type_code)
            .field("key_provider", &self.keys.provider_name())
            .field("face_detection", &self.cropper.is_some())
            .field("qr_version", &self.config.qr.version)
            .field("mapping", &self.mapping)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcard_biometric::{FaceRegion, FixedRegions, ThumbnailSpec};
    use dcard_crypto::LocalKeyProvider;
    use serde_json::json;

    fn record(last_name: &str) -> IdentityRecord {
        IdentityRecord::from_value(json!({
            "UIN": "4123456789",
            "fn": [{"language": "eng", "value": "Maria"}],
            "mn": [{"language": "eng", "value": "Reyes"}],
            "ln": [{"language": "eng", "value": last_name}],
            "gen": [{"language": "eng", "value": "Female"}],
            "BF": [{"rank": 1, "subType": "Left Thumb"}, {"rank": 2, "subType": "Right Index"}],
            "dob": "1985/12/01",
            "pob": [{"language": "eng", "value": "Cebu"}],
            "PCN": "9876-5432-1098-7654"
        }))
        .unwrap()
    }

    fn composer(config: CardConfig) -> CardComposer<FixedRegions> {
        let detector = FixedRegions(vec![FaceRegion::new(0, 0, 10, 10)]);
        let keys = Arc::new(LocalKeyProvider::from_seed(&[7u8; 32]));
        CardComposer::new(config, keys, Some(detector), MappingSource::None).unwrap()
    }

    fn full_budget_thumbnail() -> Option<Thumbnail> {
        let spec = ThumbnailSpec::default();
        let bytes = (0..spec.max_bytes).map(|i| (i * 31 % 251) as u8).collect();
        Some(Thumbnail {
            bytes,
            width: spec.width,
            height: spec.height,
        })
    }

    #[test]
    fn credential_type_parse_is_case_insensitive() {
        assert_eq!(CredentialType::parse("qrcode"), CredentialType::QrCode);
        assert_eq!(CredentialType::parse("QRCode"), CredentialType::QrCode);
        assert_eq!(CredentialType::parse("QRCODE"), CredentialType::QrCode);
        assert_eq!(CredentialType::parse("euin"), CredentialType::Standard);
        assert_eq!(CredentialType::parse(""), CredentialType::Standard);
        assert_eq!("qrCode".parse::<CredentialType>().unwrap(), CredentialType::QrCode);
    }

    #[test]
    fn default_thumbnail_budget_fits_default_symbol() {
        let composer = composer(CardConfig::default());
        let mut thumbnail = full_budget_thumbnail();
        let mut log = DegradationLog::default();
        let code = composer
            .code_stage(&record("Lim"), &mut thumbnail, &mut log)
            .expect("code produced");
        assert!(code.payload.body().thumbnail.is_some());
        assert!(code.payload.signature().is_some());
        assert!(code.payload.to_bytes().unwrap().len() <= composer.encoder().capacity());
        assert!(thumbnail.is_some());
        assert!(log.into_vec().is_empty());
    }

    #[test]
    fn overflowing_code_drops_only_the_thumbnail() {
        let composer = composer(CardConfig::default());
        let mut thumbnail = full_budget_thumbnail();
        let mut log = DegradationLog::default();
        let long_name = "Santos".repeat(30);
        let code = composer
            .code_stage(&record(&long_name), &mut thumbnail, &mut log)
            .expect("code produced without thumbnail");
        assert!(code.payload.body().thumbnail.is_none());
        assert_eq!(code.payload.body().subject.last_name, long_name);
        assert!(code.payload.signature().is_some());
        assert!(thumbnail.is_none());
        let degradations = log.into_vec();
        assert_eq!(degradations.len(), 1);
        assert_eq!(degradations[0].marker(), "FACE_THUMBNAIL_NOT_SET");
        assert!(degradations[0].detail().contains("capacity"));
    }

    #[test]
    fn thumbnail_budget_beyond_symbol_capacity_is_rejected() {
        let config = CardConfig {
            thumbnail: ThumbnailSpec {
                max_bytes: 600,
                ..ThumbnailSpec::default()
            },
            ..CardConfig::default()
        };
        let keys: Arc<dyn KeyProvider> = Arc::new(LocalKeyProvider::from_seed(&[7u8; 32]));
        let detector = FixedRegions(vec![FaceRegion::new(0, 0, 10, 10)]);
        let err = CardComposer::new(config.clone(), keys.clone(), Some(detector), MappingSource::None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref m) if m.contains("max_bytes 600")), "{err}");

        // Without a detector no thumbnail is embedded, so the budget is moot.
        assert!(CardComposer::<FixedRegions>::new(config, keys, None, MappingSource::None).is_ok());
    }
}

//! # Card Payload — The Signed Record and Its Optical-Code Envelope
//!
//! Two wire types share one field layout:
//!
//! ```text
//! CardPayload  {"i":..,"sb":{"sf","ln","fn","mn","s","BF","DOB","POB","PCN"},"img":..}
//! CodePayload  {"i":..,"sb":{...},"img":..,"si":..}
//! ```
//!
//! Field order and key names are part of the verification contract with
//! existing readers. `serde` emits struct fields in declaration order, so
//! the order below is the wire order. `img` and `si` are omitted when absent.
//!
//! `CodePayload` serializes its body through `#[serde(flatten)]` over the
//! very same `CardPayload`, which makes "displayed bytes minus `si`" equal
//! to the signed bytes by construction.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CanonicalizationError;

/// Issuer tag written to `i` when the configuration does not override it.
pub const DEFAULT_ISSUER: &str = "PSA";

/// Single-character sex code carried in `sb.s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SexCode {
    /// Serialized as `"f"`.
    Female,
    /// Serialized as `"m"`.
    Male,
}

impl SexCode {
    /// The only raw value that maps to [`SexCode::Female`].
    pub const FEMALE_VALUE: &'static str = "Female";

    /// Normalize a raw sex value.
    ///
    /// Exactly `"Female"` (content equality, case-sensitive, no trimming)
    /// maps to `f`; every other string, including `"female"` and
    /// `" Female"`, maps to `m`.
    pub fn normalize(raw: &str) -> Self {
        if raw == Self::FEMALE_VALUE {
            Self::Female
        } else {
            Self::Male
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Female => "f",
            Self::Male => "m",
        }
    }
}

impl std::fmt::Display for SexCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SexCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SexCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        match code.as_str() {
            "f" => Ok(Self::Female),
            "m" => Ok(Self::Male),
            other => Err(serde::de::Error::custom(format!(
                "sex code must be \"f\" or \"m\", got {other:?}"
            ))),
        }
    }
}

/// The subject block (`sb`) of the card payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubjectBlock {
    /// Name suffix. Always present, empty unless the record supplies one.
    #[serde(rename = "sf", default)]
    pub suffix: String,
    #[serde(rename = "ln")]
    pub last_name: String,
    #[serde(rename = "fn")]
    pub first_name: String,
    #[serde(rename = "mn")]
    pub middle_name: String,
    #[serde(rename = "s")]
    pub sex: SexCode,
    /// Blood-group / biometric flag, e.g. the best-two-finger ranks `"[1,2]"`.
    #[serde(rename = "BF")]
    pub biometric_flag: String,
    #[serde(rename = "DOB")]
    pub date_of_birth: String,
    #[serde(rename = "POB")]
    pub place_of_birth: String,
    /// Unique person/credential number.
    #[serde(rename = "PCN")]
    pub pcn: String,
}

/// The canonical card payload: exactly what is signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CardPayload {
    #[serde(rename = "i")]
    pub issuer: String,
    #[serde(rename = "sb")]
    pub subject: SubjectBlock,
    /// Base64 (standard alphabet) of the lossy face thumbnail.
    #[serde(rename = "img", default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl CardPayload {
    /// Build a payload, embedding the thumbnail bytes by value.
    pub fn new(issuer: impl Into<String>, subject: SubjectBlock, thumbnail: Option<&[u8]>) -> Self {
        Self {
            issuer: issuer.into(),
            subject,
            thumbnail: thumbnail.map(|bytes| STANDARD.encode(bytes)),
        }
    }

    /// Decode the embedded thumbnail, if any.
    pub fn thumbnail_bytes(&self) -> Result<Option<Vec<u8>>, CanonicalizationError> {
        self.thumbnail
            .as_deref()
            .map(|b64| {
                STANDARD
                    .decode(b64)
                    .map_err(|e| CanonicalizationError::InvalidPayload(format!("img: {e}")))
            })
            .transpose()
    }

    /// Attach a base64 signature, producing the optical-code envelope.
    pub fn into_code_payload(self, signature: Option<String>) -> CodePayload {
        CodePayload {
            body: self,
            signature,
        }
    }
}

/// The optical-code payload: the card payload followed by its signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodePayload {
    #[serde(flatten)]
    body: CardPayload,
    /// Base64 Ed25519 signature over the canonical bytes of `body`.
    #[serde(rename = "si", skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
}

/// Strict wire mirror used for decoding; `flatten` cannot be combined with
/// `deny_unknown_fields`, and unknown keys must never pass verification.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct WireCodePayload {
    i: String,
    sb: SubjectBlock,
    #[serde(default)]
    img: Option<String>,
    #[serde(default)]
    si: Option<String>,
}

impl<'de> Deserialize<'de> for CodePayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireCodePayload::deserialize(deserializer)?;
        Ok(Self {
            body: CardPayload {
                issuer: wire.i,
                subject: wire.sb,
                thumbnail: wire.img,
            },
            signature: wire.si,
        })
    }
}

impl CodePayload {
    /// The signed part of the envelope.
    pub fn body(&self) -> &CardPayload {
        &self.body
    }

    /// The embedded base64 signature, if signing succeeded.
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// Serialize to the bytes placed in the optical code.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CanonicalizationError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse bytes read back from an optical code.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CanonicalizationError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn into_parts(self) -> (CardPayload, Option<String>) {
        (self.body, self.signature)
    }
}

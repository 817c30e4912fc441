//! Non-fatal omissions recorded while composing a card.

use std::fmt;

/// Something the card was rendered without, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degradation {
    /// No applicant photo: no biometrics, no face sample, or a malformed one.
    ApplicantPhotoNotSet(String),
    /// A photo exists but no face thumbnail could be derived from it.
    FaceThumbnailNotSet(String),
    /// The optical code carries no `si` signature.
    QrSignatureNotSet(String),
    /// No optical code at all.
    QrCodeNotSet(String),
    /// Mapped demographic attributes are missing or incomplete.
    MappingDegraded(String),
}

impl Degradation {
    /// Stable log marker for this omission.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::ApplicantPhotoNotSet(_) => "APPLICANT_PHOTO_NOT_SET",
            Self::FaceThumbnailNotSet(_) => "FACE_THUMBNAIL_NOT_SET",
            Self::QrSignatureNotSet(_) => "QR_SIGNATURE_NOT_SET",
            Self::QrCodeNotSet(_) => "QRCODE_NOT_SET",
            Self::MappingDegraded(_) => "MAPPING_DEGRADED",
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::ApplicantPhotoNotSet(d)
            | Self::FaceThumbnailNotSet(d)
            | Self::QrSignatureNotSet(d)
            | Self::QrCodeNotSet(d)
            | Self::MappingDegraded(d) => d,
        }
    }
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.marker(), self.detail())
    }
}

/// Collects degradations and logs each one as it is recorded.
#[derive(Debug, Default)]
pub(crate) struct DegradationLog {
    entries: Vec<Degradation>,
}

impl DegradationLog {
    pub(crate) fn record(&mut self, degradation: Degradation) {
        tracing::warn!(
            marker = degradation.marker(),
            detail = degradation.detail(),
            "card degraded"
        );
        self.entries.push(degradation);
    }

    pub(crate) fn into_vec(self) -> Vec<Degradation> {
        self.entries
    }
}

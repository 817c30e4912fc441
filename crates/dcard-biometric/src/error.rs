//! # Biometric Error Types
//!
//! Every variant here is non-fatal to card generation: the orchestrator
//! logs it and renders the card without a photo or thumbnail.

use thiserror::Error;

/// Errors from biometric extraction and face cropping.
#[derive(Error, Debug)]
pub enum BiometricError {
    /// The CBEFF container is not parseable.
    #[error("malformed biometric container: {0}")]
    Container(String),

    /// The ISO/IEC 19794-5 face record is truncated or inconsistent.
    #[error("malformed face record: {0}")]
    FaceRecord(String),

    /// The face record carries an image encoding this crate cannot decode.
    #[error("unsupported face image data type {0}")]
    UnsupportedImageType(u8),

    /// The embedded image bytes could not be decoded or re-encoded.
    #[error("raster error: {0}")]
    Raster(String),

    /// The face detector failed to run.
    #[error("face detection failed: {0}")]
    Detection(String),

    /// The selected region cannot be cropped from the raster.
    #[error("face crop failed: {0}")]
    Crop(String),

    /// The thumbnail could not be encoded within its byte budget.
    #[error("thumbnail encoding failed: {0}")]
    Thumbnail(String),
}

impl BiometricError {
    /// Whether this error means the container or its sample is malformed,
    /// as opposed to a face-processing failure.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::Container(_) | Self::FaceRecord(_) | Self::UnsupportedImageType(_) | Self::Raster(_)
        )
    }
}

impl From<image::ImageError> for BiometricError {
    fn from(e: image::ImageError) -> Self {
        Self::Raster(e.to_string())
    }
}

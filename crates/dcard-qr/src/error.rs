//! # Optical-Code Error Types

use thiserror::Error;

/// Errors from QR symbol generation.
#[derive(Error, Debug)]
pub enum CodeGenerationError {
    /// The payload does not fit the configured symbol version. Payloads are
    /// never truncated.
    #[error("payload of {len} bytes exceeds {capacity}-byte capacity of QR version {version}")]
    CapacityExceeded {
        len: usize,
        capacity: usize,
        version: i16,
    },

    /// The configured version or module geometry is invalid.
    #[error("invalid symbol configuration: {0}")]
    InvalidConfig(String),

    /// The payload could not be serialized.
    #[error("payload serialization failed: {0}")]
    Payload(String),

    /// The QR encoder failed internally.
    #[error("QR encoder error: {0}")]
    Encoder(String),

    /// The rendered symbol could not be written as PNG.
    #[error("PNG rendering failed: {0}")]
    Render(String),
}

impl From<qrcode::types::QrError> for CodeGenerationError {
    fn from(e: qrcode::types::QrError) -> Self {
        Self::Encoder(e.to_string())
    }
}

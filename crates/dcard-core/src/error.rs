//! # Error Types
//!
//! Errors raised while reading identity records and producing canonical
//! payload bytes. All errors use `thiserror` for derive-based `Display` and
//! `Error` implementations.

use thiserror::Error;

/// Error while reading the identity record.
#[derive(Error, Debug)]
pub enum RecordError {
    /// The record is absent, or lacks the field that identifies the person.
    #[error("identity not found: {0}")]
    IdentityNotFound(String),

    /// The record is present but is not a JSON object.
    #[error("malformed identity record: {0}")]
    Malformed(String),
}

/// Error during canonical serialization of a card payload.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization or parsing failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// The payload violates a structural invariant.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

//! # Signing Error Types
//!
//! Structured errors for key handling, signing, and verification.

use thiserror::Error;

/// Errors from Ed25519 key handling and signature operations.
#[derive(Error, Debug)]
pub enum SigningError {
    /// The signing key material is malformed.
    #[error("invalid signing key: {0}")]
    InvalidSigningKey(String),

    /// The public key is malformed.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// The signature is not a 64-byte base64 value.
    #[error("invalid signature encoding: {0}")]
    InvalidSignature(String),

    /// Ed25519 signature verification failed.
    #[error("Ed25519 verification failed: {0}")]
    VerificationFailed(String),

    /// The key source (environment, file) is unavailable.
    #[error("signing key unavailable: {0}")]
    KeyUnavailable(String),

    /// I/O error while reading key material.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

//! # Signed Optical-Code Payload
//!
//! Signing and verification share one path to the signed bytes:
//! [`CanonicalBytes::new`] over the [`CardPayload`]. The verifier re-derives
//! those bytes from the fields it scanned, so anything the signer saw that
//! the reader cannot see (whitespace, key order, escaping) cannot exist.

use dcard_core::{sha256_digest, CanonicalBytes, CanonicalizationError, CardPayload, CodePayload, ContentDigest};
use dcard_crypto::{Ed25519Signature, KeyProvider, SigningError, VerifyingKey};

/// A code payload with the outcome of signing it.
#[derive(Debug)]
pub struct SignedCode {
    pub payload: CodePayload,
    /// SHA-256 of the canonical bytes; safe to log.
    pub digest: ContentDigest,
    /// Why `si` is missing, when it is.
    pub signature_error: Option<SigningError>,
}

/// Canonicalize and sign a card payload.
///
/// A signing failure is not an error here: the payload is returned without
/// `si` and the failure is carried in [`SignedCode::signature_error`].
pub fn sign_card_payload(
    keys: &dyn KeyProvider,
    payload: CardPayload,
) -> Result<SignedCode, CanonicalizationError> {
    let canonical = CanonicalBytes::new(&payload)?;
    let digest = sha256_digest(&canonical);
    let (signature, signature_error) = match keys.sign(&canonical) {
        Ok(sig) => (Some(sig.to_base64()), None),
        Err(e) => (None, Some(e)),
    };
    tracing::debug!(
        payload_digest = %digest,
        provider = keys.provider_name(),
        signed = signature.is_some(),
        "card payload canonicalized"
    );
    Ok(SignedCode {
        payload: payload.into_code_payload(signature),
        digest,
        signature_error,
    })
}

/// Why a scanned payload did not verify.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("payload is not a card payload: {0}")]
    Payload(#[from] CanonicalizationError),
    #[error("payload carries no signature")]
    Unsigned,
    #[error(transparent)]
    Signature(#[from] SigningError),
}

/// Parse scanned optical-code bytes and check their signature.
///
/// Returns the payload only when the signature over the re-derived
/// canonical bytes verifies against `key`.
pub fn verify_code_payload(bytes: &[u8], key: &VerifyingKey) -> Result<CodePayload, VerifyError> {
    let payload = CodePayload::from_slice(bytes)?;
    let signature = payload.signature().ok_or(VerifyError::Unsigned)?;
    let signature = Ed25519Signature::from_base64(signature)?;
    let canonical = CanonicalBytes::from_code_payload(&payload)?;
    key.verify(&canonical, &signature)?;
    Ok(payload)
}

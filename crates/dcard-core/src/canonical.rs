//! # Canonical Serialization — Signed Byte Production
//!
//! This module defines `CanonicalBytes`, the sole construction path for bytes
//! that are signed or verified anywhere in the card pipeline.
//!
//! ## Security Invariant
//!
//! The `CanonicalBytes` newtype has a private inner field. It can only be
//! built from a [`CardPayload`] (issuance) or from a parsed [`CodePayload`]
//! (verification), and both paths run the same `serde` definitions. Signing
//! accepts `&CanonicalBytes`, never `&[u8]`, so a payload assembled by string
//! interpolation cannot reach the signer.
//!
//! ## Form
//!
//! Compact JSON, UTF-8, no insignificant whitespace, fields in declaration
//! order (not sorted: the wire order is fixed by existing readers). All
//! escaping of quotes, braces, and control characters is done by
//! `serde_json`.

use crate::error::CanonicalizationError;
use crate::payload::{CardPayload, CodePayload};

/// Bytes produced exclusively by serializing a [`CardPayload`].
///
/// # Invariants
///
/// - Only constructible through [`CanonicalBytes::new`] or
///   [`CanonicalBytes::from_code_payload`].
/// - The issuer and PCN are non-empty.
/// - Re-deriving from a decoded [`CodePayload`] yields identical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize a card payload for signing.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::InvalidPayload` if the issuer tag or
    /// the unique number is empty, and `SerializationFailed` if `serde_json`
    /// fails.
    pub fn new(payload: &CardPayload) -> Result<Self, CanonicalizationError> {
        if payload.issuer.is_empty() {
            return Err(CanonicalizationError::InvalidPayload(
                "issuer tag must not be empty".into(),
            ));
        }
        if payload.subject.pcn.is_empty() {
            return Err(CanonicalizationError::InvalidPayload(
                "PCN must not be empty".into(),
            ));
        }
        Ok(Self(serde_json::to_vec(payload)?))
    }

    /// Re-derive the signed bytes from a decoded optical-code payload.
    pub fn from_code_payload(code: &CodePayload) -> Result<Self, CanonicalizationError> {
        Self::new(code.body())
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::fixtures;

    #[test]
    fn canonical_is_compact_json() {
        let payload = CardPayload::new("PSA", fixtures::subject(), None);
        let cb = CanonicalBytes::new(&payload).unwrap();
        let s = std::str::from_utf8(cb.as_bytes()).unwrap();
        assert!(s.starts_with(r#"{"i":"PSA","sb":{"sf":"","#));
        assert!(!s.contains(": "));
        assert!(!s.contains(", "));
    }

    #[test]
    fn empty_pcn_rejected() {
        let mut subject = fixtures::subject();
        subject.pcn.clear();
        let payload = CardPayload::new("PSA", subject, None);
        match CanonicalBytes::new(&payload) {
            Err(CanonicalizationError::InvalidPayload(msg)) => assert!(msg.contains("PCN")),
            other => panic!("expected InvalidPayload, got {other:?}"),
        }
    }

    #[test]
    fn empty_issuer_rejected() {
        let payload = CardPayload::new("", fixtures::subject(), None);
        assert!(CanonicalBytes::new(&payload).is_err());
    }

    #[test]
    fn code_bytes_are_signed_bytes_plus_signature() {
        let payload = CardPayload::new("PSA", fixtures::subject(), Some(b"thumb"));
        let canonical = CanonicalBytes::new(&payload).unwrap();
        let code = payload.into_code_payload(Some("AAAA".into()));
        let displayed = code.to_bytes().unwrap();

        // Everything up to the closing brace is shared; only `,"si":..` is appended.
        let shared = &canonical.as_bytes()[..canonical.len() - 1];
        assert_eq!(&displayed[..shared.len()], shared);
        assert_eq!(&displayed[shared.len()..], br#","si":"AAAA"}"#);
    }

    #[test]
    fn rederived_from_decoded_code_payload() {
        let payload = CardPayload::new("PSA", fixtures::subject(), Some(&[0xff, 0x00, 0x10]));
        let canonical = CanonicalBytes::new(&payload).unwrap();
        let code = payload.into_code_payload(Some("sig".into()));
        let decoded = CodePayload::from_slice(&code.to_bytes().unwrap()).unwrap();
        assert_eq!(CanonicalBytes::from_code_payload(&decoded).unwrap(), canonical);
    }

    #[test]
    fn unicode_passes_through_unescaped() {
        let mut subject = fixtures::subject();
        subject.place_of_birth = "Parañaque".into();
        let cb = CanonicalBytes::new(&CardPayload::new("PSA", subject, None)).unwrap();
        let s = std::str::from_utf8(cb.as_bytes()).unwrap();
        assert!(s.contains("Parañaque"));
    }
}

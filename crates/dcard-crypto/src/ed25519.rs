//! # Ed25519 Signing and Verification
//!
//! Deterministic Ed25519 signatures over card payload bytes.
//!
//! ## Security Invariant
//!
//! - Signing input MUST be `&CanonicalBytes`. Raw byte slices cannot be
//!   signed, so the bytes embedded in the optical code and the bytes signed
//!   are produced by the same serializer.
//! - Private keys are never serialized or logged. [`SigningKey`] does not
//!   implement `Serialize`, its `Debug` prints `<private>`, and the inner
//!   dalek key zeroizes on drop.
//!
//! ## Encodings
//!
//! Keys and signatures travel as standard base64, matching the `si` field
//! of the optical-code payload. A signing key is either the 32-byte seed or
//! the 64-byte `seed || public` concatenation; in the latter case the public
//! half must match the key derived from the seed.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dcard_core::CanonicalBytes;
use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

use crate::error::SigningError;

/// Length of an Ed25519 seed.
pub const SEED_LENGTH: usize = 32;

/// Length of an Ed25519 signature.
pub const SIGNATURE_LENGTH: usize = 64;

/// An Ed25519 signing key. Zeroized on drop.
pub struct SigningKey(ed25519_dalek::SigningKey);

/// An Ed25519 public key (32 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct VerifyingKey([u8; 32]);

/// An Ed25519 signature (64 bytes).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ed25519Signature([u8; SIGNATURE_LENGTH]);

// ---------------------------------------------------------------------------
// SigningKey
// ---------------------------------------------------------------------------

impl SigningKey {
    /// Generate a new random key from the OS CSPRNG.
    pub fn generate() -> Self {
        Self(ed25519_dalek::SigningKey::generate(&mut rand_core::OsRng))
    }

    /// Create a key from a raw 32-byte seed.
    pub fn from_seed(seed: &[u8; SEED_LENGTH]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(seed))
    }

    /// Parse a base64 key: a 32-byte seed or a 64-byte `seed || public`.
    pub fn from_base64(encoded: &str) -> Result<Self, SigningError> {
        let bytes = Zeroizing::new(
            STANDARD
                .decode(encoded.trim())
                .map_err(|e| SigningError::InvalidSigningKey(format!("base64: {e}")))?,
        );
        match bytes.len() {
            SEED_LENGTH => {
                let mut seed = Zeroizing::new([0u8; SEED_LENGTH]);
                seed.copy_from_slice(&bytes);
                Ok(Self::from_seed(&seed))
            }
            64 => {
                let mut seed = Zeroizing::new([0u8; SEED_LENGTH]);
                seed.copy_from_slice(&bytes[..SEED_LENGTH]);
                let key = Self::from_seed(&seed);
                if key.verifying_key().as_bytes()[..] != bytes[SEED_LENGTH..] {
                    return Err(SigningError::InvalidSigningKey(
                        "public half does not match the seed".into(),
                    ));
                }
                Ok(key)
            }
            n => Err(SigningError::InvalidSigningKey(format!(
                "expected 32 or 64 bytes, got {n}"
            ))),
        }
    }

    /// Export the 32-byte seed as base64. The returned string is zeroized
    /// on drop.
    pub fn to_base64(&self) -> Zeroizing<String> {
        let seed = Zeroizing::new(self.0.to_bytes());
        Zeroizing::new(STANDARD.encode(*seed))
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey(self.0.verifying_key().to_bytes())
    }

    /// Sign canonical payload bytes. Ed25519 is deterministic: the same key
    /// and bytes always produce the same signature.
    pub fn sign(&self, data: &CanonicalBytes) -> Ed25519Signature {
        Ed25519Signature(self.0.sign(data.as_bytes()).to_bytes())
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKey(<private>)")
    }
}

// ---------------------------------------------------------------------------
// VerifyingKey
// ---------------------------------------------------------------------------

impl VerifyingKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Parse a base64 public key.
    pub fn from_base64(encoded: &str) -> Result<Self, SigningError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| SigningError::InvalidPublicKey(format!("base64: {e}")))?;
        let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            SigningError::InvalidPublicKey(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        // Reject points that do not decompress.
        ed25519_dalek::VerifyingKey::from_bytes(&arr)
            .map_err(|e| SigningError::InvalidPublicKey(e.to_string()))?;
        Ok(Self(arr))
    }

    /// Verify a signature over canonical bytes.
    pub fn verify(
        &self,
        data: &CanonicalBytes,
        signature: &Ed25519Signature,
    ) -> Result<(), SigningError> {
        let vk = ed25519_dalek::VerifyingKey::from_bytes(&self.0)
            .map_err(|e| SigningError::InvalidPublicKey(e.to_string()))?;
        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
        vk.verify(data.as_bytes(), &sig)
            .map_err(|e| SigningError::VerificationFailed(e.to_string()))
    }
}

impl Serialize for VerifyingKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for VerifyingKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VerifyingKey({})", self.to_base64())
    }
}

impl std::fmt::Display for VerifyingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base64())
    }
}

// ---------------------------------------------------------------------------
// Ed25519Signature
// ---------------------------------------------------------------------------

impl Ed25519Signature {
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    /// The form embedded as `si` in the optical-code payload.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    pub fn from_base64(encoded: &str) -> Result<Self, SigningError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| SigningError::InvalidSignature(format!("base64: {e}")))?;
        let arr: [u8; SIGNATURE_LENGTH] = bytes.as_slice().try_into().map_err(|_| {
            SigningError::InvalidSignature(format!(
                "expected {SIGNATURE_LENGTH} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }
}

impl std::fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix: String = self.0.iter().take(4).map(|b| format!("{b:02x}")).collect();
        write!(f, "Ed25519Signature({prefix}...)")
    }
}

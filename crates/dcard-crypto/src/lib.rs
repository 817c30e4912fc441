//! # dcard-crypto — Card Payload Signatures
//!
//! Ed25519 signing over [`dcard_core::CanonicalBytes`], base64 key and
//! signature encodings, and the [`KeyProvider`] seam through which the
//! pipeline consumes a pre-provisioned signing key.
//!
//! ## Crate Policy
//!
//! - Signing input is always `&CanonicalBytes`, never `&[u8]`.
//! - Private key material never appears in `Debug` output or logs.
//! - No `.unwrap()` outside tests.

pub mod ed25519;
pub mod error;
pub mod key_provider;

pub use ed25519::{Ed25519Signature, SigningKey, VerifyingKey};
pub use error::SigningError;
pub use key_provider::{
    EnvKeyProvider, FileKeyProvider, KeyProvider, LocalKeyProvider, SIGNING_KEY_ENV,
};

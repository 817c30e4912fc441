//! # Key Provider Abstraction
//!
//! The card signing key is provisioned outside this system and consumed
//! read-only. A provider loads it once and is then shared across concurrent
//! card requests.
//!
//! - [`LocalKeyProvider`]: in-memory key for development and tests.
//! - [`EnvKeyProvider`]: base64 key from an environment variable
//!   (default [`SIGNING_KEY_ENV`]).
//! - [`FileKeyProvider`]: base64 key from a file on disk, e.g. a mounted
//!   secret.
//!
//! All key material is zeroized on drop.

use std::path::{Path, PathBuf};

use dcard_core::CanonicalBytes;
use zeroize::Zeroizing;

use crate::ed25519::{Ed25519Signature, SigningKey, VerifyingKey};
use crate::error::SigningError;

/// Environment variable read by [`EnvKeyProvider::from_default_env`].
pub const SIGNING_KEY_ENV: &str = "DCARD_SIGNING_KEY";

/// Trait for Ed25519 key storage and signing backends.
///
/// `Send + Sync` so one provider can serve concurrent requests.
pub trait KeyProvider: Send + Sync {
    /// Sign canonicalized payload bytes with the managed key.
    fn sign(&self, data: &CanonicalBytes) -> Result<Ed25519Signature, SigningError>;

    fn verifying_key(&self) -> Result<VerifyingKey, SigningError>;

    /// Name for diagnostics and logging.
    fn provider_name(&self) -> &str;
}

// ─── LocalKeyProvider ────────────────────────────────────────────────────

pub struct LocalKeyProvider {
    key: SigningKey,
}

impl LocalKeyProvider {
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    pub fn generate() -> Self {
        Self::new(SigningKey::generate())
    }

    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::new(SigningKey::from_seed(seed))
    }
}

impl KeyProvider for LocalKeyProvider {
    fn sign(&self, data: &CanonicalBytes) -> Result<Ed25519Signature, SigningError> {
        Ok(self.key.sign(data))
    }

    fn verifying_key(&self) -> Result<VerifyingKey, SigningError> {
        Ok(self.key.verifying_key())
    }

    fn provider_name(&self) -> &str {
        "LocalKeyProvider"
    }
}

// ─── EnvKeyProvider ──────────────────────────────────────────────────────

/// Loads the signing key from an environment variable holding base64 key
/// material (32-byte seed or 64-byte keypair).
///
/// ```bash
/// export DCARD_SIGNING_KEY="$(dcard keygen --print-secret)"
/// ```
pub struct EnvKeyProvider {
    key: SigningKey,
    var_name: String,
}

impl EnvKeyProvider {
    pub fn from_env(var_name: &str) -> Result<Self, SigningError> {
        let encoded = Zeroizing::new(std::env::var(var_name).map_err(|_| {
            SigningError::KeyUnavailable(format!("environment variable {var_name} not set"))
        })?);
        let key = SigningKey::from_base64(&encoded)?;
        Ok(Self {
            key,
            var_name: var_name.to_string(),
        })
    }

    pub fn from_default_env() -> Result<Self, SigningError> {
        Self::from_env(SIGNING_KEY_ENV)
    }

    pub fn var_name(&self) -> &str {
        &self.var_name
    }
}

impl KeyProvider for EnvKeyProvider {
    fn sign(&self, data: &CanonicalBytes) -> Result<Ed25519Signature, SigningError> {
        Ok(self.key.sign(data))
    }

    fn verifying_key(&self) -> Result<VerifyingKey, SigningError> {
        Ok(self.key.verifying_key())
    }

    fn provider_name(&self) -> &str {
        "EnvKeyProvider"
    }
}

// ─── FileKeyProvider ─────────────────────────────────────────────────────

/// Loads the signing key from a file containing base64 key material.
/// Surrounding whitespace is ignored.
pub struct FileKeyProvider {
    key: SigningKey,
    path: PathBuf,
}

impl FileKeyProvider {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SigningError> {
        let path = path.as_ref();
        let encoded = Zeroizing::new(std::fs::read_to_string(path).map_err(|e| {
            SigningError::KeyUnavailable(format!("cannot read {}: {e}", path.display()))
        })?);
        let key = SigningKey::from_base64(&encoded)?;
        Ok(Self {
            key,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyProvider for FileKeyProvider {
    fn sign(&self, data: &CanonicalBytes) -> Result<Ed25519Signature, SigningError> {
        Ok(self.key.sign(data))
    }

    fn verifying_key(&self) -> Result<VerifyingKey, SigningError> {
        Ok(self.key.verifying_key())
    }

    fn provider_name(&self) -> &str {
        "FileKeyProvider"
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────

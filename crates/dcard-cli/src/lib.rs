//! # dcard-cli — Digital Card Command-Line Interface
//!
//! Provides the `dcard` binary. Argument parsing lives here; the work is
//! done by `dcard-pipeline` and the crates below it.
//!
//! ## Subcommands
//!
//! - `dcard keygen`: generate the optical-code signing key.
//! - `dcard code`: run the offline stages for one record and write the QR
//!   symbol and its payload.
//! - `dcard verify`: check a payload against a public key.
//! - `dcard card`: generate a signed card through the remote services.
//!
//! ```bash
//! dcard keygen --output /etc/dcard --prefix card-signing
//! dcard --config card.yaml code record.json --key /etc/dcard/card-signing.key
//! dcard verify card-code.json --pubkey /etc/dcard/card-signing.pub
//! ```

pub mod card;
pub mod code;
pub mod keygen;
pub mod verify;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use dcard_core::{CanonicalBytes, IdentityRecord};
use dcard_crypto::{
    Ed25519Signature, EnvKeyProvider, FileKeyProvider, KeyProvider, SigningError, VerifyingKey,
};
use dcard_pipeline::CardConfig;

/// Load the card configuration: the YAML file when given, defaults
/// otherwise, then `DCARD_*` environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<CardConfig> {
    let mut config = match path {
        Some(path) => CardConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load card configuration {}", path.display()))?,
        None => CardConfig::default(),
    };
    config.apply_env();
    config.validate().context("invalid card configuration")?;
    Ok(config)
}

/// Read a decrypted identity record from a JSON file.
pub fn read_record(path: &Path) -> Result<IdentityRecord> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read record {}", path.display()))?;
    IdentityRecord::from_json_str(&json)
        .with_context(|| format!("{} is not an identity record", path.display()))
}

/// Resolve the optical-code signing key.
///
/// An explicit key file must load. Without one the `DCARD_SIGNING_KEY`
/// environment variable is tried; when that is unset too, codes are
/// produced unsigned and each request records the degradation.
pub fn resolve_keys(key_file: Option<&Path>) -> Result<Arc<dyn KeyProvider>> {
    if let Some(path) = key_file {
        let provider = FileKeyProvider::from_path(path)
            .with_context(|| format!("failed to load signing key {}", path.display()))?;
        return Ok(Arc::new(provider));
    }
    match EnvKeyProvider::from_default_env() {
        Ok(provider) => Ok(Arc::new(provider)),
        Err(e @ SigningError::KeyUnavailable(_)) => {
            tracing::warn!(error = %e, "no signing key configured; optical codes will be unsigned");
            Ok(Arc::new(MissingKey(e.to_string())))
        }
        Err(e) => Err(e).context("DCARD_SIGNING_KEY holds an invalid key"),
    }
}

/// Read a base64 public key file.
pub fn read_public_key(path: &Path) -> Result<VerifyingKey> {
    let encoded = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read public key {}", path.display()))?;
    VerifyingKey::from_base64(encoded.trim())
        .with_context(|| format!("{} is not an Ed25519 public key", path.display()))
}

/// Stand-in provider when no key is configured.
struct MissingKey(String);

impl KeyProvider for MissingKey {
    fn sign(&self, _data: &CanonicalBytes) -> Result<Ed25519Signature, SigningError> {
        Err(SigningError::KeyUnavailable(self.0.clone()))
    }

    fn verifying_key(&self) -> Result<VerifyingKey, SigningError> {
        Err(SigningError::KeyUnavailable(self.0.clone()))
    }

    fn provider_name(&self) -> &str {
        "MissingKey"
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_config_defaults_without_file() {
        let config = load_config(None).unwrap();
        assert_eq!(config.qr.version, 20);
    }

    #[test]
    fn load_config_reads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.yaml");
        std::fs::write(&path, "template_type_code: EUIN_TEMPLATE\nsignature_page: 2\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.signature_page, 2);
    }

    #[test]
    fn load_config_missing_file_names_the_path() {
        let err = load_config(Some(Path::new("/nonexistent/card.yaml"))).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/card.yaml"));
    }

    #[test]
    fn read_record_rejects_non_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(read_record(&path).is_err());

        let path = fixtures::write_record(dir.path());
        assert_eq!(read_record(&path).unwrap().uin().unwrap(), "4123456789");
    }

    #[test]
    fn missing_key_file_is_an_error() {
        assert!(resolve_keys(Some(Path::new("/nonexistent/dcard.key"))).is_err());
    }

    #[test]
    fn missing_key_provider_always_fails() {
        let provider = MissingKey("DCARD_SIGNING_KEY not set".into());
        assert!(matches!(
            provider.verifying_key(),
            Err(SigningError::KeyUnavailable(_))
        ));
    }
}

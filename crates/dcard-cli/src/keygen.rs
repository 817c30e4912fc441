//! # Keygen Subcommand
//!
//! Generates the Ed25519 key that signs optical-code payloads.
//!
//! ```bash
//! dcard keygen --output /etc/dcard --prefix card-signing
//! export DCARD_SIGNING_KEY="$(dcard keygen --print-secret)"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use dcard_crypto::SigningKey;

/// Arguments for `dcard keygen`.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Directory for `<prefix>.key` and `<prefix>.pub`.
    #[arg(long, default_value = ".")]
    pub output: PathBuf,

    /// File name prefix.
    #[arg(long, default_value = "dcard")]
    pub prefix: String,

    /// Print the base64 seed to stdout instead of writing files.
    #[arg(long)]
    pub print_secret: bool,
}

/// Execute `dcard keygen`.
pub fn run_keygen(args: &KeygenArgs) -> Result<u8> {
    let key = SigningKey::generate();
    if args.print_secret {
        println!("{}", key.to_base64().as_str());
        return Ok(0);
    }

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    let secret_path = args.output.join(format!("{}.key", args.prefix));
    let public_path = args.output.join(format!("{}.pub", args.prefix));
    if secret_path.exists() {
        anyhow::bail!(
            "{} already exists; refusing to overwrite a signing key",
            secret_path.display()
        );
    }

    write_secret(&secret_path, key.to_base64().as_str())?;
    std::fs::write(&public_path, key.verifying_key().to_base64())
        .with_context(|| format!("failed to write {}", public_path.display()))?;

    tracing::info!(public_key = %public_path.display(), "signing key generated");
    println!("  secret key: {}", secret_path.display());
    println!("  public key: {}", public_path.display());
    Ok(0)
}

#[cfg(unix)]
fn write_secret(path: &Path, contents: &str) -> Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(not(unix))]
fn write_secret(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcard_crypto::{FileKeyProvider, KeyProvider, VerifyingKey};

    fn args(dir: &Path) -> KeygenArgs {
        KeygenArgs {
            output: dir.to_path_buf(),
            prefix: "test".into(),
            print_secret: false,
        }
    }

    #[test]
    fn writes_matching_key_pair() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(run_keygen(&args(dir.path())).unwrap(), 0);

        let provider = FileKeyProvider::from_path(dir.path().join("test.key")).unwrap();
        let public = std::fs::read_to_string(dir.path().join("test.pub")).unwrap();
        assert_eq!(
            VerifyingKey::from_base64(&public).unwrap(),
            provider.verifying_key().unwrap()
        );
    }

    #[test]
    fn refuses_to_overwrite_existing_key() {
        let dir = tempfile::tempdir().unwrap();
        run_keygen(&args(dir.path())).unwrap();
        let before = std::fs::read(dir.path().join("test.key")).unwrap();
        assert!(run_keygen(&args(dir.path())).is_err());
        assert_eq!(std::fs::read(dir.path().join("test.key")).unwrap(), before);
    }

    #[cfg(unix)]
    #[test]
    fn secret_key_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        run_keygen(&args(dir.path())).unwrap();
        let mode = std::fs::metadata(dir.path().join("test.key")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

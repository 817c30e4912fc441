//! # Code Subcommand
//!
//! Runs the offline stages for one record (photo, face thumbnail, subject
//! block, signature, QR symbol) and writes the symbol PNG and the exact
//! payload bytes it encodes. No remote service is contacted.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use dcard_pipeline::{composer_from_config, CardConfig, CredentialType};

/// Arguments for `dcard code`.
#[derive(Args, Debug)]
pub struct CodeArgs {
    /// Decrypted identity record (JSON).
    pub record: PathBuf,

    /// Signing key file (base64). Defaults to `DCARD_SIGNING_KEY`.
    #[arg(long)]
    pub key: Option<PathBuf>,

    /// Where to write the QR symbol.
    #[arg(long, default_value = "card-code.png")]
    pub png: PathBuf,

    /// Where to write the encoded payload.
    #[arg(long, default_value = "card-code.json")]
    pub payload: PathBuf,
}

/// Execute `dcard code`.
pub fn run_code(args: &CodeArgs, config: CardConfig) -> Result<u8> {
    let record = crate::read_record(&args.record)?;
    let keys = crate::resolve_keys(args.key.as_deref())?;
    let composer = composer_from_config(config, keys).context("failed to set up the card composer")?;

    let card = composer.compose(&record, CredentialType::QrCode)?;
    for degradation in &card.degradations {
        eprintln!("  degraded: {degradation}");
    }
    let Some(code) = card.code else {
        eprintln!("no optical code produced");
        return Ok(1);
    };

    let bytes = code.payload.to_bytes().context("failed to serialize the code payload")?;
    std::fs::write(&args.payload, &bytes)
        .with_context(|| format!("failed to write {}", args.payload.display()))?;
    std::fs::write(&args.png, &code.png)
        .with_context(|| format!("failed to write {}", args.png.display()))?;

    println!("  payload: {} ({} bytes)", args.payload.display(), bytes.len());
    println!("  symbol:  {}", args.png.display());
    println!("  digest:  {}", code.digest);
    println!("  signed:  {}", code.payload.signature().is_some());
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::write_record;
    use crate::keygen::{run_keygen, KeygenArgs};
    use crate::verify::{run_verify, VerifyArgs};

    #[test]
    fn code_then_verify() {
        let dir = tempfile::tempdir().unwrap();
        run_keygen(&KeygenArgs {
            output: dir.path().to_path_buf(),
            prefix: "k".into(),
            print_secret: false,
        })
        .unwrap();

        let args = CodeArgs {
            record: write_record(dir.path()),
            key: Some(dir.path().join("k.key")),
            png: dir.path().join("code.png"),
            payload: dir.path().join("code.json"),
        };
        assert_eq!(run_code(&args, CardConfig::default()).unwrap(), 0);
        assert!(std::fs::read(&args.png).unwrap().starts_with(b"\x89PNG"));

        let text = std::fs::read_to_string(&args.payload).unwrap();
        assert!(text.starts_with(r#"{"i":"PSA","sb":{"#), "{text}");
        assert!(text.contains(r#""si":"#));

        let verify = VerifyArgs {
            payload: args.payload.clone(),
            pubkey: dir.path().join("k.pub"),
        };
        assert_eq!(run_verify(&verify).unwrap(), 0);

        std::fs::write(&args.payload, text.replace("Ana", "Ann")).unwrap();
        assert_eq!(run_verify(&verify).unwrap(), 1);
    }

    #[test]
    fn record_without_required_fields_produces_no_code() {
        let dir = tempfile::tempdir().unwrap();
        let record = dir.path().join("record.json");
        std::fs::write(&record, r#"{"UIN": "1", "fn": "Ana"}"#).unwrap();
        let args = CodeArgs {
            record,
            key: None,
            png: dir.path().join("code.png"),
            payload: dir.path().join("code.json"),
        };
        assert_eq!(run_code(&args, CardConfig::default()).unwrap(), 1);
        assert!(!args.payload.exists());
    }
}

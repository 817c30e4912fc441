//! # Verify Subcommand
//!
//! Checks a decoded optical-code payload against the issuer's public key.
//! Exit code 0 when the signature verifies, 1 otherwise.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use dcard_pipeline::verify_code_payload;

/// Arguments for `dcard verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Payload bytes as read from the symbol.
    pub payload: PathBuf,

    /// Public key file (base64).
    #[arg(long)]
    pub pubkey: PathBuf,
}

/// Execute `dcard verify`.
pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let key = crate::read_public_key(&args.pubkey)?;
    let raw = std::fs::read(&args.payload)
        .with_context(|| format!("failed to read {}", args.payload.display()))?;

    match verify_code_payload(raw.trim_ascii_end(), &key) {
        Ok(payload) => {
            println!("  signature valid");
            println!("  issuer:  {}", payload.body().issuer);
            println!("  thumbnail: {}", payload.body().thumbnail.is_some());
            Ok(0)
        }
        Err(e) => {
            tracing::warn!(error = %e, "optical code rejected");
            eprintln!("  signature invalid: {e}");
            Ok(1)
        }
    }
}

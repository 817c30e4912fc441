//! # Card Subcommand
//!
//! Full generation for one record: offline stages, then the template
//! renderer and the document-signing service named by `DCARD_RENDER_URL`
//! and `DCARD_SIGN_URL`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use dcard_client::{ServiceClient, ServiceConfig};
use dcard_pipeline::{http_generator, CardConfig, CredentialType};

/// Arguments for `dcard card`.
#[derive(Args, Debug)]
pub struct CardArgs {
    /// Decrypted identity record (JSON).
    pub record: PathBuf,

    /// Signing key file (base64). Defaults to `DCARD_SIGNING_KEY`.
    #[arg(long)]
    pub key: Option<PathBuf>,

    /// `qrcode` for a photo-and-code card; anything else is a full card.
    #[arg(long, default_value = "standard")]
    pub credential_type: CredentialType,

    /// Password protecting the signed document.
    #[arg(long)]
    pub password: Option<String>,

    /// Where to write the signed document.
    #[arg(long, default_value = "card.pdf")]
    pub out: PathBuf,
}

/// Execute `dcard card`.
pub fn run_card(args: &CardArgs, config: CardConfig) -> Result<u8> {
    let record = crate::read_record(&args.record)?;
    let keys = crate::resolve_keys(args.key.as_deref())?;
    let services = ServiceConfig::from_env().context("invalid service configuration")?;
    tracing::debug!(?services, "service endpoints");
    let client = ServiceClient::new(services).context("failed to build the HTTP client")?;
    let generator = http_generator(config, keys, client).context("failed to set up the card generator")?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start the async runtime")?;
    let card = runtime.block_on(generator.generate(
        &record,
        args.credential_type,
        args.password.as_deref(),
    ))?;

    std::fs::write(&args.out, &card.document)
        .with_context(|| format!("failed to write {}", args.out.display()))?;
    for degradation in &card.degradations {
        eprintln!("  degraded: {degradation}");
    }
    println!("  document: {} ({} bytes)", args.out.display(), card.document.len());
    Ok(0)
}

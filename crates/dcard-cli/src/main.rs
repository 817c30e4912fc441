//! # dcard CLI entry point
//!
//! Parses command-line arguments, initializes tracing, and dispatches to the
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dcard_cli::card::{run_card, CardArgs};
use dcard_cli::code::{run_code, CodeArgs};
use dcard_cli::keygen::{run_keygen, KeygenArgs};
use dcard_cli::verify::{run_verify, VerifyArgs};

/// Digital identity card generator.
///
/// Builds signed card documents from decrypted identity records, with an
/// Ed25519-signed QR code embedding the subject block and a face thumbnail.
#[derive(Parser, Debug)]
#[command(name = "dcard", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Card configuration file (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate the optical-code signing key.
    Keygen(KeygenArgs),

    /// Produce the signed QR code for one record without remote services.
    Code(CodeArgs),

    /// Verify an optical-code payload against a public key.
    Verify(VerifyArgs),

    /// Generate a signed card document through the remote services.
    Card(CardArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let result = match &cli.command {
        Commands::Keygen(args) => run_keygen(args),
        Commands::Verify(args) => run_verify(args),
        Commands::Code(args) => {
            dcard_cli::load_config(cli.config.as_deref()).and_then(|config| run_code(args, config))
        }
        Commands::Card(args) => {
            dcard_cli::load_config(cli.config.as_deref()).and_then(|config| run_card(args, config))
        }
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

/// `RUST_LOG` wins over `-v` when set.
fn init_tracing(verbose: u8, json: bool) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

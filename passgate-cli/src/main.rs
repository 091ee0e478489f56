//! Passgate CLI - offline WebAuthn ceremony tooling.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use passgate_core::{CeremonyType, TokenBindingPolicy, DEFAULT_CHALLENGE_LEN};
use tracing_subscriber::EnvFilter;
use url::Url;

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;

const AFTER_HELP: &str = "Exit codes:
  0   Success
  1   General error
  64  Usage error (invalid arguments or settings)
  65  Verification failed (malformed or rejected response)
  66  Input file not readable
  69  Entropy source unavailable";

#[derive(Parser)]
#[command(name = "passgate")]
#[command(author, version, about = "WebAuthn relying party ceremony tooling", long_about = None)]
#[command(after_help = AFTER_HELP)]
struct Cli {
    /// Only print machine-readable output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Ceremony the client data is checked against
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CeremonyArg {
    /// navigator.credentials.get (webauthn.get)
    Get,
    /// navigator.credentials.create (webauthn.create)
    Create,
}

impl From<CeremonyArg> for CeremonyType {
    fn from(arg: CeremonyArg) -> Self {
        match arg {
            CeremonyArg::Get => CeremonyType::Assert,
            CeremonyArg::Create => CeremonyType::Create,
        }
    }
}

/// Shape of a PublicKeyCredential response document
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ResponseKind {
    Assertion,
    Registration,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate random ceremony challenges (base64url, one per line)
    Challenge {
        /// Challenge length in bytes (minimum 16)
        #[arg(short, long, default_value_t = DEFAULT_CHALLENGE_LEN)]
        length: usize,

        /// Number of challenges to generate
        #[arg(short, long, default_value_t = 1)]
        count: usize,

        /// Use deterministic mock entropy (for testing only)
        #[arg(long)]
        mock: bool,
    },

    /// Verify a clientDataJSON document against an expected challenge and origins
    ClientData {
        /// File holding clientDataJSON (raw JSON or base64)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Challenge issued for the ceremony (base64 or base64url)
        #[arg(long)]
        challenge: String,

        /// Allowed origin; repeat for several
        #[arg(long = "origin", value_name = "URL", required = true)]
        origins: Vec<Url>,

        /// Expected ceremony
        #[arg(long, value_enum, default_value = "get")]
        ceremony: CeremonyArg,

        /// Token binding policy: optional or required
        #[arg(long, default_value = "optional")]
        token_binding: TokenBindingPolicy,
    },

    /// Decode a PublicKeyCredential response document
    Inspect {
        /// File holding the credential JSON posted by the browser
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Response shape
        #[arg(short, long, value_enum)]
        kind: ResponseKind,

        /// Print the decoded summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version come through here too
            let code = if err.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    let default_level = if cli.quiet { "error" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let quiet = cli.quiet;
    let result = match cli.command {
        Commands::Challenge {
            length,
            count,
            mock,
        } => commands::challenge::execute(length, count, mock, quiet),
        Commands::ClientData {
            file,
            challenge,
            origins,
            ceremony,
            token_binding,
        } => commands::client_data::execute(
            file,
            challenge,
            origins,
            ceremony.into(),
            token_binding,
            quiet,
        ),
        Commands::Inspect { file, kind, json } => {
            commands::inspect::execute(file, kind, json, quiet)
        }
    };

    let exit = match result {
        Ok(()) => ExitCode::success(),
        Err(err) => ExitCode::from_anyhow(&err),
    };
    if let Some(message) = exit.message {
        eprintln!("Error: {}", message);
    }
    std::process::exit(exit.code);
}

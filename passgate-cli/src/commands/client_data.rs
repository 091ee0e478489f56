//! Client data command implementation.
//!
//! Runs the same gate a relying party runs on `clientDataJSON`: ceremony
//! type, challenge, origin, token binding.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use passgate_core::{
    encoding, AllowedOrigins, CeremonyType, Challenge, ClientDataPolicy, CollectedClientData,
    ConnectionTokenBinding, TokenBindingOutcome, TokenBindingPolicy,
};
use tracing::{error, info};
use url::Url;

use crate::utils::{client_data_bytes, read_input};

/// Execute the client-data command.
pub fn execute(
    file: PathBuf,
    challenge: String,
    origins: Vec<Url>,
    ceremony: CeremonyType,
    token_binding: TokenBindingPolicy,
    quiet: bool,
) -> Result<()> {
    let raw = read_input(&file)?;
    let client_data = CollectedClientData::from_json(&client_data_bytes(&raw)?)
        .context("Invalid clientDataJSON")?;

    let Some(expected) = encoding::decode_lenient(&challenge) else {
        bail!("--challenge is not valid base64");
    };
    let expected = Challenge::from_bytes(expected);

    let policy = ClientDataPolicy {
        origins: AllowedOrigins::new(&origins)?,
        token_binding,
    };

    match client_data.verify(&expected, ceremony, &policy, &ConnectionTokenBinding::Unknown) {
        Ok(verdict) => {
            info!(
                ceremony = %ceremony,
                challenge_fp = %expected.fingerprint(),
                "Client data verified"
            );

            if !quiet {
                println!();
                println!("{}", "╔════════════════════════════════════════╗".green());
                println!("{}", "║               PASSED                   ║".green().bold());
                println!("{}", "╚════════════════════════════════════════╝".green());
                println!();
                println!("   {} {}", "Ceremony:".dimmed(), ceremony.as_str().green());
                println!("   {} {}", "Challenge:".dimmed(), "Matches".green());
                println!("   {} {}", "Origin:".dimmed(), client_data.origin);
                println!("   {} {}", "Cross-origin:".dimmed(), verdict.cross_origin);
                println!(
                    "   {} {}",
                    "Token binding:".dimmed(),
                    describe_outcome(verdict.token_binding)
                );
            }
            Ok(())
        }
        Err(e) => {
            error!(ceremony = %ceremony, code = e.code(), "Client data rejected");

            if !quiet {
                println!();
                println!("{}", "╔════════════════════════════════════════╗".red());
                println!("{}", "║               REJECTED                 ║".red().bold());
                println!("{}", "╚════════════════════════════════════════╝".red());
                println!();
                println!("   {} {}", "Code:".dimmed(), e.code().red());
                println!("   {} {}", "Reason:".dimmed(), e);
            }
            Err(anyhow::Error::new(e).context("Client data verification failed"))
        }
    }
}

fn describe_outcome(outcome: TokenBindingOutcome) -> String {
    match outcome {
        TokenBindingOutcome::NotUsed => "Not used".to_string(),
        TokenBindingOutcome::Verified => "Verified".green().to_string(),
        TokenBindingOutcome::Skipped => "Claimed, not checked (connection state unknown)".yellow().to_string(),
    }
}

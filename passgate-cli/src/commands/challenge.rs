//! Challenge command implementation.

use anyhow::Result;
use colored::Colorize;
use passgate_core::{Challenge, EntropySource, MockEntropy, OsEntropy};
use tracing::{info, warn};

/// Execute the challenge command.
///
/// Challenges go to stdout, one per line, so the output can be piped.
/// Everything else goes to stderr.
pub fn execute(length: usize, count: usize, use_mock: bool, quiet: bool) -> Result<()> {
    let source: Box<dyn EntropySource> = if use_mock {
        warn!("Using MOCK entropy (challenges are predictable!)");
        if !quiet {
            eprintln!("{}", "Using MOCK entropy (challenges are predictable!)".yellow());
        }
        Box::new(MockEntropy::default_test())
    } else {
        Box::new(OsEntropy)
    };

    if !quiet {
        eprintln!(
            "{} {} x {} bytes ({})",
            "Generating".dimmed(),
            count,
            length,
            source.source_id()
        );
    }

    for _ in 0..count {
        let challenge = Challenge::generate(source.as_ref(), length)?;
        info!(
            challenge_len = challenge.len(),
            challenge_fp = %challenge.fingerprint(),
            "Generated challenge"
        );
        println!("{}", challenge.to_base64url());
    }

    Ok(())
}

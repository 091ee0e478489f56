//! Common utility functions shared across CLI commands.

use std::path::Path;

use anyhow::{bail, Context, Result};
use passgate_core::{encoding, AuthenticatorData};
use tracing::debug;

/// Read an input file, tagging failures for exit code classification.
pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Read input");
    Ok(bytes)
}

/// Accept `clientDataJSON` either as raw JSON or as the base64 text a
/// browser response carries.
pub fn client_data_bytes(raw: &[u8]) -> Result<Vec<u8>> {
    let text = match std::str::from_utf8(raw) {
        Ok(text) => text.trim(),
        Err(_) => bail!("clientDataJSON file is not UTF-8"),
    };
    if text.starts_with('{') {
        debug!(format = "json", "Parsed client data input");
        return Ok(text.as_bytes().to_vec());
    }
    match encoding::decode_lenient(text) {
        Some(decoded) => {
            debug!(format = "base64", "Parsed client data input");
            Ok(decoded)
        }
        None => bail!("clientDataJSON file is neither JSON nor base64"),
    }
}

/// Short flag summary, e.g. `UP UV AT`.
pub fn describe_flags(auth_data: &AuthenticatorData) -> String {
    let flags = auth_data.flags;
    let names: Vec<&str> = [
        (flags.user_present(), "UP"),
        (flags.user_verified(), "UV"),
        (flags.backup_eligible(), "BE"),
        (flags.backed_up(), "BS"),
        (flags.has_attested_credential_data(), "AT"),
        (flags.has_extension_data(), "ED"),
    ]
    .into_iter()
    .filter_map(|(set, name)| set.then_some(name))
    .collect();

    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(" ")
    }
}

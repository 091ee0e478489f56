//! Inspect command implementation.
//!
//! Decodes a `PublicKeyCredential` JSON document the way the relying party
//! would, without any session: useful for debugging what a browser sent.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use passgate_core::{
    encoding, parse_assertion_response, parse_registration_response, CollectedClientData,
    ParsedCredentialAssertion, ParsedCredentialCreation,
};
use serde_json::{json, Value};
use tracing::info;

use crate::utils::{describe_flags, read_input};
use crate::ResponseKind;

/// Execute the inspect command.
pub fn execute(file: PathBuf, kind: ResponseKind, as_json: bool, quiet: bool) -> Result<()> {
    let body = read_input(&file)?;

    let summary = match kind {
        ResponseKind::Assertion => {
            let assertion = parse_assertion_response(&body).context("Malformed assertion response")?;
            info!(credential_id = %assertion.id, "Parsed assertion response");
            assertion_summary(&assertion)
        }
        ResponseKind::Registration => {
            let creation =
                parse_registration_response(&body).context("Malformed registration response")?;
            info!(
                credential_id = %creation.id,
                fmt = %creation.attestation_object.fmt,
                "Parsed registration response"
            );
            registration_summary(&creation)
        }
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if !quiet {
        print_summary(&summary);
    }
    Ok(())
}

fn client_data_summary(client_data: &CollectedClientData) -> Value {
    json!({
        "type": client_data.type_,
        "origin": client_data.origin,
        "cross_origin": client_data.cross_origin,
        "challenge_len": encoding::decode_lenient(&client_data.challenge).map(|c| c.len()),
        "token_binding": client_data.token_binding.as_ref().map(|tb| tb.status),
    })
}

fn assertion_summary(assertion: &ParsedCredentialAssertion) -> Value {
    let auth_data = &assertion.authenticator_data;
    json!({
        "kind": "assertion",
        "credential_id": assertion.id.to_base64url(),
        "authenticator_attachment": assertion.authenticator_attachment,
        "client_data": client_data_summary(&assertion.client_data),
        "rp_id_hash": hex::encode(auth_data.rp_id_hash),
        "flags": describe_flags(auth_data),
        "sign_count": auth_data.sign_count,
        "signature_len": assertion.signature.len(),
        "user_handle": assertion.user_handle.as_deref().map(encoding::encode),
    })
}

fn registration_summary(creation: &ParsedCredentialCreation) -> Value {
    let object = &creation.attestation_object;
    let auth_data = &object.auth_data;
    let attested = auth_data.attested_credential.as_ref();
    json!({
        "kind": "registration",
        "credential_id": creation.id.to_base64url(),
        "authenticator_attachment": creation.authenticator_attachment,
        "client_data": client_data_summary(&creation.client_data),
        "attestation_format": object.fmt,
        "rp_id_hash": hex::encode(auth_data.rp_id_hash),
        "flags": describe_flags(auth_data),
        "sign_count": auth_data.sign_count,
        "aaguid": attested.map(|a| hex::encode(a.aaguid)),
        "public_key_len": attested.map(|a| a.credential_public_key.len()),
        "transports": creation.transports,
    })
}

fn print_summary(summary: &Value) {
    println!();
    println!(
        "{} {}",
        "Credential response:".bold(),
        summary["kind"].as_str().unwrap_or_default().cyan()
    );
    print_fields(summary, 1);
}

fn print_fields(value: &Value, depth: usize) {
    let Some(fields) = value.as_object() else {
        return;
    };
    let indent = "   ".repeat(depth);
    for (key, field) in fields {
        match field {
            Value::Object(_) => {
                println!("{}{}", indent, format!("{}:", key).dimmed());
                print_fields(field, depth + 1);
            }
            Value::Null => println!("{}{} {}", indent, format!("{}:", key).dimmed(), "-".dimmed()),
            Value::String(text) => println!("{}{} {}", indent, format!("{}:", key).dimmed(), text),
            other => println!("{}{} {}", indent, format!("{}:", key).dimmed(), other),
        }
    }
}

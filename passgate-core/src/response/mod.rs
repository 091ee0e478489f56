//! Credential response parsing.
//!
//! The transport hands over the raw request body; the ceremony decides which
//! shape to parse it as. Parsing only checks structure (JSON shape, base64,
//! authenticator data layout, CBOR envelope). Every semantic check happens in
//! [`crate::client_data`] and [`crate::relying_party`].

pub mod attestation;
pub mod authenticator_data;

use serde::Deserialize;

use crate::client_data::{CeremonyType, CollectedClientData, ConnectionTokenBinding};
use crate::encoding;
use crate::error::{clip, describe_json_error, ParseError};
use crate::user::CredentialId;

pub use attestation::AttestationObject;
pub use authenticator_data::{AttestedCredentialData, AuthenticatorData, AuthenticatorFlags};

/// Transport payload of a finish request.
#[derive(Debug, Clone)]
pub struct RawRequest<'a> {
    pub body: &'a [u8],
    /// What the TLS layer knows about token binding on this connection.
    pub token_binding: ConnectionTokenBinding,
}

impl<'a> RawRequest<'a> {
    pub fn new(body: &'a [u8]) -> Self {
        Self {
            body,
            token_binding: ConnectionTokenBinding::Unknown,
        }
    }

    pub fn with_token_binding(mut self, token_binding: ConnectionTokenBinding) -> Self {
        self.token_binding = token_binding;
        self
    }
}

impl<'a> From<&'a [u8]> for RawRequest<'a> {
    fn from(body: &'a [u8]) -> Self {
        Self::new(body)
    }
}

/// Parsed assertion (`navigator.credentials.get`) response.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCredentialAssertion {
    pub id: CredentialId,
    pub authenticator_attachment: Option<String>,
    pub client_data: CollectedClientData,
    /// Decoded `clientDataJSON`, kept verbatim for signature verification.
    pub client_data_json: Vec<u8>,
    pub authenticator_data: AuthenticatorData,
    pub raw_authenticator_data: Vec<u8>,
    pub signature: Vec<u8>,
    pub user_handle: Option<Vec<u8>>,
}

/// Parsed attestation (`navigator.credentials.create`) response.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCredentialCreation {
    pub id: CredentialId,
    pub authenticator_attachment: Option<String>,
    pub client_data: CollectedClientData,
    pub client_data_json: Vec<u8>,
    pub attestation_object: AttestationObject,
    pub transports: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CredentialResponse {
    Registration(ParsedCredentialCreation),
    Assertion(ParsedCredentialAssertion),
}

impl CredentialResponse {
    pub fn client_data(&self) -> &CollectedClientData {
        match self {
            Self::Registration(r) => &r.client_data,
            Self::Assertion(a) => &a.client_data,
        }
    }

    pub fn ceremony(&self) -> CeremonyType {
        match self {
            Self::Registration(_) => CeremonyType::Create,
            Self::Assertion(_) => CeremonyType::Assert,
        }
    }
}

/// Parse `request` as the response shape belonging to `ceremony`.
pub fn parse_response(request: &RawRequest<'_>, ceremony: CeremonyType) -> Result<CredentialResponse, ParseError> {
    match ceremony {
        CeremonyType::Create => parse_registration_response(request.body).map(CredentialResponse::Registration),
        CeremonyType::Assert => parse_assertion_response(request.body).map(CredentialResponse::Assertion),
    }
}

// ==================== Wire shapes ====================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialEnvelope<R> {
    id: String,
    raw_id: String,
    #[serde(rename = "type")]
    type_: String,
    response: R,
    #[serde(default)]
    authenticator_attachment: Option<String>,
}

#[derive(Deserialize)]
struct AssertionWire {
    #[serde(rename = "clientDataJSON")]
    client_data_json: String,
    #[serde(rename = "authenticatorData")]
    authenticator_data: String,
    signature: String,
    #[serde(default, rename = "userHandle")]
    user_handle: Option<String>,
}

#[derive(Deserialize)]
struct AttestationWire {
    #[serde(rename = "clientDataJSON")]
    client_data_json: String,
    #[serde(rename = "attestationObject")]
    attestation_object: String,
    #[serde(default)]
    transports: Vec<String>,
}

fn decode_field(value: &str, field: &'static str) -> Result<Vec<u8>, ParseError> {
    encoding::decode_lenient(value).ok_or(ParseError::InvalidEncoding(field))
}

fn parse_envelope<'de, R: Deserialize<'de>>(
    body: &'de [u8],
) -> Result<(CredentialEnvelope<R>, CredentialId), ParseError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ParseError::EmptyBody);
    }
    let envelope: CredentialEnvelope<R> =
        serde_json::from_slice(body).map_err(|e| ParseError::InvalidJson(describe_json_error(&e)))?;

    if envelope.type_ != "public-key" {
        return Err(ParseError::UnsupportedCredentialType(clip(&envelope.type_)));
    }
    let raw_id = decode_field(&envelope.raw_id, "rawId")?;
    let id = decode_field(&envelope.id, "id")?;
    if raw_id.is_empty() {
        return Err(ParseError::InvalidEncoding("rawId"));
    }
    if id != raw_id {
        return Err(ParseError::IdMismatch);
    }
    Ok((envelope, CredentialId::new(raw_id)))
}

fn parse_client_data(encoded: &str) -> Result<(CollectedClientData, Vec<u8>), ParseError> {
    let json = decode_field(encoded, "response.clientDataJSON")?;
    let client_data = CollectedClientData::from_json(&json)?;
    Ok((client_data, json))
}

/// Parse an assertion response body.
pub fn parse_assertion_response(body: &[u8]) -> Result<ParsedCredentialAssertion, ParseError> {
    let (envelope, id) = parse_envelope::<AssertionWire>(body)?;
    let response = envelope.response;

    let (client_data, client_data_json) = parse_client_data(&response.client_data_json)?;
    let raw_authenticator_data = decode_field(&response.authenticator_data, "response.authenticatorData")?;
    let authenticator_data = AuthenticatorData::from_bytes(&raw_authenticator_data)?;
    let signature = decode_field(&response.signature, "response.signature")?;
    let user_handle = match response.user_handle.as_deref() {
        None | Some("") => None,
        Some(handle) => Some(decode_field(handle, "response.userHandle")?),
    };

    Ok(ParsedCredentialAssertion {
        id,
        authenticator_attachment: envelope.authenticator_attachment,
        client_data,
        client_data_json,
        authenticator_data,
        raw_authenticator_data,
        signature,
        user_handle,
    })
}

/// Parse a registration response body.
pub fn parse_registration_response(body: &[u8]) -> Result<ParsedCredentialCreation, ParseError> {
    let (envelope, id) = parse_envelope::<AttestationWire>(body)?;
    let response = envelope.response;

    let (client_data, client_data_json) = parse_client_data(&response.client_data_json)?;
    let attestation_bytes = decode_field(&response.attestation_object, "response.attestationObject")?;
    let attestation_object = AttestationObject::from_cbor(&attestation_bytes)?;

    Ok(ParsedCredentialCreation {
        id,
        authenticator_attachment: envelope.authenticator_attachment,
        client_data,
        client_data_json,
        attestation_object,
        transports: response.transports,
    })
}

//! End-to-end ceremony tests.
//!
//! These tests drive a relying party the way a transport adapter would:
//! begin a ceremony, hand the options to a simulated browser, then feed the
//! browser's JSON back through the finish operation.

use std::sync::Arc;

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use ciborium::Value;
use passgate_core::{
    CeremonyError, ConnectionTokenBinding, CredentialDescriptor, LoginOptions, MockEntropy, RawRequest,
    RegistrationOptions, RelyingParty, TokenBindingOutcome, TokenBindingPolicy, User, VerificationError,
};
use serde_json::json;

const ORIGIN: &str = "https://login.example.com";

/// Credential id used by the simulated authenticator.
const CREDENTIAL_ID: [u8; 4] = [0xC0, 0xFF, 0xEE, 0x01];

struct Account {
    id: Vec<u8>,
    credentials: Vec<CredentialDescriptor>,
}

impl User for Account {
    fn webauthn_id(&self) -> &[u8] {
        &self.id
    }

    fn webauthn_name(&self) -> &str {
        "alice@example.com"
    }

    fn webauthn_display_name(&self) -> &str {
        "Alice"
    }

    fn webauthn_credentials(&self) -> Vec<CredentialDescriptor> {
        self.credentials.clone()
    }
}

fn alice() -> Account {
    Account {
        id: b"user-alice".to_vec(),
        credentials: vec![CredentialDescriptor::new(CREDENTIAL_ID.to_vec())],
    }
}

fn relying_party() -> RelyingParty {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    RelyingParty::builder("example.com", [ORIGIN])
        .entropy_source(Arc::new(MockEntropy::default_test()))
        .build()
        .unwrap()
}

/// Authenticator data with the given flags and no attested credential.
fn assertion_auth_data(flags: u8) -> Vec<u8> {
    let mut data = vec![0xA5; 32];
    data.push(flags);
    data.extend_from_slice(&12u32.to_be_bytes());
    data
}

/// Build the JSON a browser would post after `navigator.credentials.*`.
fn browser_response(type_: &str, challenge: &str, origin: &str, response: serde_json::Value) -> Vec<u8> {
    let client_data = json!({
        "type": type_,
        "challenge": challenge,
        "origin": origin,
        "crossOrigin": false,
    });
    let mut response = response;
    response["clientDataJSON"] = json!(URL_SAFE_NO_PAD.encode(client_data.to_string()));

    json!({
        "id": URL_SAFE_NO_PAD.encode(CREDENTIAL_ID),
        "rawId": URL_SAFE_NO_PAD.encode(CREDENTIAL_ID),
        "type": "public-key",
        "response": response,
        "clientExtensionResults": {},
    })
    .to_string()
    .into_bytes()
}

fn assertion_body(type_: &str, challenge: &str, origin: &str) -> Vec<u8> {
    browser_response(
        type_,
        challenge,
        origin,
        json!({
            "authenticatorData": URL_SAFE_NO_PAD.encode(assertion_auth_data(0x05)),
            "signature": URL_SAFE_NO_PAD.encode([0x30, 0x45, 0x02, 0x21]),
            "userHandle": URL_SAFE_NO_PAD.encode(b"user-alice"),
        }),
    )
}

fn attestation_object() -> Vec<u8> {
    let mut auth_data = vec![0xA5; 32];
    auth_data.push(0x45);
    auth_data.extend_from_slice(&0u32.to_be_bytes());
    auth_data.extend_from_slice(&[0x11; 16]);
    auth_data.extend_from_slice(&(CREDENTIAL_ID.len() as u16).to_be_bytes());
    auth_data.extend_from_slice(&CREDENTIAL_ID);
    // COSE_Key {1: 2, 3: -7}
    auth_data.extend_from_slice(&[0xA2, 0x01, 0x02, 0x03, 0x26]);

    let object = Value::Map(vec![
        (Value::Text("fmt".into()), Value::Text("none".into())),
        (Value::Text("attStmt".into()), Value::Map(Vec::new())),
        (Value::Text("authData".into()), Value::Bytes(auth_data)),
    ]);
    let mut out = Vec::new();
    ciborium::ser::into_writer(&object, &mut out).unwrap();
    out
}

#[test]
fn test_forged_create_response_rejected_then_real_login_passes() {
    let rp = relying_party();
    let user = alice();

    // A replayed registration response must not satisfy a login.
    let (options, session) = rp.begin_login(&user, LoginOptions::new()).unwrap();
    let forged = assertion_body("webauthn.create", &options.challenge.to_base64url(), ORIGIN);
    let err = rp
        .finish_login(&user, session, &RawRequest::new(&forged))
        .unwrap_err();
    assert!(matches!(
        err,
        CeremonyError::Verification(VerificationError::TypeMismatch { .. })
    ));

    // The session is gone; a fresh ceremony is needed.
    let (options, session) = rp.begin_login(&user, LoginOptions::new()).unwrap();
    let body = assertion_body("webauthn.get", &options.challenge.to_base64url(), ORIGIN);
    let verified = rp.finish_login(&user, session, &RawRequest::new(&body)).unwrap();

    assert_eq!(verified.user_id, b"user-alice");
    assert_eq!(verified.response.id.as_bytes(), &CREDENTIAL_ID);
    assert_eq!(verified.response.authenticator_data.sign_count, 12);
    assert_eq!(verified.client_data.token_binding, TokenBindingOutcome::NotUsed);
}

#[test]
fn test_stale_challenge_from_previous_ceremony_rejected() {
    let rp = relying_party();
    let user = alice();

    let (first, _abandoned) = rp.begin_login(&user, LoginOptions::new()).unwrap();
    let (_, session) = rp.begin_login(&user, LoginOptions::new()).unwrap();

    let body = assertion_body("webauthn.get", &first.challenge.to_base64url(), ORIGIN);
    let err = rp.finish_login(&user, session, &RawRequest::new(&body)).unwrap_err();
    assert_eq!(err.code(), "CHALLENGE_MISMATCH");
}

#[test]
fn test_standard_alphabet_challenge_accepted() {
    let rp = relying_party();
    let user = alice();

    let (options, session) = rp.begin_login(&user, LoginOptions::new()).unwrap();
    let padded = STANDARD.encode(options.challenge.as_bytes());
    let body = assertion_body("webauthn.get", &padded, ORIGIN);

    assert!(rp.finish_login(&user, session, &RawRequest::new(&body)).is_ok());
}

#[test]
fn test_origin_path_ignored_host_enforced() {
    let rp = relying_party();
    let user = alice();

    let (options, session) = rp.begin_login(&user, LoginOptions::new()).unwrap();
    let body = assertion_body(
        "webauthn.get",
        &options.challenge.to_base64url(),
        "https://login.example.com/signin?next=%2F",
    );
    assert!(rp.finish_login(&user, session, &RawRequest::new(&body)).is_ok());

    let (options, session) = rp.begin_login(&user, LoginOptions::new()).unwrap();
    let body = assertion_body(
        "webauthn.get",
        &options.challenge.to_base64url(),
        "https://login.example.com.attacker.test",
    );
    let err = rp.finish_login(&user, session, &RawRequest::new(&body)).unwrap_err();
    assert_eq!(err.code(), "ORIGIN_MISMATCH");
}

#[test]
fn test_user_mismatch_fires_before_body_is_read() {
    let rp = relying_party();
    let (_, session) = rp.begin_login(&alice(), LoginOptions::new()).unwrap();
    let bob = Account {
        id: b"user-bob".to_vec(),
        credentials: Vec::new(),
    };

    let err = rp
        .finish_login(&bob, session, &RawRequest::new(b"\x00 not json"))
        .unwrap_err();
    assert_eq!(err.code(), "USER_MISMATCH");
}

#[test]
fn test_required_token_binding_needs_known_connection() {
    let rp = RelyingParty::builder("example.com", [ORIGIN])
        .entropy_source(Arc::new(MockEntropy::new(7)))
        .token_binding(TokenBindingPolicy::Required)
        .build()
        .unwrap();
    let user = alice();

    let (options, session) = rp.begin_login(&user, LoginOptions::new()).unwrap();
    let body = assertion_body("webauthn.get", &options.challenge.to_base64url(), ORIGIN);
    let err = rp.finish_login(&user, session, &RawRequest::new(&body)).unwrap_err();
    assert_eq!(err.code(), "TOKEN_BINDING_UNVERIFIABLE");

    let (options, session) = rp.begin_login(&user, LoginOptions::new()).unwrap();
    let body = assertion_body("webauthn.get", &options.challenge.to_base64url(), ORIGIN);
    let request = RawRequest::new(&body).with_token_binding(ConnectionTokenBinding::NotSupported);
    let verified = rp.finish_login(&user, session, &request).unwrap();
    assert_eq!(verified.client_data.token_binding, TokenBindingOutcome::NotUsed);
}

#[test]
fn test_registration_round_trip() {
    let rp = relying_party();
    let newcomer = Account {
        id: b"user-carol".to_vec(),
        credentials: Vec::new(),
    };

    let (options, session) = rp.begin_registration(&newcomer, RegistrationOptions::new()).unwrap();
    let options_json = serde_json::to_value(&options).unwrap();
    assert_eq!(options_json["rp"]["id"], "example.com");
    assert_eq!(options_json["user"]["displayName"], "Alice");
    assert_eq!(options_json["pubKeyCredParams"][0]["alg"], -7);

    let body = browser_response(
        "webauthn.create",
        &options.challenge.to_base64url(),
        ORIGIN,
        json!({
            "attestationObject": URL_SAFE_NO_PAD.encode(attestation_object()),
            "transports": ["internal"],
        }),
    );
    let verified = rp
        .finish_registration(&newcomer, session, &RawRequest::new(&body))
        .unwrap();

    assert_eq!(verified.response.attestation_object.fmt, "none");
    assert_eq!(verified.response.transports, vec!["internal"]);
    assert_eq!(verified.user_id, b"user-carol");
}

#[test]
fn test_login_response_cannot_complete_registration() {
    let rp = relying_party();
    let user = alice();

    let (options, session) = rp.begin_registration(&user, RegistrationOptions::new()).unwrap();
    let body = browser_response(
        "webauthn.get",
        &options.challenge.to_base64url(),
        ORIGIN,
        json!({ "attestationObject": URL_SAFE_NO_PAD.encode(attestation_object()) }),
    );
    let err = rp
        .finish_registration(&user, session, &RawRequest::new(&body))
        .unwrap_err();
    assert_eq!(err.code(), "TYPE_MISMATCH");
}

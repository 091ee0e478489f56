//! WebAuthn HTTP endpoint handlers
//!
//! Implements the registration and authentication ceremonies. Start handlers
//! store the session and return its id; finish handlers take the session out
//! of the store before running any check, so a session id works once.

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use std::sync::Arc;

use passgate_core::{
    CeremonyType, CredentialDescriptor, LoginOptions, RawRequest, RegistrationOptions, TokenBindingOutcome,
};

use super::types::{
    AuthenticationSummary, RegistrationSummary, StartAuthenticationRequest, StartAuthenticationResponse,
    StartRegistrationRequest, StartRegistrationResponse, SESSION_HEADER,
};
use crate::error::ApiError;
use crate::state::AppState;

/// Maximum accepted username length in characters
const MAX_USERNAME_LEN: usize = 64;

/// POST /webauthn/register/start
///
/// Start a registration ceremony. Unknown usernames are created; a user that
/// already has a credential is refused, since there is no signed-in flow for
/// adding another authenticator.
/// Returns the creation options for `navigator.credentials.create`.
#[utoipa::path(
    post,
    path = "/webauthn/register/start",
    tag = "WebAuthn",
    request_body = StartRegistrationRequest,
    responses(
        (status = 200, description = "Registration challenge created (JSON with session_id and public_key options)"),
        (status = 400, description = "Invalid username"),
        (status = 409, description = "User already has a registered credential"),
        (status = 503, description = "Challenge generation unavailable")
    )
)]
pub async fn start_registration(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartRegistrationRequest>,
) -> Result<Json<StartRegistrationResponse>, ApiError> {
    let username = validate_username(&req.username)?;
    let display_name = req.display_name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let user = state.users.get_or_create(username, display_name);
    if !user.credentials.is_empty() {
        return Err(ApiError::conflict("User already has a registered credential"));
    }

    let (public_key, session) = state
        .relying_party
        .begin_registration(&user, RegistrationOptions::new())?;
    let session_id = state.sessions.store_registration(user.username.clone(), session);

    tracing::info!(
        session_id = %session_id,
        ceremony = %CeremonyType::Create,
        challenge_len = public_key.challenge.len(),
        challenge_fp = %public_key.challenge.fingerprint(),
        "WebAuthn registration started"
    );

    Ok(Json(StartRegistrationResponse {
        session_id,
        public_key,
    }))
}

/// POST /webauthn/register/finish
///
/// Complete registration with the browser's `PublicKeyCredential` JSON.
/// The session id from `register/start` goes in the `x-passgate-session` header.
#[utoipa::path(
    post,
    path = "/webauthn/register/finish",
    tag = "WebAuthn",
    params(
        ("x-passgate-session" = String, Header, description = "Session id from register/start")
    ),
    request_body(content_type = "application/json", description = "PublicKeyCredential from navigator.credentials.create"),
    responses(
        (status = 200, description = "Registration ceremony passed", body = RegistrationSummary),
        (status = 400, description = "Malformed response or invalid session"),
        (status = 403, description = "Ceremony verification failed"),
        (status = 409, description = "Credential already registered")
    )
)]
pub async fn finish_registration(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RegistrationSummary>, ApiError> {
    let session_id = session_id(&headers)?;
    let (session, username) = state
        .sessions
        .take_registration(session_id)
        .ok_or_else(|| ApiError::invalid_session("Invalid or expired session"))?;
    let user = state
        .users
        .get(&username)
        .ok_or_else(|| ApiError::not_found("User no longer exists"))?;

    let verified = state
        .relying_party
        .finish_registration(&user, session, &RawRequest::new(&body))?;
    let creation = verified.response;
    let auth_data = &creation.attestation_object.auth_data;

    let descriptor = CredentialDescriptor::new(creation.id.clone()).with_transports(creation.transports.clone());
    if !state.users.add_credential(&username, descriptor) {
        return Err(ApiError::conflict("Credential is already registered"));
    }

    let aaguid = auth_data
        .attested_credential
        .as_ref()
        .map(|attested| uuid::Uuid::from_bytes(attested.aaguid))
        .unwrap_or_default();

    tracing::info!(
        session_id = %session_id,
        credential_id = %creation.id,
        fmt = %creation.attestation_object.fmt,
        "WebAuthn registration completed"
    );

    Ok(Json(RegistrationSummary {
        username,
        credential_id: creation.id.to_base64url(),
        attestation_format: creation.attestation_object.fmt.clone(),
        aaguid: aaguid.to_string(),
        sign_count: auth_data.sign_count,
        user_verified: auth_data.flags.user_verified(),
        backup_eligible: auth_data.flags.backup_eligible(),
        transports: creation.transports.clone(),
        token_binding: outcome_label(verified.client_data.token_binding),
        attestation_verified: false,
    }))
}

/// POST /webauthn/login/start
///
/// Start an authentication ceremony for a registered user.
/// Returns the request options for `navigator.credentials.get`.
#[utoipa::path(
    post,
    path = "/webauthn/login/start",
    tag = "WebAuthn",
    request_body = StartAuthenticationRequest,
    responses(
        (status = 200, description = "Authentication challenge created (JSON with session_id and public_key options)"),
        (status = 404, description = "Unknown user or no registered credentials"),
        (status = 503, description = "Challenge generation unavailable")
    )
)]
pub async fn start_authentication(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartAuthenticationRequest>,
) -> Result<Json<StartAuthenticationResponse>, ApiError> {
    let username = validate_username(&req.username)?;
    let user = state
        .users
        .get(username)
        .filter(|user| !user.credentials.is_empty())
        .ok_or_else(|| ApiError::not_found("No credentials registered for user"))?;

    let (public_key, session) = state.relying_party.begin_login(&user, LoginOptions::new())?;
    let session_id = state.sessions.store_authentication(user.username.clone(), session);

    tracing::info!(
        session_id = %session_id,
        ceremony = %CeremonyType::Assert,
        challenge_len = public_key.challenge.len(),
        challenge_fp = %public_key.challenge.fingerprint(),
        "WebAuthn authentication started"
    );

    Ok(Json(StartAuthenticationResponse {
        session_id,
        public_key,
    }))
}

/// POST /webauthn/login/finish
///
/// Complete authentication with the browser's `PublicKeyCredential` JSON.
/// The assertion signature is not checked here; see `signature_verified`.
#[utoipa::path(
    post,
    path = "/webauthn/login/finish",
    tag = "WebAuthn",
    params(
        ("x-passgate-session" = String, Header, description = "Session id from login/start")
    ),
    request_body(content_type = "application/json", description = "PublicKeyCredential from navigator.credentials.get"),
    responses(
        (status = 200, description = "Authentication ceremony passed", body = AuthenticationSummary),
        (status = 400, description = "Malformed response or invalid session"),
        (status = 403, description = "Ceremony verification failed")
    )
)]
pub async fn finish_authentication(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AuthenticationSummary>, ApiError> {
    let session_id = session_id(&headers)?;
    let (session, username) = state
        .sessions
        .take_authentication(session_id)
        .ok_or_else(|| ApiError::invalid_session("Invalid or expired session"))?;
    let user = state
        .users
        .get(&username)
        .ok_or_else(|| ApiError::not_found("User no longer exists"))?;

    let verified = state
        .relying_party
        .finish_login(&user, session, &RawRequest::new(&body))?;
    let assertion = &verified.response;
    let flags = assertion.authenticator_data.flags;

    tracing::info!(
        session_id = %session_id,
        credential_id = %assertion.id,
        sign_count = assertion.authenticator_data.sign_count,
        "WebAuthn authentication completed"
    );

    Ok(Json(AuthenticationSummary {
        username,
        credential_id: assertion.id.to_base64url(),
        sign_count: assertion.authenticator_data.sign_count,
        user_verified: flags.user_verified(),
        backed_up: flags.backed_up(),
        cross_origin: verified.client_data.cross_origin,
        token_binding: outcome_label(verified.client_data.token_binding),
        signature_verified: false,
    }))
}

fn validate_username(raw: &str) -> Result<&str, ApiError> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(ApiError::bad_request("username must not be empty"));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(ApiError::bad_request(format!(
            "username exceeds {} characters",
            MAX_USERNAME_LEN
        )));
    }
    Ok(username)
}

fn session_id(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::invalid_session(format!("missing {} header", SESSION_HEADER)))
}

fn outcome_label(outcome: TokenBindingOutcome) -> String {
    match outcome {
        TokenBindingOutcome::NotUsed => "not_used",
        TokenBindingOutcome::Verified => "verified",
        TokenBindingOutcome::Skipped => "skipped",
    }
    .to_string()
}

//! WebAuthn request/response types
//!
//! Defines the data structures for WebAuthn API communication.

use passgate_core::{PublicKeyCredentialCreationOptions, PublicKeyCredentialRequestOptions};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Header carrying the ceremony session id between start and finish
pub const SESSION_HEADER: &str = "x-passgate-session";

/// Request to start registration
#[derive(Debug, Deserialize, ToSchema)]
pub struct StartRegistrationRequest {
    /// Account name; created on first registration
    #[schema(example = "alice@example.com")]
    pub username: String,
    /// Optional human-readable name shown by the authenticator
    #[schema(example = "Alice")]
    pub display_name: Option<String>,
}

/// Response containing the registration challenge
#[derive(Debug, Serialize)]
pub struct StartRegistrationResponse {
    /// Session id to send back in the `x-passgate-session` header
    pub session_id: String,
    /// Options for navigator.credentials.create
    pub public_key: PublicKeyCredentialCreationOptions,
}

/// Request to start authentication
#[derive(Debug, Deserialize, ToSchema)]
pub struct StartAuthenticationRequest {
    /// Registered account name
    #[schema(example = "alice@example.com")]
    pub username: String,
}

/// Response containing the authentication challenge
#[derive(Debug, Serialize)]
pub struct StartAuthenticationResponse {
    /// Session id to send back in the `x-passgate-session` header
    pub session_id: String,
    /// Options for navigator.credentials.get
    pub public_key: PublicKeyCredentialRequestOptions,
}

/// Outcome of a completed registration ceremony
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegistrationSummary {
    #[schema(example = "alice@example.com")]
    pub username: String,
    /// New credential id (base64url)
    #[schema(example = "wP_uAQ")]
    pub credential_id: String,
    /// Attestation statement format reported by the authenticator
    #[schema(example = "none")]
    pub attestation_format: String,
    /// AAGUID of the authenticator
    #[schema(example = "00000000-0000-0000-0000-000000000000")]
    pub aaguid: String,
    pub sign_count: u32,
    pub user_verified: bool,
    pub backup_eligible: bool,
    pub transports: Vec<String>,
    /// Token binding outcome: not_used, verified or skipped
    #[schema(example = "not_used")]
    pub token_binding: String,
    /// Always false: attestation statements are checked by an external verifier
    pub attestation_verified: bool,
}

/// Outcome of a completed authentication ceremony
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticationSummary {
    #[schema(example = "alice@example.com")]
    pub username: String,
    /// Credential id that answered the challenge (base64url)
    #[schema(example = "wP_uAQ")]
    pub credential_id: String,
    #[schema(example = 42)]
    pub sign_count: u32,
    pub user_verified: bool,
    pub backed_up: bool,
    pub cross_origin: bool,
    /// Token binding outcome: not_used, verified or skipped
    #[schema(example = "skipped")]
    pub token_binding: String,
    /// Always false: assertion signatures are checked by an external verifier
    pub signature_verified: bool,
}

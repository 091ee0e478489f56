//! Passgate Core - WebAuthn Relying Party ceremony verification
//!
//! This crate issues ceremony challenges, binds them to a user session and
//! checks the client's response before any credential is trusted.
//!
//! # Features
//!
//! - CSPRNG challenges, zeroized on drop and never logged
//! - Single-use ceremony sessions
//! - Client data verification: type, challenge (constant time), origin, token binding
//! - Structural parsing of assertion and registration responses
//!
//! Signature and attestation statement verification are left to the caller.
//!
//! # Example
//!
//! ```no_run
//! use passgate_core::{LoginOptions, RawRequest, RelyingParty, User};
//!
//! struct Account {
//!     id: Vec<u8>,
//! }
//!
//! impl User for Account {
//!     fn webauthn_id(&self) -> &[u8] {
//!         &self.id
//!     }
//!
//!     fn webauthn_name(&self) -> &str {
//!         "alice"
//!     }
//! }
//!
//! # fn example(body: &[u8]) -> passgate_core::Result<()> {
//! let rp = RelyingParty::builder("example.com", ["https://example.com"]).build()?;
//! let account = Account { id: b"user-1".to_vec() };
//!
//! // Send `options` to the browser, keep `session` server side
//! let (options, session) = rp.begin_login(&account, LoginOptions::new())?;
//!
//! // Later, with the browser's response body
//! let verified = rp.finish_login(&account, session, &RawRequest::new(body))?;
//! println!("credential {} passed", verified.response.id);
//! # Ok(())
//! # }
//! ```

pub mod challenge;
pub mod client_data;
pub mod config;
pub mod encoding;
pub mod entropy;
pub mod error;
pub mod options;
pub mod relying_party;
pub mod response;
pub mod session;
pub mod user;

// Re-export main types for convenience
pub use challenge::{create_challenge, Challenge, DEFAULT_CHALLENGE_LEN};
pub use client_data::{
    AllowedOrigins, CeremonyType, ClientDataPolicy, ClientDataVerdict, CollectedClientData, ConnectionTokenBinding,
    TokenBinding, TokenBindingOutcome, TokenBindingPolicy, TokenBindingStatus,
};
pub use config::{RelyingPartyBuilder, RelyingPartyConfig, RelyingPartySettings, DEFAULT_TIMEOUT};
pub use entropy::{EntropySource, EntropySourceId, MockEntropy, OsEntropy};
pub use error::{CeremonyError, ConfigError, ParseError, Result, VerificationError, MIN_CHALLENGE_LEN};
pub use options::{
    AttestationConveyance, AuthenticatorSelection, LoginOptions, PublicKeyCredentialCreationOptions,
    PublicKeyCredentialRequestOptions, RegistrationOptions, ResidentKeyRequirement, UserVerificationRequirement,
};
pub use relying_party::{RelyingParty, VerifiedResponse};
pub use response::{
    parse_assertion_response, parse_registration_response, parse_response, AuthenticatorData, CredentialResponse,
    ParsedCredentialAssertion, ParsedCredentialCreation, RawRequest,
};
pub use session::SessionData;
pub use user::{CredentialDescriptor, CredentialId, User};

//! WebAuthn ceremony endpoints for Passgate
//!
//! This module is the transport adapter around `passgate_core::RelyingParty`.
//!
//! ## Architecture
//!
//! - `handlers`: HTTP endpoint handlers for registration/authentication
//! - `storage`: in-memory ceremony session store (single use, expiring)
//! - `users`: in-memory user directory for the demo server
//! - `types`: Request/response types for the WebAuthn API

pub mod handlers;
pub mod storage;
mod types;
pub mod users;

pub use handlers::{finish_authentication, finish_registration, start_authentication, start_registration};
pub use storage::{MemorySessionStore, PendingCeremony};
pub use types::{
    AuthenticationSummary, RegistrationSummary, StartAuthenticationRequest, StartAuthenticationResponse,
    StartRegistrationRequest, StartRegistrationResponse, SESSION_HEADER,
};
pub use users::{DirectoryUser, UserDirectory};

//! Passgate Server Library - HTTP transport for WebAuthn ceremony verification
//!
//! This library exposes the server components for use in integration tests.
//! The main binary uses these same components.

pub mod config;
pub mod error;
pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod webauthn;

pub use config::Config;
pub use error::ApiError;
pub use openapi::ApiDoc;
pub use routes::{create_router, create_router_with_state};
pub use state::AppState;
pub use webauthn::{DirectoryUser, MemorySessionStore, UserDirectory, SESSION_HEADER};

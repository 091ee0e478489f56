//! HTTP request handlers
//!
//! Service-level handlers. Ceremony endpoints live in [`crate::webauthn`].

pub mod health;

pub use crate::state::AppState;
pub use health::{health, ready, HealthResponse, ReadyResponse};

//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use passgate_core::{ConfigError, RelyingParty};

use crate::webauthn::{MemorySessionStore, UserDirectory};

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Relying party running every ceremony
    pub relying_party: Arc<RelyingParty>,
    /// Pending ceremony sessions, single use
    pub sessions: Arc<MemorySessionStore>,
    /// Known users and their registered credentials
    pub users: Arc<UserDirectory>,
}

impl AppState {
    /// Create state with in-memory sessions and users
    pub fn in_memory(relying_party: RelyingParty) -> Self {
        tracing::warn!("Using in-memory sessions and users - everything is lost on restart!");
        let sessions = MemorySessionStore::new(relying_party.config().timeout);
        Self {
            relying_party: Arc::new(relying_party),
            sessions: Arc::new(sessions),
            users: Arc::new(UserDirectory::new()),
        }
    }

    /// Local development relying party: `localhost` served from `http://localhost:3000`
    pub fn development() -> Result<Self, ConfigError> {
        let relying_party = RelyingParty::builder("localhost", ["http://localhost:3000"]).build()?;
        Ok(Self::in_memory(relying_party))
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("relying_party", &self.relying_party)
            .field("sessions", &self.sessions)
            .field("users", &self.users.len())
            .finish()
    }
}

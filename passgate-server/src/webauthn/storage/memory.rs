//! In-memory storage for ceremony sessions
//!
//! Sessions expire after the relying party's advertised ceremony timeout.
//! Expired entries are rejected on `take_*` and removed by `cleanup_expired`.

use dashmap::DashMap;
use passgate_core::SessionData;
use std::time::{Duration, Instant};

/// Session entry with expiration
pub struct PendingCeremony {
    pub session: SessionData,
    pub username: String,
    pub expires_at: Instant,
}

/// In-memory storage for pending ceremony sessions
pub struct MemorySessionStore {
    /// How long a session stays valid after it is stored
    expiry: Duration,
    /// Pending registration ceremonies (session_id -> entry)
    registration_sessions: DashMap<String, PendingCeremony>,
    /// Pending authentication ceremonies (session_id -> entry)
    authentication_sessions: DashMap<String, PendingCeremony>,
}

impl MemorySessionStore {
    /// Create a new session store
    pub fn new(expiry: Duration) -> Self {
        Self {
            expiry,
            registration_sessions: DashMap::new(),
            authentication_sessions: DashMap::new(),
        }
    }

    fn entry(&self, username: String, session: SessionData) -> PendingCeremony {
        PendingCeremony {
            session,
            username,
            expires_at: Instant::now() + self.expiry,
        }
    }

    /// Store a registration session, returning its opaque id
    pub fn store_registration(&self, username: String, session: SessionData) -> String {
        let session_id = uuid::Uuid::new_v4().to_string();
        self.registration_sessions
            .insert(session_id.clone(), self.entry(username, session));
        session_id
    }

    /// Retrieve and remove a registration session
    pub fn take_registration(&self, session_id: &str) -> Option<(SessionData, String)> {
        let (_, entry) = self.registration_sessions.remove(session_id)?;
        unexpired(entry)
    }

    /// Store an authentication session, returning its opaque id
    pub fn store_authentication(&self, username: String, session: SessionData) -> String {
        let session_id = uuid::Uuid::new_v4().to_string();
        self.authentication_sessions
            .insert(session_id.clone(), self.entry(username, session));
        session_id
    }

    /// Retrieve and remove an authentication session
    pub fn take_authentication(&self, session_id: &str) -> Option<(SessionData, String)> {
        let (_, entry) = self.authentication_sessions.remove(session_id)?;
        unexpired(entry)
    }

    /// Remove expired sessions (called periodically). Returns how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.len();
        self.registration_sessions
            .retain(|_, entry| entry.expires_at > now);
        self.authentication_sessions
            .retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.len())
    }

    /// Get number of pending registration ceremonies
    pub fn registration_count(&self) -> usize {
        self.registration_sessions.len()
    }

    /// Get number of pending authentication ceremonies
    pub fn authentication_count(&self) -> usize {
        self.authentication_sessions.len()
    }

    pub fn len(&self) -> usize {
        self.registration_count() + self.authentication_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn unexpired(entry: PendingCeremony) -> Option<(SessionData, String)> {
    if entry.expires_at > Instant::now() {
        Some((entry.session, entry.username))
    } else {
        None // Expired
    }
}

impl std::fmt::Debug for MemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySessionStore")
            .field("expiry", &self.expiry)
            .field("registration_sessions", &self.registration_sessions.len())
            .field("authentication_sessions", &self.authentication_sessions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use passgate_core::{LoginOptions, RelyingParty, User};

    struct Alice;

    impl User for Alice {
        fn webauthn_id(&self) -> &[u8] {
            b"alice"
        }

        fn webauthn_name(&self) -> &str {
            "alice"
        }
    }

    fn session() -> SessionData {
        let rp = RelyingParty::builder("localhost", ["http://localhost:3000"])
            .build()
            .unwrap();
        rp.begin_login(&Alice, LoginOptions::new()).unwrap().1
    }

    #[test]
    fn test_take_is_single_use() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let id = store.store_authentication("alice".into(), session());
        assert_eq!(store.authentication_count(), 1);

        let (_, username) = store.take_authentication(&id).unwrap();
        assert_eq!(username, "alice");
        assert!(store.take_authentication(&id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_ceremony_kinds_are_separate() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let id = store.store_registration("alice".into(), session());
        assert!(store.take_authentication(&id).is_none());
        assert!(store.take_registration(&id).is_some());
    }

    #[test]
    fn test_expired_session_rejected_and_removed() {
        let store = MemorySessionStore::new(Duration::ZERO);
        let id = store.store_authentication("alice".into(), session());
        assert!(store.take_authentication(&id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_cleanup_expired() {
        let expired = MemorySessionStore::new(Duration::ZERO);
        expired.store_registration("alice".into(), session());
        expired.store_authentication("alice".into(), session());
        assert_eq!(expired.cleanup_expired(), 2);

        let live = MemorySessionStore::new(Duration::from_secs(60));
        live.store_registration("alice".into(), session());
        assert_eq!(live.cleanup_expired(), 0);
        assert_eq!(live.len(), 1);
    }

    #[test]
    fn test_session_ids_are_unique() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let a = store.store_authentication("alice".into(), session());
        let b = store.store_authentication("alice".into(), session());
        assert_ne!(a, b);
    }
}

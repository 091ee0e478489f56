//! In-memory user directory
//!
//! Stands in for the application's account model. Users are created on their
//! first registration and hold the descriptors of credentials they registered.
//! A credential id belongs to at most one user. Everything is lost on restart.

use dashmap::{mapref::entry::Entry, DashMap};
use passgate_core::{CredentialDescriptor, CredentialId, User};

/// Account known to the demo server
#[derive(Debug, Clone)]
pub struct DirectoryUser {
    /// Random WebAuthn user handle (16 bytes)
    pub id: Vec<u8>,
    pub username: String,
    pub display_name: String,
    pub credentials: Vec<CredentialDescriptor>,
}

impl User for DirectoryUser {
    fn webauthn_id(&self) -> &[u8] {
        &self.id
    }

    fn webauthn_name(&self) -> &str {
        &self.username
    }

    fn webauthn_display_name(&self) -> &str {
        &self.display_name
    }

    fn webauthn_credentials(&self) -> Vec<CredentialDescriptor> {
        self.credentials.clone()
    }
}

/// Thread-safe username -> user map
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: DashMap<String, DirectoryUser>,
    /// credential id -> owning username
    owners: DashMap<CredentialId, String>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `username`, creating it with a fresh user handle if unknown.
    pub fn get_or_create(&self, username: &str, display_name: Option<&str>) -> DirectoryUser {
        self.users
            .entry(username.to_string())
            .or_insert_with(|| DirectoryUser {
                id: uuid::Uuid::new_v4().as_bytes().to_vec(),
                username: username.to_string(),
                display_name: display_name.unwrap_or(username).to_string(),
                credentials: Vec::new(),
            })
            .clone()
    }

    pub fn get(&self, username: &str) -> Option<DirectoryUser> {
        self.users.get(username).map(|user| user.clone())
    }

    /// Attach a newly registered credential. Returns false if the user is
    /// unknown or any user already owns the credential id.
    pub fn add_credential(&self, username: &str, descriptor: CredentialDescriptor) -> bool {
        // Lock order: users, then owners.
        let Some(mut user) = self.users.get_mut(username) else {
            return false;
        };
        match self.owners.entry(descriptor.id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(username.to_string());
                user.credentials.push(descriptor);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

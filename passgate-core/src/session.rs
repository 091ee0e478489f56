//! Ceremony session state.
//!
//! `SessionData` is created at ceremony start and persisted by the caller
//! (signed cookie, server-side store). The core only reads it, and the finish
//! operations take it by value: once a ceremony completes, successfully or
//! not, the session is gone.

use serde::{Deserialize, Serialize};

use crate::challenge::Challenge;
use crate::encoding;
use crate::options::UserVerificationRequirement;
use crate::user::{CredentialId, User};

/// State binding a challenge to a user for one ceremony.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub challenge: Challenge,
    #[serde(with = "encoding::base64url")]
    pub user_id: Vec<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_credential_ids: Vec<CredentialId>,
    #[serde(default)]
    pub user_verification: UserVerificationRequirement,
}

impl SessionData {
    pub(crate) fn bind<U: User + ?Sized>(
        challenge: Challenge,
        user: &U,
        allowed_credential_ids: Vec<CredentialId>,
        user_verification: UserVerificationRequirement,
    ) -> Self {
        Self {
            challenge,
            user_id: user.webauthn_id().to_vec(),
            allowed_credential_ids,
            user_verification,
        }
    }

    /// Whether `user` is the identity this session was issued to.
    pub fn is_bound_to<U: User + ?Sized>(&self, user: &U) -> bool {
        self.user_id == user.webauthn_id()
    }

    /// Destroy the session. The challenge is zeroized on drop.
    pub fn invalidate(self) {
        drop(self);
    }
}

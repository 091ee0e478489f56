//! Options handed to the client, and the caller-side modifiers that shape them.
//!
//! Modifiers work on a *draft* that has no challenge field: they may replace
//! any default but can never touch the challenge. Named fields are applied
//! first, then override closures in the order they were added.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::challenge::Challenge;
use crate::encoding;
use crate::user::{public_key_type, CredentialDescriptor};

/// COSE algorithm identifier for ES256.
pub const COSE_ALG_ES256: i64 = -7;
/// COSE algorithm identifier for EdDSA.
pub const COSE_ALG_EDDSA: i64 = -8;
/// COSE algorithm identifier for RS256.
pub const COSE_ALG_RS256: i64 = -257;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserVerificationRequirement {
    Required,
    #[default]
    Preferred,
    Discouraged,
}

impl std::str::FromStr for UserVerificationRequirement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "required" => Ok(Self::Required),
            "preferred" => Ok(Self::Preferred),
            "discouraged" => Ok(Self::Discouraged),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttestationConveyance {
    #[default]
    None,
    Indirect,
    Direct,
    Enterprise,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResidentKeyRequirement {
    Required,
    #[default]
    Preferred,
    Discouraged,
}

// ==================== Login (assertion) ====================

/// `PublicKeyCredentialRequestOptions` as serialized to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialRequestOptions {
    pub challenge: Challenge,
    /// Milliseconds
    pub timeout: u64,
    pub rp_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allow_credentials: Vec<CredentialDescriptor>,
    pub user_verification: UserVerificationRequirement,
}

/// Request option fields a login modifier may change.
#[derive(Debug, Clone)]
pub struct RequestOptionsDraft {
    pub timeout: Duration,
    pub rp_id: String,
    pub allow_credentials: Vec<CredentialDescriptor>,
    pub user_verification: UserVerificationRequirement,
}

impl RequestOptionsDraft {
    pub(crate) fn finish(self, challenge: Challenge) -> PublicKeyCredentialRequestOptions {
        PublicKeyCredentialRequestOptions {
            challenge,
            timeout: duration_millis(self.timeout),
            rp_id: self.rp_id,
            allow_credentials: self.allow_credentials,
            user_verification: self.user_verification,
        }
    }
}

pub type RequestOverride = Box<dyn FnOnce(&mut RequestOptionsDraft) + Send>;

/// Caller modifiers for `begin_login`.
#[derive(Default)]
pub struct LoginOptions {
    pub timeout: Option<Duration>,
    pub allow_credentials: Option<Vec<CredentialDescriptor>>,
    pub user_verification: Option<UserVerificationRequirement>,
    overrides: Vec<RequestOverride>,
}

impl LoginOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replace the allow list derived from the user's credentials.
    pub fn allow_credentials(mut self, credentials: Vec<CredentialDescriptor>) -> Self {
        self.allow_credentials = Some(credentials);
        self
    }

    pub fn user_verification(mut self, requirement: UserVerificationRequirement) -> Self {
        self.user_verification = Some(requirement);
        self
    }

    /// Append an override; overrides run after the named fields, in order.
    pub fn with_override<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut RequestOptionsDraft) + Send + 'static,
    {
        self.overrides.push(Box::new(f));
        self
    }

    pub(crate) fn apply(self, draft: &mut RequestOptionsDraft) {
        if let Some(timeout) = self.timeout {
            draft.timeout = timeout;
        }
        if let Some(credentials) = self.allow_credentials {
            draft.allow_credentials = credentials;
        }
        if let Some(requirement) = self.user_verification {
            draft.user_verification = requirement;
        }
        for f in self.overrides {
            f(draft);
        }
    }
}

impl std::fmt::Debug for LoginOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginOptions")
            .field("timeout", &self.timeout)
            .field("allow_credentials", &self.allow_credentials)
            .field("user_verification", &self.user_verification)
            .field("overrides", &self.overrides.len())
            .finish()
    }
}

// ==================== Registration (creation) ====================

#[derive(Debug, Clone, Serialize)]
pub struct RelyingPartyEntity {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    #[serde(with = "encoding::base64url")]
    pub id: Vec<u8>,
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PubKeyCredParam {
    #[serde(rename = "type")]
    pub type_: String,
    pub alg: i64,
}

impl PubKeyCredParam {
    pub fn new(alg: i64) -> Self {
        Self {
            type_: public_key_type(),
            alg,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticator_attachment: Option<String>,
    pub resident_key: ResidentKeyRequirement,
    pub user_verification: UserVerificationRequirement,
}

/// `PublicKeyCredentialCreationOptions` as serialized to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialCreationOptions {
    pub rp: RelyingPartyEntity,
    pub user: UserEntity,
    pub challenge: Challenge,
    pub pub_key_cred_params: Vec<PubKeyCredParam>,
    /// Milliseconds
    pub timeout: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_credentials: Vec<CredentialDescriptor>,
    pub authenticator_selection: AuthenticatorSelection,
    pub attestation: AttestationConveyance,
}

/// Creation option fields a registration modifier may change.
///
/// The user entity is fixed by the session and supplied at [`finish`](Self::finish).
#[derive(Debug, Clone)]
pub struct CreationOptionsDraft {
    pub rp: RelyingPartyEntity,
    pub pub_key_cred_params: Vec<PubKeyCredParam>,
    pub timeout: Duration,
    pub exclude_credentials: Vec<CredentialDescriptor>,
    pub authenticator_selection: AuthenticatorSelection,
    pub attestation: AttestationConveyance,
}

impl CreationOptionsDraft {
    pub(crate) fn finish(self, user: UserEntity, challenge: Challenge) -> PublicKeyCredentialCreationOptions {
        PublicKeyCredentialCreationOptions {
            rp: self.rp,
            user,
            challenge,
            pub_key_cred_params: self.pub_key_cred_params,
            timeout: duration_millis(self.timeout),
            exclude_credentials: self.exclude_credentials,
            authenticator_selection: self.authenticator_selection,
            attestation: self.attestation,
        }
    }
}

pub type CreationOverride = Box<dyn FnOnce(&mut CreationOptionsDraft) + Send>;

/// Caller modifiers for `begin_registration`.
#[derive(Default)]
pub struct RegistrationOptions {
    pub timeout: Option<Duration>,
    pub exclude_credentials: Option<Vec<CredentialDescriptor>>,
    pub authenticator_selection: Option<AuthenticatorSelection>,
    pub attestation: Option<AttestationConveyance>,
    overrides: Vec<CreationOverride>,
}

impl RegistrationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn exclude_credentials(mut self, credentials: Vec<CredentialDescriptor>) -> Self {
        self.exclude_credentials = Some(credentials);
        self
    }

    pub fn authenticator_selection(mut self, selection: AuthenticatorSelection) -> Self {
        self.authenticator_selection = Some(selection);
        self
    }

    pub fn attestation(mut self, conveyance: AttestationConveyance) -> Self {
        self.attestation = Some(conveyance);
        self
    }

    pub fn with_override<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut CreationOptionsDraft) + Send + 'static,
    {
        self.overrides.push(Box::new(f));
        self
    }

    pub(crate) fn apply(self, draft: &mut CreationOptionsDraft) {
        if let Some(timeout) = self.timeout {
            draft.timeout = timeout;
        }
        if let Some(credentials) = self.exclude_credentials {
            draft.exclude_credentials = credentials;
        }
        if let Some(selection) = self.authenticator_selection {
            draft.authenticator_selection = selection;
        }
        if let Some(conveyance) = self.attestation {
            draft.attestation = conveyance;
        }
        for f in self.overrides {
            f(draft);
        }
    }
}

impl std::fmt::Debug for RegistrationOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationOptions")
            .field("timeout", &self.timeout)
            .field("exclude_credentials", &self.exclude_credentials)
            .field("authenticator_selection", &self.authenticator_selection)
            .field("attestation", &self.attestation)
            .field("overrides", &self.overrides.len())
            .finish()
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> RequestOptionsDraft {
        RequestOptionsDraft {
            timeout: Duration::from_secs(60),
            rp_id: "example.com".into(),
            allow_credentials: vec![CredentialDescriptor::new(vec![1])],
            user_verification: UserVerificationRequirement::Preferred,
        }
    }

    #[test]
    fn test_named_fields_override_defaults() {
        let mut d = draft();
        LoginOptions::new()
            .timeout(Duration::from_secs(5))
            .user_verification(UserVerificationRequirement::Required)
            .apply(&mut d);

        assert_eq!(d.timeout, Duration::from_secs(5));
        assert_eq!(d.user_verification, UserVerificationRequirement::Required);
        assert_eq!(d.allow_credentials.len(), 1);
    }

    #[test]
    fn test_overrides_apply_in_order_after_named_fields() {
        let mut d = draft();
        LoginOptions::new()
            .timeout(Duration::from_secs(5))
            .with_override(|d| d.timeout = Duration::from_secs(10))
            .with_override(|d| d.timeout += Duration::from_secs(1))
            .apply(&mut d);

        assert_eq!(d.timeout, Duration::from_secs(11));
    }

    #[test]
    fn test_request_options_wire_shape() {
        let options = draft().finish(Challenge::from_bytes(vec![0u8; 16]));
        let json = serde_json::to_value(&options).unwrap();

        assert_eq!(json["challenge"], "AAAAAAAAAAAAAAAAAAAAAA");
        assert_eq!(json["timeout"], 60_000);
        assert_eq!(json["rpId"], "example.com");
        assert_eq!(json["allowCredentials"][0]["id"], "AQ");
        assert_eq!(json["userVerification"], "preferred");
    }

    #[test]
    fn test_empty_allow_list_is_omitted() {
        let mut d = draft();
        d.allow_credentials.clear();
        let json = serde_json::to_value(d.finish(Challenge::from_bytes(vec![0u8; 16]))).unwrap();
        assert!(json.get("allowCredentials").is_none());
    }

    #[test]
    fn test_user_verification_from_str() {
        assert_eq!(
            "REQUIRED".parse::<UserVerificationRequirement>(),
            Ok(UserVerificationRequirement::Required)
        );
        assert!("sometimes".parse::<UserVerificationRequirement>().is_err());
    }
}

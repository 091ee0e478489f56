//! Collected client data and its verification.
//!
//! `CollectedClientData::verify` is the gate both ceremonies pass through.
//! The checks run in a fixed order and the first failure wins:
//!
//! 1. ceremony type (`webauthn.create` / `webauthn.get`)
//! 2. challenge, compared in constant time on decoded bytes
//! 3. origin, compared as a scheme/host/port tuple
//! 4. token binding, best effort unless the policy requires it
//!
//! Verification is pure. Relying Party settings are passed in on every call
//! and nothing here touches session state.

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use url::{Origin, Url};
use zeroize::Zeroizing;

use crate::challenge::Challenge;
use crate::encoding;
use crate::error::{clip, describe_json_error, ConfigError, ParseError, VerificationError};

/// Ceremony the server believes is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CeremonyType {
    #[serde(rename = "webauthn.create")]
    Create,
    #[serde(rename = "webauthn.get")]
    Assert,
}

impl CeremonyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "webauthn.create",
            Self::Assert => "webauthn.get",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "webauthn.create" => Some(Self::Create),
            "webauthn.get" => Some(Self::Assert),
            _ => None,
        }
    }
}

impl std::fmt::Display for CeremonyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenBindingStatus {
    /// Token binding was used on the connection; `id` must be present.
    Present,
    /// The client supports token binding but did not negotiate it.
    Supported,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBinding {
    pub status: TokenBindingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Client-reported ceremony context, untrusted until verified.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectedClientData {
    /// Raw `type` member; unknown values are a verification failure, not a
    /// parse failure.
    #[serde(rename = "type")]
    pub type_: String,
    pub challenge: String,
    pub origin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_origin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_binding: Option<TokenBinding>,
}

impl CollectedClientData {
    /// Parse the decoded `clientDataJSON` bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ParseError> {
        serde_json::from_slice(bytes).map_err(|e| ParseError::InvalidClientData(describe_json_error(&e)))
    }

    pub fn ceremony_type(&self) -> Option<CeremonyType> {
        CeremonyType::from_wire(&self.type_)
    }

    /// Run every client-data gate for `expected`.
    pub fn verify(
        &self,
        stored_challenge: &Challenge,
        expected: CeremonyType,
        policy: &ClientDataPolicy,
        connection: &ConnectionTokenBinding,
    ) -> Result<ClientDataVerdict, VerificationError> {
        // Registration step 7 / assertion step 10: type
        if self.ceremony_type() != Some(expected) {
            return Err(VerificationError::TypeMismatch {
                expected,
                received: clip(&self.type_),
            });
        }

        // Registration step 8 / assertion step 11: challenge
        let received = Zeroizing::new(
            encoding::decode_lenient(&self.challenge).ok_or(VerificationError::MalformedChallenge)?,
        );
        if !stored_challenge.matches(&received) {
            return Err(VerificationError::ChallengeMismatch {
                expected_len: stored_challenge.len(),
                received_len: received.len(),
            });
        }

        // Registration step 9 / assertion step 12: origin
        let origin = Url::parse(&self.origin)
            .map_err(|_| VerificationError::MalformedOrigin)?
            .origin();
        if !policy.origins.contains(&origin) {
            return Err(VerificationError::OriginMismatch {
                origin: clip(&origin.ascii_serialization()),
            });
        }

        // Registration step 10 / assertion step 13: token binding
        let token_binding = check_token_binding(self.token_binding.as_ref(), policy.token_binding, connection)?;

        Ok(ClientDataVerdict {
            token_binding,
            cross_origin: self.cross_origin.unwrap_or(false),
        })
    }
}

impl std::fmt::Debug for CollectedClientData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectedClientData")
            .field("type", &self.type_)
            .field("challenge_len", &self.challenge.len())
            .field("origin", &self.origin)
            .field("cross_origin", &self.cross_origin)
            .field("token_binding", &self.token_binding.as_ref().map(|t| t.status))
            .finish()
    }
}

// ==================== Relying Party policy ====================

/// Origins a relying party accepts, reduced to scheme/host/port tuples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedOrigins(Vec<Origin>);

impl AllowedOrigins {
    pub fn new(urls: &[Url]) -> Result<Self, ConfigError> {
        if urls.is_empty() {
            return Err(ConfigError::NoOrigins);
        }
        let origins = urls
            .iter()
            .map(|url| {
                let origin = url.origin();
                if origin.is_tuple() {
                    Ok(origin)
                } else {
                    Err(ConfigError::OpaqueOrigin(url.to_string()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(origins))
    }

    pub fn contains(&self, origin: &Origin) -> bool {
        origin.is_tuple() && self.0.iter().any(|allowed| allowed == origin)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Origin> {
        self.0.iter()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenBindingPolicy {
    /// Check when the connection state is known, skip (and report) otherwise.
    #[default]
    Optional,
    /// Reject ceremonies whose connection token-binding state is unknown.
    Required,
}

impl std::str::FromStr for TokenBindingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "optional" => Ok(Self::Optional),
            "required" => Ok(Self::Required),
            other => Err(other.to_string()),
        }
    }
}

/// Relying Party settings consulted by client-data verification.
#[derive(Debug, Clone)]
pub struct ClientDataPolicy {
    pub origins: AllowedOrigins,
    pub token_binding: TokenBindingPolicy,
}

/// Token binding state of the TLS connection the response arrived on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionTokenBinding {
    /// The transport cannot tell.
    #[default]
    Unknown,
    NotSupported,
    Supported,
    /// Negotiated with this token binding id.
    Present(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenBindingOutcome {
    /// Neither side used token binding.
    NotUsed,
    /// Client claim matched the connection.
    Verified,
    /// Client made a claim but the connection state was unknown, so it was
    /// not checked.
    Skipped,
}

/// Result of a passed client-data verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDataVerdict {
    pub token_binding: TokenBindingOutcome,
    pub cross_origin: bool,
}

fn check_token_binding(
    claim: Option<&TokenBinding>,
    policy: TokenBindingPolicy,
    connection: &ConnectionTokenBinding,
) -> Result<TokenBindingOutcome, VerificationError> {
    if *connection == ConnectionTokenBinding::Unknown {
        return match (policy, claim) {
            (TokenBindingPolicy::Required, _) => Err(VerificationError::TokenBindingUnverifiable),
            (TokenBindingPolicy::Optional, None) => Ok(TokenBindingOutcome::NotUsed),
            (TokenBindingPolicy::Optional, Some(_)) => Ok(TokenBindingOutcome::Skipped),
        };
    }

    match (claim, connection) {
        (None, ConnectionTokenBinding::Present(_)) => Err(VerificationError::TokenBindingMismatch),
        (None, _) => Ok(TokenBindingOutcome::NotUsed),
        (Some(binding), _) if binding.status == TokenBindingStatus::Supported => match connection {
            ConnectionTokenBinding::Supported => Ok(TokenBindingOutcome::Verified),
            _ => Err(VerificationError::TokenBindingMismatch),
        },
        (Some(binding), _) => {
            let claimed = binding
                .id
                .as_deref()
                .and_then(encoding::decode_lenient)
                .ok_or(VerificationError::MalformedTokenBinding)?;
            match connection {
                ConnectionTokenBinding::Present(expected) if bool::from(expected.as_slice().ct_eq(&claimed)) => {
                    Ok(TokenBindingOutcome::Verified)
                }
                _ => Err(VerificationError::TokenBindingMismatch),
            }
        }
    }
}

//! Application identity as seen by the ceremony core.
//!
//! The core never constructs or mutates users; it reads their WebAuthn id and
//! the descriptors of credentials they already own.

use serde::{Deserialize, Serialize};

use crate::encoding;

/// Identity taking part in a ceremony.
pub trait User {
    /// Stable user handle. Compared byte-for-byte against session data.
    fn webauthn_id(&self) -> &[u8];

    /// Account name shown by authenticators during registration.
    fn webauthn_name(&self) -> &str;

    fn webauthn_display_name(&self) -> &str {
        self.webauthn_name()
    }

    /// Credentials already registered to this user.
    fn webauthn_credentials(&self) -> Vec<CredentialDescriptor> {
        Vec::new()
    }
}

/// Raw credential id, base64url on the wire.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialId(#[serde(with = "encoding::base64url")] Vec<u8>);

impl CredentialId {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_base64url(&self) -> String {
        encoding::encode(&self.0)
    }
}

impl From<Vec<u8>> for CredentialId {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Debug for CredentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CredentialId({})", self.to_base64url())
    }
}

impl std::fmt::Display for CredentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base64url())
    }
}

/// `PublicKeyCredentialDescriptor` used in allow and exclude lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDescriptor {
    #[serde(rename = "type", default = "public_key_type")]
    pub type_: String,
    pub id: CredentialId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transports: Vec<String>,
}

impl CredentialDescriptor {
    pub fn new(id: impl Into<CredentialId>) -> Self {
        Self {
            type_: public_key_type(),
            id: id.into(),
            transports: Vec::new(),
        }
    }

    pub fn with_transports<I, S>(mut self, transports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.transports = transports.into_iter().map(Into::into).collect();
        self
    }
}

pub(crate) fn public_key_type() -> String {
    "public-key".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_wire_shape() {
        let descriptor = CredentialDescriptor::new(vec![1, 2, 3]).with_transports(["usb", "nfc"]);
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["type"], "public-key");
        assert_eq!(json["id"], "AQID");
        assert_eq!(json["transports"][1], "nfc");
    }

    #[test]
    fn test_descriptor_omits_empty_transports() {
        let json = serde_json::to_value(CredentialDescriptor::new(vec![9])).unwrap();
        assert!(json.get("transports").is_none());
    }
}

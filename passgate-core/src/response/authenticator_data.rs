//! Authenticator data layout.
//!
//! ```text
//! rpIdHash (32) | flags (1) | signCount (4, big endian) | attestedCredentialData? | extensions?
//! ```
//!
//! Attested credential data is present when the AT flag is set:
//! `aaguid (16) | credentialIdLength (2, big endian) | credentialId | credentialPublicKey (COSE)`.

use std::io::Cursor;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::user::CredentialId;

/// Fixed prefix length: rpIdHash, flags and signCount.
pub const MIN_AUTH_DATA_LEN: usize = 37;

const AAGUID_LEN: usize = 16;

/// Authenticator data flag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatorFlags(pub u8);

impl AuthenticatorFlags {
    pub const USER_PRESENT: u8 = 0x01;
    pub const USER_VERIFIED: u8 = 0x04;
    pub const BACKUP_ELIGIBLE: u8 = 0x08;
    pub const BACKUP_STATE: u8 = 0x10;
    pub const ATTESTED_CREDENTIAL_DATA: u8 = 0x40;
    pub const EXTENSION_DATA: u8 = 0x80;

    fn has(&self, bit: u8) -> bool {
        self.0 & bit != 0
    }

    pub fn user_present(&self) -> bool {
        self.has(Self::USER_PRESENT)
    }

    pub fn user_verified(&self) -> bool {
        self.has(Self::USER_VERIFIED)
    }

    pub fn backup_eligible(&self) -> bool {
        self.has(Self::BACKUP_ELIGIBLE)
    }

    pub fn backed_up(&self) -> bool {
        self.has(Self::BACKUP_STATE)
    }

    pub fn has_attested_credential_data(&self) -> bool {
        self.has(Self::ATTESTED_CREDENTIAL_DATA)
    }

    pub fn has_extension_data(&self) -> bool {
        self.has(Self::EXTENSION_DATA)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestedCredentialData {
    pub aaguid: [u8; AAGUID_LEN],
    pub credential_id: CredentialId,
    /// COSE_Key, still CBOR encoded.
    pub credential_public_key: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatorData {
    pub rp_id_hash: [u8; 32],
    pub flags: AuthenticatorFlags,
    pub sign_count: u32,
    pub attested_credential: Option<AttestedCredentialData>,
    /// Extension outputs, still CBOR encoded.
    pub extensions: Vec<u8>,
}

impl AuthenticatorData {
    pub fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < MIN_AUTH_DATA_LEN {
            return Err(ParseError::InvalidAuthenticatorData("shorter than 37 bytes"));
        }

        let mut rp_id_hash = [0u8; 32];
        rp_id_hash.copy_from_slice(&data[..32]);
        let flags = AuthenticatorFlags(data[32]);
        let sign_count = u32::from_be_bytes([data[33], data[34], data[35], data[36]]);

        let mut rest = &data[MIN_AUTH_DATA_LEN..];

        let attested_credential = if flags.has_attested_credential_data() {
            let (attested, remaining) = parse_attested_credential(rest)?;
            rest = remaining;
            Some(attested)
        } else {
            None
        };

        let extensions = if flags.has_extension_data() {
            if rest.is_empty() {
                return Err(ParseError::InvalidAuthenticatorData("extension flag set without data"));
            }
            let len = cbor_item_len(rest)
                .ok_or(ParseError::InvalidAuthenticatorData("extension data is not CBOR"))?;
            let (extensions, remaining) = rest.split_at(len);
            rest = remaining;
            extensions.to_vec()
        } else {
            Vec::new()
        };

        if !rest.is_empty() {
            return Err(ParseError::InvalidAuthenticatorData("trailing bytes"));
        }

        Ok(Self {
            rp_id_hash,
            flags,
            sign_count,
            attested_credential,
            extensions,
        })
    }
}

fn parse_attested_credential(data: &[u8]) -> Result<(AttestedCredentialData, &[u8]), ParseError> {
    if data.len() < AAGUID_LEN + 2 {
        return Err(ParseError::InvalidAuthenticatorData("attested credential data truncated"));
    }
    let mut aaguid = [0u8; AAGUID_LEN];
    aaguid.copy_from_slice(&data[..AAGUID_LEN]);

    let id_len = u16::from_be_bytes([data[AAGUID_LEN], data[AAGUID_LEN + 1]]) as usize;
    let rest = &data[AAGUID_LEN + 2..];
    if rest.len() < id_len {
        return Err(ParseError::InvalidAuthenticatorData("credential id truncated"));
    }
    let (credential_id, rest) = rest.split_at(id_len);

    let key_len = cbor_item_len(rest)
        .ok_or(ParseError::InvalidAuthenticatorData("credential public key is not CBOR"))?;
    let (credential_public_key, rest) = rest.split_at(key_len);

    Ok((
        AttestedCredentialData {
            aaguid,
            credential_id: CredentialId::new(credential_id.to_vec()),
            credential_public_key: credential_public_key.to_vec(),
        },
        rest,
    ))
}

/// Length in bytes of the single CBOR item at the front of `data`.
fn cbor_item_len(data: &[u8]) -> Option<usize> {
    let mut cursor = Cursor::new(data);
    let _: ciborium::Value = ciborium::de::from_reader(&mut cursor).ok()?;
    usize::try_from(cursor.position()).ok()
}

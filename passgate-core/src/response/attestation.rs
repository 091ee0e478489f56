//! Attestation object container.
//!
//! Only the CBOR envelope is decoded here. Attestation statement formats are
//! not validated; `att_stmt` is kept as a CBOR value for callers that do.

use ciborium::Value;

use super::authenticator_data::AuthenticatorData;
use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub struct AttestationObject {
    pub fmt: String,
    pub auth_data: AuthenticatorData,
    pub raw_auth_data: Vec<u8>,
    pub att_stmt: Value,
}

impl AttestationObject {
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, ParseError> {
        let value: Value = ciborium::de::from_reader(bytes)
            .map_err(|_| ParseError::InvalidAttestationObject("not valid CBOR"))?;
        let entries = value
            .into_map()
            .map_err(|_| ParseError::InvalidAttestationObject("top level is not a map"))?;

        let mut fmt = None;
        let mut raw_auth_data = None;
        let mut att_stmt = None;

        for (key, value) in entries {
            let Value::Text(key) = key else {
                continue;
            };
            match key.as_str() {
                "fmt" => {
                    fmt = Some(
                        value
                            .into_text()
                            .map_err(|_| ParseError::InvalidAttestationObject("`fmt` is not text"))?,
                    )
                }
                "authData" => {
                    raw_auth_data = Some(
                        value
                            .into_bytes()
                            .map_err(|_| ParseError::InvalidAttestationObject("`authData` is not bytes"))?,
                    )
                }
                "attStmt" => {
                    if !value.is_map() {
                        return Err(ParseError::InvalidAttestationObject("`attStmt` is not a map"));
                    }
                    att_stmt = Some(value);
                }
                _ => {}
            }
        }

        let fmt = fmt.ok_or(ParseError::InvalidAttestationObject("missing `fmt`"))?;
        let raw_auth_data = raw_auth_data.ok_or(ParseError::InvalidAttestationObject("missing `authData`"))?;
        let att_stmt = att_stmt.ok_or(ParseError::InvalidAttestationObject("missing `attStmt`"))?;

        let auth_data = AuthenticatorData::from_bytes(&raw_auth_data)?;
        if auth_data.attested_credential.is_none() {
            return Err(ParseError::InvalidAttestationObject(
                "authData has no attested credential data",
            ));
        }

        Ok(Self {
            fmt,
            auth_data,
            raw_auth_data,
            att_stmt,
        })
    }
}

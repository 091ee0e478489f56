use thiserror::Error;

use crate::client_data::CeremonyType;

/// Minimum accepted challenge length in bytes.
pub const MIN_CHALLENGE_LEN: usize = 16;

/// Top-level error for every ceremony operation.
#[derive(Error, Debug)]
pub enum CeremonyError {
    /// The entropy source could not produce a challenge. Fatal to the ceremony.
    #[error("Entropy source failure: {0}")]
    EntropySourceFailure(String),

    /// The transport payload could not be turned into a credential response.
    #[error("Bad request: {0}")]
    BadRequest(#[from] ParseError),

    /// The payload was well formed but failed a ceremony gate.
    #[error("Verification failed: {0}")]
    Verification(#[from] VerificationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl CeremonyError {
    /// Stable error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EntropySourceFailure(_) => "ENTROPY_SOURCE_FAILURE",
            Self::BadRequest(_) => "MALFORMED_RESPONSE",
            Self::Verification(e) => e.code(),
            Self::Config(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Whether this failure belongs to the verification class (400/403 and
    /// always followed by session invalidation).
    pub fn is_verification(&self) -> bool {
        matches!(self, Self::Verification(_))
    }
}

/// Structural failures while decoding a credential response.
///
/// Messages name the offending field but never carry payload bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("request body is empty")]
    EmptyBody,

    #[error("request body is not a valid credential document ({0})")]
    InvalidJson(String),

    #[error("field `{0}` is not valid base64")]
    InvalidEncoding(&'static str),

    #[error("credential type `{0}` is not supported")]
    UnsupportedCredentialType(String),

    #[error("credential id does not match raw id")]
    IdMismatch,

    #[error("clientDataJSON is malformed ({0})")]
    InvalidClientData(String),

    #[error("authenticator data is malformed: {0}")]
    InvalidAuthenticatorData(&'static str),

    #[error("attestation object is malformed: {0}")]
    InvalidAttestationObject(&'static str),
}

/// Semantic failures of a ceremony gate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("ceremony type mismatch: expected {expected}, received `{received}`")]
    TypeMismatch {
        expected: CeremonyType,
        received: String,
    },

    #[error("client challenge is not valid base64")]
    MalformedChallenge,

    #[error("challenge mismatch (expected {expected_len} bytes, received {received_len} bytes)")]
    ChallengeMismatch {
        expected_len: usize,
        received_len: usize,
    },

    #[error("client origin is not a valid URL")]
    MalformedOrigin,

    #[error("origin `{origin}` is not allowed for this relying party")]
    OriginMismatch { origin: String },

    #[error("token binding id is missing or malformed")]
    MalformedTokenBinding,

    #[error("token binding does not match the connection")]
    TokenBindingMismatch,

    #[error("token binding is required but the connection state is unknown")]
    TokenBindingUnverifiable,

    #[error("user does not match the ceremony session")]
    UserMismatch,

    #[error("user handle does not match the ceremony session")]
    UserHandleMismatch,

    #[error("credential is not allowed for this ceremony")]
    CredentialNotAllowed,

    #[error("attested credential id does not match the response id")]
    CredentialIdMismatch,

    #[error("authenticator did not report user presence")]
    UserNotPresent,

    #[error("user verification was required but not performed")]
    UserVerificationMissing,
}

impl VerificationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::TypeMismatch { .. } => "TYPE_MISMATCH",
            Self::MalformedChallenge => "MALFORMED_CHALLENGE",
            Self::ChallengeMismatch { .. } => "CHALLENGE_MISMATCH",
            Self::MalformedOrigin => "MALFORMED_ORIGIN",
            Self::OriginMismatch { .. } => "ORIGIN_MISMATCH",
            Self::MalformedTokenBinding => "MALFORMED_TOKEN_BINDING",
            Self::TokenBindingMismatch => "TOKEN_BINDING_MISMATCH",
            Self::TokenBindingUnverifiable => "TOKEN_BINDING_UNVERIFIABLE",
            Self::UserMismatch => "USER_MISMATCH",
            Self::UserHandleMismatch => "USER_HANDLE_MISMATCH",
            Self::CredentialNotAllowed => "CREDENTIAL_NOT_ALLOWED",
            Self::CredentialIdMismatch => "CREDENTIAL_ID_MISMATCH",
            Self::UserNotPresent => "USER_NOT_PRESENT",
            Self::UserVerificationMissing => "USER_VERIFICATION_MISSING",
        }
    }
}

/// Invalid Relying Party configuration, reported at construction time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("relying party id must not be empty")]
    EmptyRpId,

    #[error("at least one relying party origin is required")]
    NoOrigins,

    #[error("invalid origin URL `{0}`")]
    InvalidOrigin(String),

    #[error("origin `{0}` has no scheme/host tuple")]
    OpaqueOrigin(String),

    #[error("challenge length {0} is below the minimum of {MIN_CHALLENGE_LEN} bytes")]
    ChallengeTooShort(usize),

    #[error("invalid value for {key}: `{value}`")]
    InvalidSetting { key: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, CeremonyError>;

/// Describe a JSON error by category and position only; serde messages can
/// quote the offending value.
pub(crate) fn describe_json_error(err: &serde_json::Error) -> String {
    let category = match err.classify() {
        serde_json::error::Category::Io => "io",
        serde_json::error::Category::Syntax => "syntax",
        serde_json::error::Category::Data => "data",
        serde_json::error::Category::Eof => "eof",
    };
    format!("{category} error at line {} column {}", err.line(), err.column())
}

/// Clip client-supplied text before it is placed in an error message.
pub(crate) fn clip(text: &str) -> String {
    const MAX: usize = 32;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct_per_verification_kind() {
        let errors = [
            VerificationError::MalformedChallenge,
            VerificationError::ChallengeMismatch {
                expected_len: 32,
                received_len: 32,
            },
            VerificationError::MalformedOrigin,
            VerificationError::OriginMismatch {
                origin: "https://evil.example".into(),
            },
            VerificationError::UserMismatch,
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_challenge_mismatch_message_carries_lengths_only() {
        let err = VerificationError::ChallengeMismatch {
            expected_len: 32,
            received_len: 16,
        };
        assert_eq!(
            err.to_string(),
            "challenge mismatch (expected 32 bytes, received 16 bytes)"
        );
    }

    #[test]
    fn test_ceremony_error_code_delegates() {
        let err: CeremonyError = VerificationError::UserMismatch.into();
        assert_eq!(err.code(), "USER_MISMATCH");
        assert!(err.is_verification());

        let err: CeremonyError = ParseError::EmptyBody.into();
        assert_eq!(err.code(), "MALFORMED_RESPONSE");
        assert!(!err.is_verification());
    }

    #[test]
    fn test_clip_long_text() {
        let long = "x".repeat(100);
        let clipped = clip(&long);
        assert_eq!(clipped.len(), 35);
        assert!(clipped.ends_with("..."));
        assert_eq!(clip("webauthn.get"), "webauthn.get");
    }

    #[test]
    fn test_json_error_description_hides_values() {
        let err = serde_json::from_str::<u32>("\"secret-challenge\"").unwrap_err();
        let described = describe_json_error(&err);
        assert!(!described.contains("secret-challenge"));
        assert!(described.starts_with("data error"));
    }
}

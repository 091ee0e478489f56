//! Base64 helpers for WebAuthn wire values.
//!
//! Everything the server emits is base64url without padding. Everything it
//! reads is decoded leniently: URL-safe or standard alphabet, padded or not.
//! Comparisons always happen on the decoded bytes.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;

/// Encode bytes as unpadded base64url.
pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode base64 text written in either alphabet, with or without padding.
pub fn decode_lenient(text: &str) -> Option<Vec<u8>> {
    let trimmed = text.trim_end_matches('=');
    if trimmed.contains(['+', '/']) {
        STANDARD_NO_PAD.decode(trimmed).ok()
    } else {
        URL_SAFE_NO_PAD.decode(trimmed).ok()
    }
}

/// Serde adapter for `Vec<u8>` fields carried as base64url strings.
pub mod base64url {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        super::decode_lenient(&text).ok_or_else(|| serde::de::Error::custom("invalid base64url"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::{STANDARD, URL_SAFE};

    #[test]
    fn test_encode_is_unpadded_url_safe() {
        let bytes = [0xfb, 0xff, 0xfe];
        assert_eq!(encode(&bytes), "-__-");
        assert_eq!(encode(b"a"), "YQ");
    }

    #[test]
    fn test_decode_accepts_every_alphabet() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        for text in [
            URL_SAFE_NO_PAD.encode(&bytes),
            URL_SAFE.encode(&bytes),
            STANDARD_NO_PAD.encode(&bytes),
            STANDARD.encode(&bytes),
        ] {
            assert_eq!(decode_lenient(&text).as_deref(), Some(bytes.as_slice()));
        }
    }

    #[test]
    fn test_decode_rejects_mixed_alphabets() {
        assert!(decode_lenient("ab-+").is_none());
        assert!(decode_lenient("not base64!").is_none());
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode_lenient(""), Some(Vec::new()));
    }
}

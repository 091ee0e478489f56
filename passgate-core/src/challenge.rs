//! Ceremony challenges.
//!
//! A challenge is generated fresh for every ceremony and consumed once. Its
//! bytes are never printed: `Debug` and `Display` show the length and a short
//! SHA3 fingerprint, which is enough to correlate log lines.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Sha3_256};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::encoding;
use crate::entropy::{EntropySource, OsEntropy};
use crate::error::{ConfigError, Result, MIN_CHALLENGE_LEN};

/// Default challenge length in bytes.
pub const DEFAULT_CHALLENGE_LEN: usize = 32;

/// Random single-use ceremony challenge.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Challenge(Vec<u8>);

impl Challenge {
    /// Draw `len` bytes from `source`.
    pub fn generate(source: &dyn EntropySource, len: usize) -> Result<Self> {
        if len < MIN_CHALLENGE_LEN {
            return Err(ConfigError::ChallengeTooShort(len).into());
        }
        let mut bytes = vec![0u8; len];
        source.fill(&mut bytes)?;
        Ok(Self(bytes))
    }

    /// Rebuild a challenge from previously stored bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Wire form sent to the client.
    pub fn to_base64url(&self) -> String {
        encoding::encode(&self.0)
    }

    /// Data-independent-time comparison against raw candidate bytes.
    pub fn matches(&self, candidate: &[u8]) -> bool {
        self.0.as_slice().ct_eq(candidate).into()
    }

    /// First 8 bytes of SHA3-256 over the challenge, hex encoded.
    pub fn fingerprint(&self) -> String {
        let digest = Sha3_256::digest(&self.0);
        hex::encode(&digest[..8])
    }
}

/// Generate a default-length challenge from the operating system CSPRNG.
pub fn create_challenge() -> Result<Challenge> {
    Challenge::generate(&OsEntropy, DEFAULT_CHALLENGE_LEN)
}

impl std::fmt::Debug for Challenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Challenge")
            .field("len", &self.0.len())
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

impl std::fmt::Display for Challenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "challenge[{}B #{}]", self.0.len(), self.fingerprint())
    }
}

impl Serialize for Challenge {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_base64url())
    }
}

impl<'de> Deserialize<'de> for Challenge {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        encoding::base64url::deserialize(deserializer).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::MockEntropy;
    use crate::error::CeremonyError;
    use std::collections::HashSet;

    struct BrokenEntropy;

    impl EntropySource for BrokenEntropy {
        fn fill(&self, _dest: &mut [u8]) -> Result<()> {
            Err(CeremonyError::EntropySourceFailure("device unavailable".into()))
        }

        fn source_id(&self) -> crate::entropy::EntropySourceId {
            crate::entropy::EntropySourceId::OperatingSystem
        }
    }

    #[test]
    fn test_create_challenge_default_length() {
        let challenge = create_challenge().unwrap();
        assert_eq!(challenge.len(), DEFAULT_CHALLENGE_LEN);
    }

    #[test]
    fn test_consecutive_challenges_never_repeat() {
        let mut seen = HashSet::with_capacity(10_000);
        let mut previous: Option<Challenge> = None;
        for _ in 0..10_000 {
            let challenge = create_challenge().unwrap();
            if let Some(prev) = &previous {
                assert!(!prev.matches(challenge.as_bytes()));
            }
            assert!(seen.insert(challenge.as_bytes().to_vec()));
            previous = Some(challenge);
        }
    }

    #[test]
    fn test_short_challenge_rejected() {
        let err = Challenge::generate(&MockEntropy::default(), 8).unwrap_err();
        assert!(matches!(
            err,
            CeremonyError::Config(ConfigError::ChallengeTooShort(8))
        ));
    }

    #[test]
    fn test_entropy_failure_is_fatal() {
        let err = Challenge::generate(&BrokenEntropy, 32).unwrap_err();
        assert_eq!(err.code(), "ENTROPY_SOURCE_FAILURE");
    }

    #[test]
    fn test_matches_is_exact() {
        let challenge = Challenge::from_bytes(vec![7u8; 32]);
        assert!(challenge.matches(&[7u8; 32]));
        assert!(!challenge.matches(&[7u8; 31]));

        let mut last_differs = [7u8; 32];
        last_differs[31] = 8;
        assert!(!challenge.matches(&last_differs));
    }

    #[test]
    fn test_debug_hides_bytes() {
        let challenge = Challenge::from_bytes(vec![0xAB; 32]);
        let debug = format!("{challenge:?}");
        let display = challenge.to_string();
        assert!(!debug.contains(&challenge.to_base64url()));
        assert!(!display.contains(&challenge.to_base64url()));
        assert!(debug.contains("len: 32"));
        assert_eq!(challenge.fingerprint().len(), 16);
    }

    #[test]
    fn test_serde_uses_base64url() {
        let challenge = Challenge::from_bytes(vec![0xfb, 0xff, 0xfe]);
        let json = serde_json::to_string(&challenge).unwrap();
        assert_eq!(json, "\"-__-\"");

        let back: Challenge = serde_json::from_str("\"+//+\"").unwrap();
        assert_eq!(back.as_bytes(), challenge.as_bytes());
    }
}

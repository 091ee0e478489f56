//! Operating system CSPRNG.

use super::{EntropySource, EntropySourceId};
use crate::error::{CeremonyError, Result};

/// Entropy from the operating system (`getrandom`).
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        getrandom::fill(dest).map_err(|e| CeremonyError::EntropySourceFailure(e.to_string()))
    }

    fn source_id(&self) -> EntropySourceId {
        EntropySourceId::OperatingSystem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_os_entropy_fills_buffer() {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        OsEntropy.fill(&mut a).unwrap();
        OsEntropy.fill(&mut b).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_os_entropy_never_repeats() {
        let mut seen = HashSet::with_capacity(10_000);
        for _ in 0..10_000 {
            let mut buf = [0u8; 16];
            OsEntropy.fill(&mut buf).unwrap();
            assert!(seen.insert(buf), "16-byte output repeated");
        }
    }

    #[test]
    fn test_os_source_id() {
        assert_eq!(OsEntropy.source_id(), EntropySourceId::OperatingSystem);
    }
}

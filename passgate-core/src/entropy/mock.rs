//! Mock entropy for testing.

use std::sync::atomic::{AtomicU64, Ordering};

use sha3::{Digest, Sha3_256};

use super::{EntropySource, EntropySourceId};
use crate::error::Result;

/// Deterministic entropy stream for tests.
/// WARNING: Do not use in production - output is predictable from the seed!
///
/// Each call advances an internal counter, so consecutive challenges differ
/// while two mocks with the same seed replay the same sequence.
pub struct MockEntropy {
    seed: u64,
    counter: AtomicU64,
}

impl MockEntropy {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            counter: AtomicU64::new(0),
        }
    }

    /// Create a mock with default seed for simple tests.
    pub fn default_test() -> Self {
        Self::new(0xDEADBEEF_CAFEBABE)
    }

    fn block(&self, index: u64) -> [u8; 32] {
        let mut hasher = Sha3_256::new();
        hasher.update(self.seed.to_le_bytes());
        hasher.update(index.to_le_bytes());
        hasher.update(b"passgate-mock-entropy");
        hasher.finalize().into()
    }
}

impl Default for MockEntropy {
    fn default() -> Self {
        Self::default_test()
    }
}

impl EntropySource for MockEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        for chunk in dest.chunks_mut(32) {
            let index = self.counter.fetch_add(1, Ordering::Relaxed);
            let block = self.block(index);
            chunk.copy_from_slice(&block[..chunk.len()]);
        }
        Ok(())
    }

    fn source_id(&self) -> EntropySourceId {
        EntropySourceId::Mock
    }
}

impl std::fmt::Debug for MockEntropy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockEntropy")
            .field("seed", &self.seed)
            .field("counter", &self.counter.load(Ordering::Relaxed))
            .finish()
    }
}

//! Entropy sources for ceremony challenges.
//!
//! Every challenge must come from a cryptographically secure source. A failing
//! source aborts the ceremony; there is no fallback to a weaker generator.
//!
//! - **OS** - the operating system CSPRNG (default)
//! - **Mock** - deterministic stream for tests only

mod mock;
mod os;

pub use mock::MockEntropy;
pub use os::OsEntropy;

use crate::error::Result;

/// Trait for challenge entropy sources.
///
/// Implementations must be thread-safe (`Send + Sync`) since a single
/// relying party serves concurrent ceremonies.
pub trait EntropySource: Send + Sync {
    /// Fill `dest` entirely with random bytes.
    fn fill(&self, dest: &mut [u8]) -> Result<()>;

    /// Identifies the source in logs.
    fn source_id(&self) -> EntropySourceId;
}

/// Identifies an entropy source for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntropySourceId {
    /// Operating system CSPRNG
    OperatingSystem,
    /// Mock source for testing only (NOT secure!)
    Mock,
}

impl std::fmt::Display for EntropySourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OperatingSystem => write!(f, "OS CSPRNG"),
            Self::Mock => write!(f, "Mock (NOT SECURE)"),
        }
    }
}

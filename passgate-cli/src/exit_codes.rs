//! Exit codes following sysexits.h conventions.
//!
//! These codes let scripts tell a rejected ceremony apart from a bad
//! invocation or a missing file.

use passgate_core::{CeremonyError, ConfigError, ParseError, VerificationError};

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (invalid arguments or settings).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Data format error (malformed response, failed ceremony gate).
/// Maps to EX_DATAERR from sysexits.h.
pub const VERIFICATION_FAILED: i32 = 65;

/// Cannot open input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Service unavailable (entropy source).
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const UNAVAILABLE: i32 = 69;

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub const fn success() -> Self {
        Self {
            code: SUCCESS,
            message: None,
        }
    }

    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        // Classify error by inspecting the chain
        let code = err
            .chain()
            .find_map(|cause| {
                if cause.is::<std::io::Error>() {
                    Some(INPUT_ERROR)
                } else if cause.is::<VerificationError>() || cause.is::<ParseError>() {
                    Some(VERIFICATION_FAILED)
                } else if cause.is::<ConfigError>() {
                    Some(USAGE_ERROR)
                } else {
                    cause.downcast_ref::<CeremonyError>().map(|e| match e {
                        CeremonyError::BadRequest(_) | CeremonyError::Verification(_) => VERIFICATION_FAILED,
                        CeremonyError::Config(_) => USAGE_ERROR,
                        CeremonyError::EntropySourceFailure(_) => UNAVAILABLE,
                    })
                }
            })
            .unwrap_or(GENERAL_ERROR);

        Self {
            code,
            message: Some(message),
        }
    }
}

//! Ceremony session storage
//!
//! Sessions are short-lived (the ceremony timeout) and single use, so they are
//! kept in memory only. A session is removed from the store before it is
//! verified; a second finish request with the same id finds nothing.

mod memory;

pub use memory::{MemorySessionStore, PendingCeremony};

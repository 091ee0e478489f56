//! Subcommand implementations.

pub mod challenge;
pub mod client_data;
pub mod inspect;

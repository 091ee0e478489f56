#![no_main]

//! Fuzz target for parse_response()
//!
//! Both ceremony shapes are tried on every input. Parsing must reject
//! garbage with a ParseError and never panic.
//!
//! Run with: cargo +nightly fuzz run fuzz_parse_response

use libfuzzer_sys::fuzz_target;
use passgate_core::{parse_response, CeremonyType, RawRequest};

fuzz_target!(|data: &[u8]| {
    let request = RawRequest::new(data);
    let _ = parse_response(&request, CeremonyType::Assert);
    let _ = parse_response(&request, CeremonyType::Create);
});

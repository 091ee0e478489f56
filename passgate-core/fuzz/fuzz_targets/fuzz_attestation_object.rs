#![no_main]

//! Fuzz target for AttestationObject::from_cbor() and AuthenticatorData::from_bytes()
//!
//! Run with: cargo +nightly fuzz run fuzz_attestation_object

use libfuzzer_sys::fuzz_target;
use passgate_core::response::AttestationObject;
use passgate_core::AuthenticatorData;

fuzz_target!(|data: &[u8]| {
    let _ = AuthenticatorData::from_bytes(data);
    let _ = AttestationObject::from_cbor(data);
});

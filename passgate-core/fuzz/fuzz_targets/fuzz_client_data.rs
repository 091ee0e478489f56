#![no_main]

//! Fuzz target for CollectedClientData parsing and verification
//!
//! Arbitrary clientDataJSON is parsed and, when it parses, run through every
//! verification gate against a fixed challenge and origin.
//!
//! Run with: cargo +nightly fuzz run fuzz_client_data

use libfuzzer_sys::fuzz_target;
use passgate_core::{
    AllowedOrigins, CeremonyType, Challenge, ClientDataPolicy, CollectedClientData, ConnectionTokenBinding,
    TokenBindingPolicy,
};
use url::Url;

fuzz_target!(|data: &[u8]| {
    let Ok(client_data) = CollectedClientData::from_json(data) else {
        return;
    };

    let Ok(origin) = Url::parse("https://example.com") else {
        return;
    };
    let Ok(origins) = AllowedOrigins::new(&[origin]) else {
        return;
    };
    let policy = ClientDataPolicy {
        origins,
        token_binding: TokenBindingPolicy::Optional,
    };
    let challenge = Challenge::from_bytes(vec![0x42; 32]);

    for ceremony in [CeremonyType::Assert, CeremonyType::Create] {
        let _ = client_data.verify(&challenge, ceremony, &policy, &ConnectionTokenBinding::Unknown);
        let _ = client_data.verify(
            &challenge,
            ceremony,
            &policy,
            &ConnectionTokenBinding::Present(vec![1, 2, 3]),
        );
    }
});

// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Fuzz tests for request decoding and dispatch, across every provider and
//! both dialects.
//!
//! Arbitrary calls must never panic, and a call that is rejected must not
//! produce a response.

#![no_main]

use libfuzzer_sys::arbitrary;
use libfuzzer_sys::fuzz_target;

use trustsvc::crypto::key::KeyStore;
use trustsvc::crypto::ring;
use trustsvc::protocol::Encoding;
use trustsvc::protocol::PackedC;
use trustsvc::protocol::Schema;
use trustsvc::provider::aead::Aead;
use trustsvc::provider::cipher::Cipher;
use trustsvc::provider::hash::Hash;
use trustsvc::provider::key_derivation::KeyDerivation;
use trustsvc::provider::keys::Keys;
use trustsvc::provider::mac::Mac;
use trustsvc::rpc::Buffer;
use trustsvc::rpc::CallRequest;
use trustsvc::rpc::Service as _;
use trustsvc::service::Options;
use trustsvc::service::ServiceProvider;

#[derive(Debug, arbitrary::Arbitrary)]
struct Call {
    client_id: u32,
    opcode: u16,
    schema: bool,
    request: Vec<u8>,
}

fuzz_target!(|calls: Vec<Call>| {
    let backend = ring::Backend::new();
    let rng = ring::csrng::Csrng::new();
    let store = KeyStore::<4>::new();

    let mut keys = Keys::new(&store, &rng);
    let mut hash: Hash<_, 2> = Hash::new(&backend);
    let mut mac: Mac<_, 2> = Mac::new(&backend, &store);
    let mut cipher: Cipher<_, 2> = Cipher::new(&backend, &store, &rng);
    let mut aead: Aead<_, 2> = Aead::new(&backend, &store, &rng);
    let mut kdf: KeyDerivation<_, 2> = KeyDerivation::new(&backend, &store);

    keys.register_serializer(Encoding::PackedC, &PackedC);
    keys.register_serializer(Encoding::Schema, &Schema);
    hash.register_serializer(Encoding::PackedC, &PackedC);
    hash.register_serializer(Encoding::Schema, &Schema);
    mac.register_serializer(Encoding::PackedC, &PackedC);
    mac.register_serializer(Encoding::Schema, &Schema);
    cipher.register_serializer(Encoding::PackedC, &PackedC);
    cipher.register_serializer(Encoding::Schema, &Schema);
    aead.register_serializer(Encoding::PackedC, &PackedC);
    aead.register_serializer(Encoding::Schema, &Schema);
    kdf.register_serializer(Encoding::PackedC, &PackedC);
    kdf.register_serializer(Encoding::Schema, &Schema);

    let mut endpoint = ServiceProvider::<6>::new(&mut keys, Options::default());
    let _ = endpoint.extend(&mut hash);
    let _ = endpoint.extend(&mut mac);
    let _ = endpoint.extend(&mut cipher);
    let _ = endpoint.extend(&mut aead);
    let _ = endpoint.extend(&mut kdf);

    let mut response = [0; 2048];
    for c in calls.iter().take(16) {
        let encoding = if c.schema {
            Encoding::Schema
        } else {
            Encoding::PackedC
        };
        let mut call = CallRequest {
            client_id: c.client_id % 4,
            interface_id: 0,
            opcode: c.opcode,
            encoding,
            op_status: 0,
            request: &c.request,
            response: Buffer::new(&mut response),
        };
        if endpoint.receive(&mut call).is_err() {
            assert!(call.response.is_empty());
        }
    }
});

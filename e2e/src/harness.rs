// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! An in-process crypto service, and clients to talk to it.
//!
//! Every provider borrows the same [`World`], and the endpoint borrows the
//! providers, so the stack is built inside [`with_endpoint()`] and handed to
//! a closure rather than returned.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use trustsvc::client::Crypto;
use trustsvc::crypto::key::KeyStore;
use trustsvc::crypto::ring;
use trustsvc::protocol::Codec;
use trustsvc::protocol::Encoding;
use trustsvc::protocol::PackedC;
use trustsvc::protocol::Schema;
use trustsvc::provider::aead::Aead;
use trustsvc::provider::cipher::Cipher;
use trustsvc::provider::hash::Hash;
use trustsvc::provider::key_derivation::KeyDerivation;
use trustsvc::provider::keys::Keys;
use trustsvc::provider::mac::Mac;
use trustsvc::rpc::direct::Direct;
use trustsvc::rpc::logging::Logging;
use trustsvc::rpc::session::Session;
use trustsvc::rpc::session::SessionOptions;
use trustsvc::rpc::Caller;
use trustsvc::rpc::Service;
use trustsvc::service;
use trustsvc::service::ServiceProvider;

/// The number of keys the harness's store can hold.
pub const KEY_SLOTS: usize = 32;

/// Options for a harness run, usually read from a JSON file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Options for the service endpoint.
    pub endpoint: service::Options,
    /// Options for every client session; the caller id and encoding are
    /// overridden per client.
    pub session: SessionOptions,
    /// Whether to stack a logging caller on top of each session.
    pub log_calls: bool,
}

impl Config {
    /// Reads a config from a JSON file.
    pub fn load(path: &Path) -> Result<Self, String> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("could not read {}: {}", path.display(), e))?;
        serde_json::from_str(&text)
            .map_err(|e| format!("could not parse {}: {}", path.display(), e))
    }

    /// Returns the number of bytes of shared memory each session gets.
    pub fn shared_memory(&self) -> usize {
        // Room for both directions, plus their framing headers.
        2 * (self.session.shared_memory_size + 64)
    }
}

/// State shared by every provider.
pub struct World {
    pub backend: ring::Backend,
    pub rng: ring::csrng::Csrng,
    pub store: KeyStore<KEY_SLOTS>,
}

impl World {
    /// Creates a world with an empty key store.
    pub fn new() -> Self {
        Self {
            backend: ring::Backend::new(),
            rng: ring::csrng::Csrng::new(),
            store: KeyStore::new(),
        }
    }
}

macro_rules! register_all {
    ($($provider:ident),*) => {
        for &encoding in &Encoding::ALL {
            match encoding {
                Encoding::PackedC => {
                    $($provider.register_serializer(encoding, &PackedC);)*
                }
                Encoding::Schema => {
                    $($provider.register_serializer(encoding, &Schema);)*
                }
            }
        }
    };
}

/// Builds every provider over `world`, merges them into one endpoint, and
/// hands that endpoint to `f`.
pub fn with_endpoint<R>(
    world: &World,
    opts: service::Options,
    f: impl FnOnce(&mut dyn Service) -> R,
) -> R {
    let mut keys = Keys::new(&world.store, &world.rng);
    let mut hash: Hash<_> = Hash::new(&world.backend);
    let mut mac: Mac<_> = Mac::new(&world.backend, &world.store);
    let mut cipher: Cipher<_> =
        Cipher::new(&world.backend, &world.store, &world.rng);
    let mut aead: Aead<_> = Aead::new(&world.backend, &world.store, &world.rng);
    let mut kdf: KeyDerivation<_> =
        KeyDerivation::new(&world.backend, &world.store);
    register_all!(keys, hash, mac, cipher, aead, kdf);

    let mut endpoint = ServiceProvider::<6>::new(&mut keys, opts);
    endpoint.extend(&mut hash).expect("hash opcodes overlap");
    endpoint.extend(&mut mac).expect("mac opcodes overlap");
    endpoint.extend(&mut cipher).expect("cipher opcodes overlap");
    endpoint.extend(&mut aead).expect("aead opcodes overlap");
    endpoint.extend(&mut kdf).expect("key derivation opcodes overlap");
    log::info!("endpoint ready on interface {}", opts.interface_id);

    f(&mut endpoint)
}

/// The client type handed out by [`connect()`].
pub type Client<'c, K> = Crypto<&'c mut dyn Caller, K>;

/// Opens a session to `service` as `caller_id`, speaking `codec`, and hands
/// a client over it to `f`.
pub fn connect<K: Codec + Copy, R>(
    service: &mut dyn Service,
    config: &Config,
    caller_id: u32,
    codec: K,
    f: impl FnOnce(&mut Client<'_, K>) -> R,
) -> R {
    let mut memory = vec![0; config.shared_memory()];
    let opts = SessionOptions {
        caller_id,
        encoding: codec.encoding(),
        ..config.session
    };
    let mut session = Session::open(Direct::new(service), &mut memory, opts)
        .expect("could not open session");

    let result = if config.log_calls {
        let mut logging = Logging::over(&mut session);
        f(&mut Crypto::new(&mut logging as &mut dyn Caller, codec))
    } else {
        f(&mut Crypto::new(&mut session as &mut dyn Caller, codec))
    };
    session.close().expect("could not close session");
    result
}

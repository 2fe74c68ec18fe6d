// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

#![deny(warnings)]
#![deny(unused)]
#![deny(unsafe_code)]
//#![deny(missing_docs)]

use std::path::PathBuf;
use std::process;

use structopt::StructOpt;

use trustsvc::crypto::alg;
use trustsvc::crypto::key;
use trustsvc::crypto::key::Usage;
use trustsvc::protocol::keys::KeyAttributes;
use trustsvc::protocol::Codec;
use trustsvc::protocol::Encoding;
use trustsvc::protocol::PackedC;
use trustsvc::protocol::Schema;

pub mod harness;

#[cfg(test)]
mod tests;

use harness::Client;
use harness::Config;
use harness::World;

#[derive(Debug, StructOpt)]
enum Options {
    /// Runs a smoke test of every operation family against an in-process
    /// endpoint.
    Smoke {
        /// A JSON file of harness options.
        #[structopt(long, parse(from_os_str))]
        config: Option<PathBuf>,
        /// The dialect to speak.
        #[structopt(long, default_value = "PackedC")]
        encoding: Encoding,
    },
    /// Prints the default harness options as JSON.
    DefaultConfig,
}

fn main() {
    env_logger::init();
    match Options::from_args() {
        Options::Smoke { config, encoding } => {
            let config = match config {
                Some(path) => Config::load(&path).unwrap_or_else(|e| {
                    eprintln!("{}", e);
                    process::exit(1)
                }),
                None => Config::default(),
            };

            let world = World::new();
            harness::with_endpoint(&world, config.endpoint, |service| {
                match encoding {
                    Encoding::PackedC => harness::connect(
                        service,
                        &config,
                        1,
                        PackedC,
                        smoke,
                    ),
                    Encoding::Schema => {
                        harness::connect(service, &config, 1, Schema, smoke)
                    }
                }
            });
            eprintln!("smoke test passed");
        }
        Options::DefaultConfig => {
            let json = serde_json::to_string_pretty(&Config::default())
                .expect("config should serialize");
            println!("{}", json);
        }
    }
}

fn smoke<K: Codec>(client: &mut Client<'_, K>) {
    let h = client.hash_setup(alg::SHA_256).unwrap();
    client.hash_update(h, b"abc").unwrap();
    let mut digest = [0; 32];
    client.hash_finish(h, &mut digest).unwrap();
    log::info!("sha256(\"abc\") = {:02x?}", digest);

    let key = client
        .generate_key(&KeyAttributes {
            key_type: key::types::AES,
            key_bits: 128,
            lifetime: key::LIFETIME_VOLATILE,
            id: 0,
            usage: (Usage::Encrypt | Usage::Decrypt).bits(),
            alg: alg::GCM,
        })
        .unwrap();

    let msg = b"smoke test message";
    let h = client.aead_encrypt_setup(key, alg::GCM).unwrap();
    let mut nonce = [0; 12];
    client.aead_generate_nonce(h, &mut nonce).unwrap();
    client.aead_update(h, msg, &mut []).unwrap();
    let mut ct = [0; 64];
    let mut tag = [0; 16];
    let (len, _) = client.aead_finish(h, &mut ct, &mut tag).unwrap();

    let h = client.aead_decrypt_setup(key, alg::GCM).unwrap();
    client.aead_set_nonce(h, &nonce).unwrap();
    client.aead_update(h, &ct[..len], &mut []).unwrap();
    let mut pt = [0; 64];
    let len = client.aead_verify(h, &tag, &mut pt).unwrap();
    assert_eq!(&pt[..len], &msg[..]);
    client.destroy_key(key).unwrap();
}

// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Implementations of crypto traits, using the [`ring`] crate.
//!
//! This module provides a software [`Backend`] for every operation family
//! in [`crypto`], suitable for hosted builds, tests, and tools that talk to
//! a `trustsvc` integration. Unauthenticated cipher modes, which `ring`
//! does not offer, are built on the `aes` crate instead.
//!
//! Types in this module, much like those in [`crypto`], should not be
//! imported directly. Instead, names such as `ring::hash::Engine` should be
//! used.
//!
//! The [`ring` warranty disclaimer] applies to this module as well.
//!
//! [`ring` warranty disclaimer]: https://github.com/briansmith/ring/blob/main/README.md

pub mod aead;
pub mod cipher;
#[cfg(feature = "std")]
pub mod csrng;
pub mod hash;
pub mod kdf;

use crate::crypto;
use crate::crypto::alg;
use crate::crypto::Error;
use crate::Result;

pub use ring::error::Unspecified;

/// A software backend for every operation family.
///
/// This type is stateless; operations in flight live entirely in the
/// engines it hands out.
#[derive(Copy, Clone, Default, Debug)]
pub struct Backend;

impl Backend {
    /// Creates a new backend.
    pub fn new() -> Self {
        Self
    }
}

impl crypto::hash::Builder for Backend {
    type Engine = hash::Engine;

    fn new_hash(&self, algo: crypto::hash::Algo) -> Result<hash::Engine, Error> {
        Ok(hash::Engine::hash(algo))
    }

    fn new_hmac(
        &self,
        algo: crypto::hash::Algo,
        key: &[u8],
    ) -> Result<hash::Engine, Error> {
        Ok(hash::Engine::hmac(algo, key))
    }
}

impl crypto::cipher::Builder for Backend {
    type Engine = cipher::Engine;

    fn new_cipher(
        &self,
        mode: crypto::cipher::Mode,
        direction: crypto::cipher::Direction,
        key_type: u32,
        key: &[u8],
    ) -> Result<cipher::Engine, Error> {
        cipher::Engine::new(mode, direction, key_type, key)
    }
}

impl crypto::aead::Builder for Backend {
    type Engine = aead::Engine;

    fn new_aead(
        &self,
        algo: crypto::aead::Algo,
        direction: crypto::cipher::Direction,
        key_type: u32,
        key: &[u8],
    ) -> Result<aead::Engine, Error> {
        aead::Engine::new(algo, direction, key_type, key)
    }
}

impl crypto::kdf::Builder for Backend {
    type Engine = kdf::Engine;

    fn new_kdf(&self, alg: u32) -> Result<kdf::Engine, Error> {
        check!(alg::is_hkdf(alg), Error::NotSupported);
        match crypto::hash::Algo::from_alg(alg::underlying_hash(alg)) {
            Some(algo) => Ok(kdf::Engine::hkdf(algo)),
            None => Err(fail!(Error::NotSupported)),
        }
    }
}

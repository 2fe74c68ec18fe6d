// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Authenticated encryption with associated data.

use crate::crypto::alg;
use crate::crypto::cipher::Direction;
use crate::crypto::Error;

/// The tag length of every supported algorithm.
pub const TAG_LEN: usize = 16;

/// An AEAD algorithm.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Algo {
    /// AES-GCM.
    AesGcm,
    /// ChaCha20-Poly1305.
    ChaCha20Poly1305,
}

impl Algo {
    /// Parses an AEAD algorithm identifier.
    pub fn from_alg(alg: u32) -> Option<Self> {
        match alg {
            alg::GCM => Some(Self::AesGcm),
            alg::CHACHA20_POLY1305 => Some(Self::ChaCha20Poly1305),
            _ => None,
        }
    }
}

/// An AEAD engine, which holds the state of one operation in flight.
///
/// The nonce must be set first. If lengths are declared with
/// [`Engine::set_lengths()`], the operation fails at completion unless
/// exactly that much data went through it.
///
/// An engine may buffer all of its input until completion, in which case
/// [`Engine::update()`] produces no output.
pub trait Engine {
    /// Returns the required nonce length.
    fn nonce_len(&self) -> usize;

    /// Sets the nonce.
    fn set_nonce(&mut self, nonce: &[u8]) -> crate::Result<(), Error>;

    /// Declares the total associated data and plaintext lengths.
    fn set_lengths(
        &mut self,
        ad_len: usize,
        plaintext_len: usize,
    ) -> crate::Result<(), Error>;

    /// Adds associated data. Not allowed once `update()` has been called.
    fn update_ad(&mut self, ad: &[u8]) -> crate::Result<(), Error>;

    /// Processes `input`, writing whatever output is ready to `out`.
    ///
    /// Returns the number of bytes written.
    fn update(
        &mut self,
        input: &[u8],
        out: &mut [u8],
    ) -> crate::Result<usize, Error>;

    /// Completes an encryption, writing the rest of the ciphertext and the
    /// tag.
    ///
    /// Returns the ciphertext and tag lengths.
    fn finish(
        &mut self,
        ciphertext: &mut [u8],
        tag: &mut [u8],
    ) -> crate::Result<(usize, usize), Error>;

    /// Completes a decryption, checking `tag` and writing the rest of the
    /// plaintext.
    ///
    /// Returns the plaintext length. No plaintext is released if the tag
    /// does not match.
    fn verify(
        &mut self,
        tag: &[u8],
        plaintext: &mut [u8],
    ) -> crate::Result<usize, Error>;
}

// Ensure Engine is object-safe.
impl dyn Engine {}

/// Starts AEAD operations.
pub trait Builder {
    /// The engine type this builder produces.
    type Engine: Engine;

    /// Begins a new AEAD operation with a key of type `key_type`.
    fn new_aead(
        &self,
        algo: Algo,
        direction: Direction,
        key_type: u32,
        key: &[u8],
    ) -> crate::Result<Self::Engine, Error>;
}

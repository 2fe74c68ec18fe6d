// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Unauthenticated block cipher modes.

use crate::crypto::alg;
use crate::crypto::Error;

/// The block length of every supported cipher.
pub const BLOCK_LEN: usize = 16;

/// A block cipher mode.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Mode {
    /// Counter mode.
    Ctr,
    /// CBC, with no padding.
    CbcNoPadding,
    /// CBC, with PKCS#7 padding.
    CbcPkcs7,
}

impl Mode {
    /// Parses a cipher algorithm identifier.
    pub fn from_alg(alg: u32) -> Option<Self> {
        match alg {
            alg::CTR => Some(Self::Ctr),
            alg::CBC_NO_PADDING => Some(Self::CbcNoPadding),
            alg::CBC_PKCS7 => Some(Self::CbcPkcs7),
            _ => None,
        }
    }
}

/// Whether an operation encrypts or decrypts.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Direction {
    /// Plaintext in, ciphertext out.
    Encrypt,
    /// Ciphertext in, plaintext out.
    Decrypt,
}

/// A cipher engine, which holds the state of one operation in flight.
///
/// An IV must be set before any data is processed, and may only be set
/// once.
pub trait Engine {
    /// Returns the required IV length.
    fn iv_len(&self) -> usize;

    /// Sets the IV.
    fn set_iv(&mut self, iv: &[u8]) -> crate::Result<(), Error>;

    /// Processes `input`, writing whatever output is ready to `out`.
    ///
    /// At most `input.len() + BLOCK_LEN` bytes are written; returns the
    /// number actually written.
    fn update(
        &mut self,
        input: &[u8],
        out: &mut [u8],
    ) -> crate::Result<usize, Error>;

    /// Completes the operation, flushing any buffered input to `out`.
    ///
    /// At most `BLOCK_LEN` bytes are written; returns the number actually
    /// written.
    fn finish(&mut self, out: &mut [u8]) -> crate::Result<usize, Error>;
}

// Ensure Engine is object-safe.
impl dyn Engine {}

/// Starts cipher operations.
pub trait Builder {
    /// The engine type this builder produces.
    type Engine: Engine;

    /// Begins a new cipher operation with a key of type `key_type`.
    fn new_cipher(
        &self,
        mode: Mode,
        direction: Direction,
        key_type: u32,
        key: &[u8],
    ) -> crate::Result<Self::Engine, Error>;
}

// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Multi-step key derivation.
//!
//! A derivation is fed its inputs one step at a time (see
//! [`alg::step`](crate::crypto::alg::step)), then read out, possibly over
//! several calls, until its capacity is used up. Once output has begun, no
//! more input is accepted.

use crate::crypto::Error;

/// A key derivation engine, which holds the state of one derivation.
pub trait Engine {
    /// Supplies the input for `step`.
    fn input(&mut self, step: u32, data: &[u8]) -> crate::Result<(), Error>;

    /// Returns how many more bytes may be output.
    fn capacity(&self) -> usize;

    /// Lowers the capacity; raising it is an error.
    fn set_capacity(&mut self, capacity: usize) -> crate::Result<(), Error>;

    /// Fills `out` with the next derived bytes.
    ///
    /// Fails with [`Error::InsufficientData`] if that would exceed the
    /// capacity, and with [`Error::BadState`] if required inputs are
    /// missing.
    fn output(&mut self, out: &mut [u8]) -> crate::Result<(), Error>;
}

// Ensure Engine is object-safe.
impl dyn Engine {}

/// Starts key derivations.
pub trait Builder {
    /// The engine type this builder produces.
    type Engine: Engine;

    /// Begins a new derivation with algorithm `alg`.
    fn new_kdf(&self, alg: u32) -> crate::Result<Self::Engine, Error>;
}

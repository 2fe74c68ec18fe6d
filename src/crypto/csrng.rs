// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Cryptographic random numbers.

use crate::crypto::Error;

/// A cryptographically-secure random number generator.
///
/// The sole purpose of this type is to fill buffers with random bytes, for
/// key generation, IVs and nonces.
///
/// `Csrng`s must already be seeded with sufficient entropy; creating new
/// random number generators is beyond the scope of this trait.
pub trait Csrng {
    /// Fills `buf` with random bytes.
    ///
    /// Fails with [`Error::InsufficientEntropy`] if the generator cannot
    /// currently produce output.
    fn fill(&self, buf: &mut [u8]) -> crate::Result<(), Error>;
}
impl dyn Csrng {} // Ensure object-safe.

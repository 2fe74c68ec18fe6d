// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Cryptographic hashing, including HMAC construction.
//!
//! In general, users of this module should be pulling in [`EngineExt`],
//! which adds functions to [`Engine`] for more ergonomic usage, but which
//! would otherwise make it object-unsafe.

use crate::crypto::alg;
use crate::crypto::Error;

/// A cryptographic hashing algorithm.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Algo {
    /// 256-bit SHA-2.
    Sha256,
    /// 384-bit SHA-2.
    Sha384,
    /// 512-bit SHA-2.
    Sha512,
}

/// The length of the largest digest of any [`Algo`].
pub const MAX_DIGEST_LEN: usize = 64;

impl Algo {
    /// The number of bits in a digest or HMAC of this strength.
    #[inline]
    pub const fn bits(self) -> usize {
        match self {
            Self::Sha256 => 256,
            Self::Sha384 => 384,
            Self::Sha512 => 512,
        }
    }

    /// The number of bytes in a digest or HMAC of this strength.
    #[inline]
    pub const fn bytes(self) -> usize {
        self.bits() / 8
    }

    /// Parses a hash algorithm identifier.
    pub fn from_alg(alg: u32) -> Option<Self> {
        match alg {
            alg::SHA_256 => Some(Self::Sha256),
            alg::SHA_384 => Some(Self::Sha384),
            alg::SHA_512 => Some(Self::Sha512),
            _ => None,
        }
    }

    /// Returns the identifier of this algorithm.
    pub fn alg(self) -> u32 {
        match self {
            Self::Sha256 => alg::SHA_256,
            Self::Sha384 => alg::SHA_384,
            Self::Sha512 => alg::SHA_512,
        }
    }
}

/// A hashing engine, which holds the state of one digest or HMAC in flight.
///
/// Cloning an engine forks the computation: both copies continue from the
/// same input.
pub trait Engine {
    /// Returns the length of this engine's output.
    fn output_len(&self) -> usize;

    /// Adds `data` to the hashing state.
    fn update(&mut self, data: &[u8]) -> crate::Result<(), Error>;

    /// Completes the hashing/HMAC operation, writing the result to `out`.
    ///
    /// Returns the number of bytes written. Calling this function again has
    /// an unspecified effect.
    fn finish(&mut self, out: &mut [u8]) -> crate::Result<usize, Error>;
}

// Ensure Engine is object-safe.
impl dyn Engine {}

/// Helpers for an [`Engine`].
#[extend::ext(name = EngineExt)]
pub impl<E: Engine + ?Sized> E {
    /// Completes the hashing/HMAC operation, and compares the result to
    /// `expected` in constant time.
    ///
    /// Implementers do not need to implement this function themselves.
    fn verify(&mut self, expected: &[u8]) -> crate::Result<(), Error> {
        let mut actual = [0; MAX_DIGEST_LEN];
        let len = self.finish(&mut actual)?;
        check!(
            ct_eq(&actual[..len], expected),
            Error::InvalidSignature
        );
        Ok(())
    }
}

/// Compares two byte strings without branching on their contents.
pub(crate) fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Starts hashing operations.
pub trait Builder {
    /// The engine type this builder produces.
    type Engine: Engine + Clone;

    /// Begins a new hashing operation.
    fn new_hash(&self, algo: Algo) -> crate::Result<Self::Engine, Error>;

    /// Begins a new HMAC operation, keyed with `key`.
    fn new_hmac(
        &self,
        algo: Algo,
        key: &[u8],
    ) -> crate::Result<Self::Engine, Error>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn algo_ids() {
        for algo in [Algo::Sha256, Algo::Sha384, Algo::Sha512] {
            assert_eq!(Algo::from_alg(algo.alg()), Some(algo));
            assert!(algo.bytes() <= MAX_DIGEST_LEN);
        }
        assert_eq!(Algo::from_alg(alg::hmac(alg::SHA_256)), None);
    }

    #[test]
    fn constant_time_eq() {
        assert!(ct_eq(b"abc", b"abc"));
        assert!(!ct_eq(b"abc", b"abd"));
        assert!(!ct_eq(b"abc", b"ab"));
    }
}

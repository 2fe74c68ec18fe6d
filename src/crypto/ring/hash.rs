// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Implementations of [`crypto::hash`] based on `ring`.

use core::mem;

use ring::digest;
use ring::hmac;

use crate::crypto::hash;
use crate::crypto::Error;
use crate::Result;

#[cfg(doc)]
use crate::crypto;

/// A `ring`-based [`hash::Engine`].
#[derive(Clone)]
pub struct Engine {
    inner: Inner,
    output_len: usize,
}

#[derive(Clone)]
enum Inner {
    Idle,
    Hash(digest::Context),
    Hmac(hmac::Context),
}

impl Engine {
    /// Begins a new hash.
    pub fn hash(algo: hash::Algo) -> Self {
        Self {
            inner: Inner::Hash(digest::Context::new(match algo {
                hash::Algo::Sha256 => &digest::SHA256,
                hash::Algo::Sha384 => &digest::SHA384,
                hash::Algo::Sha512 => &digest::SHA512,
            })),
            output_len: algo.bytes(),
        }
    }

    /// Begins a new HMAC, keyed with `key`.
    pub fn hmac(algo: hash::Algo, key: &[u8]) -> Self {
        let key = hmac::Key::new(hmac_algorithm(algo), key);
        Self {
            inner: Inner::Hmac(hmac::Context::with_key(&key)),
            output_len: algo.bytes(),
        }
    }
}

pub(crate) fn hmac_algorithm(algo: hash::Algo) -> hmac::Algorithm {
    match algo {
        hash::Algo::Sha256 => hmac::HMAC_SHA256,
        hash::Algo::Sha384 => hmac::HMAC_SHA384,
        hash::Algo::Sha512 => hmac::HMAC_SHA512,
    }
}

impl hash::Engine for Engine {
    fn output_len(&self) -> usize {
        self.output_len
    }

    fn update(&mut self, data: &[u8]) -> Result<(), Error> {
        match &mut self.inner {
            Inner::Idle => return Err(fail!(Error::BadState)),
            Inner::Hash(c) => c.update(data),
            Inner::Hmac(c) => c.update(data),
        }
        Ok(())
    }

    fn finish(&mut self, out: &mut [u8]) -> Result<usize, Error> {
        check!(out.len() >= self.output_len, Error::BufferTooSmall);
        let out = &mut out[..self.output_len];
        match mem::replace(&mut self.inner, Inner::Idle) {
            Inner::Idle => return Err(fail!(Error::BadState)),
            Inner::Hash(c) => out.copy_from_slice(c.finish().as_ref()),
            Inner::Hmac(c) => out.copy_from_slice(c.sign().as_ref()),
        }
        Ok(self.output_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::Algo;
    use crate::crypto::hash::Engine as _;
    use crate::crypto::hash::EngineExt as _;
    use testutil::data::misc_crypto;

    #[test]
    #[cfg_attr(miri, ignore)]
    fn sha2() {
        for (algo, expected) in [
            (Algo::Sha256, misc_crypto::ABC_SHA256),
            (Algo::Sha384, misc_crypto::ABC_SHA384),
            (Algo::Sha512, misc_crypto::ABC_SHA512),
        ] {
            let mut digest = [0; hash::MAX_DIGEST_LEN];
            let mut e = Engine::hash(algo);
            e.update(b"a").unwrap();
            e.update(b"bc").unwrap();
            let len = e.finish(&mut digest).unwrap();
            assert_eq!(&digest[..len], expected);
            assert!(e.update(b"more").is_err());
        }
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn hmac() {
        for (algo, expected) in [
            (Algo::Sha256, misc_crypto::JEFE_HMAC_SHA256),
            (Algo::Sha384, misc_crypto::JEFE_HMAC_SHA384),
            (Algo::Sha512, misc_crypto::JEFE_HMAC_SHA512),
        ] {
            let mut e = Engine::hmac(algo, misc_crypto::JEFE_KEY);
            e.update(&misc_crypto::JEFE_DATA[..10]).unwrap();
            e.update(&misc_crypto::JEFE_DATA[10..]).unwrap();
            e.verify(expected).unwrap();

            let mut e = Engine::hmac(algo, misc_crypto::JEFE_KEY);
            e.update(b"something else").unwrap();
            let err = e.verify(expected).unwrap_err();
            assert_eq!(err.into_inner(), Error::InvalidSignature);
        }
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn clone_forks() {
        let mut e = Engine::hash(Algo::Sha256);
        e.update(b"ab").unwrap();
        let mut fork = e.clone();
        e.update(b"c").unwrap();
        fork.update(b"c").unwrap();

        let mut a = [0; 32];
        let mut b = [0; 32];
        e.finish(&mut a).unwrap();
        fork.finish(&mut b).unwrap();
        assert_eq!(a, b);
        assert_eq!(&a[..], misc_crypto::ABC_SHA256);
    }

    #[test]
    fn short_output() {
        let mut e = Engine::hash(Algo::Sha512);
        let mut digest = [0; 32];
        let err = e.finish(&mut digest).unwrap_err();
        assert_eq!(err.into_inner(), Error::BufferTooSmall);
    }
}

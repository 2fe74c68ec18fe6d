// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! HKDF, as an implementation of [`crypto::kdf`], built on `ring`'s HMAC.
//!
//! `ring`'s own HKDF wants the output length up front, so extract and
//! expand are done by hand here, which allows output to be streamed.

use arrayvec::ArrayVec;
use ring::hmac;

use crate::crypto::alg::step;
use crate::crypto::hash;
use crate::crypto::hash::MAX_DIGEST_LEN;
use crate::crypto::kdf;
use crate::crypto::ring::hash::hmac_algorithm;
use crate::crypto::Error;
use crate::Result;

#[cfg(doc)]
use crate::crypto;

/// The most `INFO` input an [`Engine`] will buffer.
pub const MAX_INFO_LEN: usize = 256;

/// An HKDF [`kdf::Engine`].
pub struct Engine {
    algo: hash::Algo,
    salt: Option<hmac::Key>,
    prk: Option<hmac::Key>,
    info: ArrayVec<u8, MAX_INFO_LEN>,
    capacity: usize,

    block: [u8; MAX_DIGEST_LEN],
    block_len: usize,
    pos: usize,
    counter: u8,
}

impl Engine {
    /// Begins a new HKDF over `algo`.
    pub fn hkdf(algo: hash::Algo) -> Self {
        Self {
            algo,
            salt: None,
            prk: None,
            info: ArrayVec::new(),
            capacity: 255 * algo.bytes(),
            block: [0; MAX_DIGEST_LEN],
            block_len: 0,
            pos: 0,
            counter: 0,
        }
    }

    fn output_started(&self) -> bool {
        self.counter > 0
    }

    /// Computes `T(n) = HMAC(PRK, T(n-1) | info | n)` into the block.
    fn next_block(&mut self, prk: &hmac::Key) {
        self.counter += 1;
        let mut ctx = hmac::Context::with_key(prk);
        ctx.update(&self.block[..self.block_len]);
        ctx.update(&self.info);
        ctx.update(&[self.counter]);
        let tag = ctx.sign();

        self.block_len = tag.as_ref().len();
        self.block[..self.block_len].copy_from_slice(tag.as_ref());
        self.pos = 0;
    }
}

impl kdf::Engine for Engine {
    fn input(&mut self, step: u32, data: &[u8]) -> Result<(), Error> {
        check!(!self.output_started(), Error::BadState);
        let alg = hmac_algorithm(self.algo);
        match step {
            step::SALT => {
                check!(
                    self.salt.is_none() && self.prk.is_none(),
                    Error::BadState
                );
                self.salt = Some(hmac::Key::new(alg, data));
            }
            step::SECRET => {
                check!(self.prk.is_none(), Error::BadState);
                let salt = self
                    .salt
                    .take()
                    .unwrap_or_else(|| hmac::Key::new(alg, &[]));
                let prk = hmac::sign(&salt, data);
                self.prk = Some(hmac::Key::new(alg, prk.as_ref()));
            }
            step::INFO => self
                .info
                .try_extend_from_slice(data)
                .map_err(|_| fail!(Error::InsufficientMemory))?,
            _ => return Err(fail!(Error::InvalidArgument)),
        }
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn set_capacity(&mut self, capacity: usize) -> Result<(), Error> {
        check!(capacity <= self.capacity, Error::InvalidArgument);
        self.capacity = capacity;
        Ok(())
    }

    fn output(&mut self, out: &mut [u8]) -> Result<(), Error> {
        let prk = match self.prk.take() {
            Some(prk) => prk,
            None => return Err(fail!(Error::BadState)),
        };
        if out.len() > self.capacity {
            self.prk = Some(prk);
            return Err(fail!(Error::InsufficientData));
        }

        for byte in out.iter_mut() {
            if self.pos == self.block_len {
                self.next_block(&prk);
            }
            *byte = self.block[self.pos];
            self.pos += 1;
        }
        self.capacity -= out.len();
        self.prk = Some(prk);
        Ok(())
    }
}

// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Implementations of [`crypto::cipher`] based on the `aes` block cipher.
//!
//! `ring` does not expose unauthenticated modes, so the modes themselves
//! are built here over raw AES block operations.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::BlockDecrypt as _;
use aes::cipher::BlockEncrypt as _;
use aes::cipher::KeyInit as _;

use crate::crypto::cipher;
use crate::crypto::cipher::Direction;
use crate::crypto::cipher::Mode;
use crate::crypto::cipher::BLOCK_LEN;
use crate::crypto::key;
use crate::crypto::Error;
use crate::Result;

#[cfg(doc)]
use crate::crypto;

type Block = [u8; BLOCK_LEN];

#[derive(Clone)]
enum Aes {
    Aes128(aes::Aes128),
    Aes192(aes::Aes192),
    Aes256(aes::Aes256),
}

impl Aes {
    fn new(key: &[u8]) -> Result<Self, Error> {
        let aes = match key.len() {
            16 => aes::Aes128::new_from_slice(key).map(Self::Aes128),
            24 => aes::Aes192::new_from_slice(key).map(Self::Aes192),
            32 => aes::Aes256::new_from_slice(key).map(Self::Aes256),
            _ => return Err(fail!(Error::InvalidArgument)),
        };
        aes.map_err(|_| fail!(Error::InvalidArgument))
    }

    fn encrypt(&self, block: &mut Block) {
        let block = GenericArray::from_mut_slice(block);
        match self {
            Self::Aes128(c) => c.encrypt_block(block),
            Self::Aes192(c) => c.encrypt_block(block),
            Self::Aes256(c) => c.encrypt_block(block),
        }
    }

    fn decrypt(&self, block: &mut Block) {
        let block = GenericArray::from_mut_slice(block);
        match self {
            Self::Aes128(c) => c.decrypt_block(block),
            Self::Aes192(c) => c.decrypt_block(block),
            Self::Aes256(c) => c.decrypt_block(block),
        }
    }
}

fn xor(dest: &mut Block, src: &Block) {
    for (d, s) in dest.iter_mut().zip(src) {
        *d ^= s;
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum State {
    NeedsIv,
    Running,
    Done,
}

/// An AES [`cipher::Engine`].
#[derive(Clone)]
pub struct Engine {
    aes: Aes,
    mode: Mode,
    direction: Direction,
    state: State,
    /// The CTR counter block, or the CBC chaining value.
    iv: Block,
    /// CTR: the current keystream block. CBC: buffered input.
    buf: Block,
    /// CTR: keystream bytes used. CBC: bytes buffered.
    buf_len: usize,
}

impl Engine {
    /// Creates a new engine; `key` must be an AES key.
    pub fn new(
        mode: Mode,
        direction: Direction,
        key_type: u32,
        key: &[u8],
    ) -> Result<Self, Error> {
        check!(key_type == key::types::AES, Error::InvalidArgument);
        Ok(Self {
            aes: Aes::new(key)?,
            mode,
            direction,
            state: State::NeedsIv,
            iv: [0; BLOCK_LEN],
            buf: [0; BLOCK_LEN],
            buf_len: match mode {
                Mode::Ctr => BLOCK_LEN,
                _ => 0,
            },
        })
    }

    /// Whether a full buffered block must be held back until more input
    /// arrives, so that `finish()` can strip the padding off it.
    fn holds_last_block(&self) -> bool {
        self.mode == Mode::CbcPkcs7 && self.direction == Direction::Decrypt
    }

    /// Runs CBC over the (full) buffer, writing one block to `out`.
    fn cbc_block(&mut self, out: &mut [u8]) {
        let mut block = self.buf;
        match self.direction {
            Direction::Encrypt => {
                xor(&mut block, &self.iv);
                self.aes.encrypt(&mut block);
                self.iv = block;
            }
            Direction::Decrypt => {
                self.aes.decrypt(&mut block);
                xor(&mut block, &self.iv);
                self.iv = self.buf;
            }
        }
        out[..BLOCK_LEN].copy_from_slice(&block);
        self.buf_len = 0;
    }

    fn ctr(&mut self, input: &[u8], out: &mut [u8]) -> usize {
        for (i, o) in input.iter().zip(out.iter_mut()) {
            if self.buf_len == BLOCK_LEN {
                self.buf = self.iv;
                self.aes.encrypt(&mut self.buf);
                for b in self.iv.iter_mut().rev() {
                    *b = b.wrapping_add(1);
                    if *b != 0 {
                        break;
                    }
                }
                self.buf_len = 0;
            }
            *o = i ^ self.buf[self.buf_len];
            self.buf_len += 1;
        }
        input.len()
    }

    fn cbc(&mut self, input: &[u8], out: &mut [u8]) -> usize {
        let mut written = 0;
        for &b in input {
            if self.buf_len == BLOCK_LEN {
                self.cbc_block(&mut out[written..]);
                written += BLOCK_LEN;
            }
            self.buf[self.buf_len] = b;
            self.buf_len += 1;
        }
        if self.buf_len == BLOCK_LEN && !self.holds_last_block() {
            self.cbc_block(&mut out[written..]);
            written += BLOCK_LEN;
        }
        written
    }
}

impl cipher::Engine for Engine {
    fn iv_len(&self) -> usize {
        BLOCK_LEN
    }

    fn set_iv(&mut self, iv: &[u8]) -> Result<(), Error> {
        check!(self.state == State::NeedsIv, Error::BadState);
        check!(iv.len() == BLOCK_LEN, Error::InvalidArgument);
        self.iv.copy_from_slice(iv);
        self.state = State::Running;
        Ok(())
    }

    fn update(&mut self, input: &[u8], out: &mut [u8]) -> Result<usize, Error> {
        check!(self.state == State::Running, Error::BadState);
        check!(out.len() >= input.len() + BLOCK_LEN, Error::BufferTooSmall);
        Ok(match self.mode {
            Mode::Ctr => self.ctr(input, out),
            Mode::CbcNoPadding | Mode::CbcPkcs7 => self.cbc(input, out),
        })
    }

    fn finish(&mut self, out: &mut [u8]) -> Result<usize, Error> {
        check!(self.state == State::Running, Error::BadState);
        check!(out.len() >= BLOCK_LEN, Error::BufferTooSmall);
        self.state = State::Done;

        match (self.mode, self.direction) {
            (Mode::Ctr, _) => Ok(0),
            (Mode::CbcNoPadding, _) => {
                check!(self.buf_len == 0, Error::InvalidArgument);
                Ok(0)
            }
            (Mode::CbcPkcs7, Direction::Encrypt) => {
                let pad = (BLOCK_LEN - self.buf_len) as u8;
                for b in &mut self.buf[self.buf_len..] {
                    *b = pad;
                }
                self.buf_len = BLOCK_LEN;
                self.cbc_block(out);
                Ok(BLOCK_LEN)
            }
            (Mode::CbcPkcs7, Direction::Decrypt) => {
                check!(self.buf_len == BLOCK_LEN, Error::InvalidArgument);
                let mut block = [0; BLOCK_LEN];
                self.cbc_block(&mut block);

                let pad = block[BLOCK_LEN - 1] as usize;
                check!(
                    (1..=BLOCK_LEN).contains(&pad)
                        && block[BLOCK_LEN - pad..]
                            .iter()
                            .all(|&b| b as usize == pad),
                    Error::InvalidPadding
                );
                let len = BLOCK_LEN - pad;
                out[..len].copy_from_slice(&block[..len]);
                Ok(len)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::cipher::Engine as _;
    use testutil::data::aes as vectors;

    fn run(
        mode: Mode,
        direction: Direction,
        iv: &[u8],
        input: &[u8],
        chunk: usize,
    ) -> Result<Vec<u8>, Error> {
        let mut e = Engine::new(mode, direction, key::types::AES, vectors::KEY_128)?;
        e.set_iv(iv)?;
        let mut output = Vec::new();
        let mut out = [0; 64];
        for piece in input.chunks(chunk) {
            let n = e.update(piece, &mut out)?;
            output.extend_from_slice(&out[..n]);
        }
        let n = e.finish(&mut out)?;
        output.extend_from_slice(&out[..n]);
        Ok(output)
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn ctr_vectors() {
        for chunk in [1, 7, 16, 20] {
            let ct = run(
                Mode::Ctr,
                Direction::Encrypt,
                vectors::CTR_COUNTER,
                vectors::PLAINTEXT,
                chunk,
            )
            .unwrap();
            assert_eq!(ct, vectors::CTR_128_CIPHERTEXT);
            let pt = run(
                Mode::Ctr,
                Direction::Decrypt,
                vectors::CTR_COUNTER,
                &ct[..37],
                chunk,
            )
            .unwrap();
            assert_eq!(pt, &vectors::PLAINTEXT[..37]);
        }
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn cbc_vectors() {
        for chunk in [3, 16, 33] {
            let ct = run(
                Mode::CbcNoPadding,
                Direction::Encrypt,
                vectors::CBC_IV,
                vectors::PLAINTEXT,
                chunk,
            )
            .unwrap();
            assert_eq!(ct, vectors::CBC_128_CIPHERTEXT);
            let pt = run(
                Mode::CbcNoPadding,
                Direction::Decrypt,
                vectors::CBC_IV,
                &ct,
                chunk,
            )
            .unwrap();
            assert_eq!(pt, vectors::PLAINTEXT);
        }
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn cbc_partial_block() {
        let e = run(
            Mode::CbcNoPadding,
            Direction::Encrypt,
            vectors::CBC_IV,
            &vectors::PLAINTEXT[..20],
            16,
        )
        .unwrap_err();
        assert_eq!(e.into_inner(), Error::InvalidArgument);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn pkcs7() {
        for len in [0, 1, 15, 16, 17, 64] {
            let pt = &vectors::PLAINTEXT[..len];
            let ct = run(Mode::CbcPkcs7, Direction::Encrypt, vectors::CBC_IV, pt, 5)
                .unwrap();
            assert_eq!(ct.len(), (len / 16 + 1) * 16);
            assert_eq!(&ct[..len / 16 * 16], &vectors::CBC_128_CIPHERTEXT[..len / 16 * 16]);

            let back = run(Mode::CbcPkcs7, Direction::Decrypt, vectors::CBC_IV, &ct, 16)
                .unwrap();
            assert_eq!(back, pt);
        }
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn pkcs7_bad_padding() {
        // A full block of valid CBC ciphertext whose plaintext is not padded.
        let e = run(
            Mode::CbcPkcs7,
            Direction::Decrypt,
            vectors::CBC_IV,
            &vectors::CBC_128_CIPHERTEXT[..16],
            16,
        )
        .unwrap_err();
        assert_eq!(e.into_inner(), Error::InvalidPadding);
    }

    #[test]
    fn iv_discipline() {
        let mut e = Engine::new(
            Mode::Ctr,
            Direction::Encrypt,
            key::types::AES,
            vectors::KEY_128,
        )
        .unwrap();
        let mut out = [0; 32];
        assert!(e.update(b"early", &mut out).is_err());
        assert!(e.set_iv(&[0; 12]).is_err());
        e.set_iv(&[0; 16]).unwrap();
        let err = e.set_iv(&[0; 16]).unwrap_err();
        assert_eq!(err.into_inner(), Error::BadState);

        assert!(Engine::new(Mode::Ctr, Direction::Encrypt, key::types::HMAC, &[0; 16]).is_err());
        assert!(Engine::new(Mode::Ctr, Direction::Encrypt, key::types::AES, &[0; 20]).is_err());
    }
}

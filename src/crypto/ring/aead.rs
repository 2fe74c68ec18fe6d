// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Implementations of [`crypto::aead`] based on `ring`.
//!
//! `ring` only seals and opens whole messages, so this engine buffers its
//! input, up to [`MAX_MESSAGE_LEN`] bytes of data and [`MAX_AD_LEN`] bytes
//! of associated data, and does all of the work on completion.

use arrayvec::ArrayVec;
use ring::aead as ring_aead;

use crate::crypto::aead;
use crate::crypto::aead::TAG_LEN;
use crate::crypto::cipher::Direction;
use crate::crypto::key;
use crate::crypto::Error;
use crate::Result;

#[cfg(doc)]
use crate::crypto;

/// The largest message an [`Engine`] can process.
pub const MAX_MESSAGE_LEN: usize = 1024;

/// The most associated data an [`Engine`] can process.
pub const MAX_AD_LEN: usize = 256;

const NONCE_LEN: usize = ring_aead::NONCE_LEN;

/// A `ring`-based [`aead::Engine`].
pub struct Engine {
    key: ring_aead::LessSafeKey,
    direction: Direction,
    nonce: Option<[u8; NONCE_LEN]>,
    lengths: Option<(usize, usize)>,
    ad: ArrayVec<u8, MAX_AD_LEN>,
    data: ArrayVec<u8, { MAX_MESSAGE_LEN + TAG_LEN }>,
    data_started: bool,
    done: bool,
}

impl Engine {
    /// Creates a new engine.
    pub fn new(
        algo: aead::Algo,
        direction: Direction,
        key_type: u32,
        key: &[u8],
    ) -> Result<Self, Error> {
        let ring_algo = match (algo, key_type, key.len()) {
            (aead::Algo::AesGcm, key::types::AES, 16) => &ring_aead::AES_128_GCM,
            (aead::Algo::AesGcm, key::types::AES, 32) => &ring_aead::AES_256_GCM,
            (aead::Algo::AesGcm, key::types::AES, _) => {
                return Err(fail!(Error::NotSupported))
            }
            (aead::Algo::ChaCha20Poly1305, key::types::CHACHA20, _) => {
                &ring_aead::CHACHA20_POLY1305
            }
            _ => return Err(fail!(Error::InvalidArgument)),
        };
        let key = ring_aead::UnboundKey::new(ring_algo, key)
            .map_err(|_| fail!(Error::InvalidArgument))?;

        Ok(Self {
            key: ring_aead::LessSafeKey::new(key),
            direction,
            nonce: None,
            lengths: None,
            ad: ArrayVec::new(),
            data: ArrayVec::new(),
            data_started: false,
            done: false,
        })
    }

    fn running(&self) -> Result<[u8; NONCE_LEN], Error> {
        check!(!self.done, Error::BadState);
        self.nonce.ok_or_else(|| fail!(Error::BadState))
    }

    fn complete(&mut self) -> Result<ring_aead::Nonce, Error> {
        let nonce = self.running()?;
        self.done = true;
        if let Some((ad_len, data_len)) = self.lengths {
            check!(
                ad_len == self.ad.len() && data_len == self.data.len(),
                Error::InvalidArgument
            );
        }
        Ok(ring_aead::Nonce::assume_unique_for_key(nonce))
    }
}

impl aead::Engine for Engine {
    fn nonce_len(&self) -> usize {
        NONCE_LEN
    }

    fn set_nonce(&mut self, nonce: &[u8]) -> Result<(), Error> {
        check!(!self.done && self.nonce.is_none(), Error::BadState);
        check!(nonce.len() == NONCE_LEN, Error::InvalidArgument);
        let mut n = [0; NONCE_LEN];
        n.copy_from_slice(nonce);
        self.nonce = Some(n);
        Ok(())
    }

    fn set_lengths(
        &mut self,
        ad_len: usize,
        plaintext_len: usize,
    ) -> Result<(), Error> {
        check!(
            !self.done && self.lengths.is_none() && !self.data_started,
            Error::BadState
        );
        check!(self.ad.is_empty(), Error::BadState);
        check!(
            ad_len <= MAX_AD_LEN && plaintext_len <= MAX_MESSAGE_LEN,
            Error::InsufficientMemory
        );
        self.lengths = Some((ad_len, plaintext_len));
        Ok(())
    }

    fn update_ad(&mut self, ad: &[u8]) -> Result<(), Error> {
        self.running()?;
        check!(!self.data_started, Error::BadState);
        self.ad
            .try_extend_from_slice(ad)
            .map_err(|_| fail!(Error::InsufficientMemory))
    }

    fn update(&mut self, input: &[u8], _: &mut [u8]) -> Result<usize, Error> {
        self.running()?;
        self.data_started = true;
        check!(
            self.data.len() + input.len() <= MAX_MESSAGE_LEN,
            Error::InsufficientMemory
        );
        self.data
            .try_extend_from_slice(input)
            .map_err(|_| fail!(Error::InsufficientMemory))?;
        Ok(0)
    }

    fn finish(
        &mut self,
        ciphertext: &mut [u8],
        tag: &mut [u8],
    ) -> Result<(usize, usize), Error> {
        check!(self.direction == Direction::Encrypt, Error::BadState);
        check!(
            ciphertext.len() >= self.data.len() && tag.len() >= TAG_LEN,
            Error::BufferTooSmall
        );
        let nonce = self.complete()?;

        let t = self
            .key
            .seal_in_place_separate_tag(
                nonce,
                ring_aead::Aad::from(&self.ad[..]),
                &mut self.data[..],
            )
            .map_err(|_| fail!(Error::GenericError))?;

        let len = self.data.len();
        ciphertext[..len].copy_from_slice(&self.data);
        tag[..TAG_LEN].copy_from_slice(t.as_ref());
        Ok((len, TAG_LEN))
    }

    fn verify(
        &mut self,
        tag: &[u8],
        plaintext: &mut [u8],
    ) -> Result<usize, Error> {
        check!(self.direction == Direction::Decrypt, Error::BadState);
        check!(tag.len() == TAG_LEN, Error::InvalidSignature);
        check!(plaintext.len() >= self.data.len(), Error::BufferTooSmall);
        let nonce = self.complete()?;

        self.data
            .try_extend_from_slice(tag)
            .map_err(|_| fail!(Error::InsufficientMemory))?;
        let opened = self
            .key
            .open_in_place(
                nonce,
                ring_aead::Aad::from(&self.ad[..]),
                &mut self.data[..],
            )
            .map_err(|_| fail!(Error::InvalidSignature))?;

        let len = opened.len();
        plaintext[..len].copy_from_slice(opened);
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::aead::Engine as _;

    const NONCE: [u8; 12] = [9; 12];

    fn seal(
        algo: aead::Algo,
        key_type: u32,
        key: &[u8],
        ad: &[u8],
        msg: &[u8],
    ) -> (Vec<u8>, Vec<u8>) {
        let mut e = Engine::new(algo, Direction::Encrypt, key_type, key).unwrap();
        e.set_nonce(&NONCE).unwrap();
        e.set_lengths(ad.len(), msg.len()).unwrap();
        e.update_ad(ad).unwrap();
        let mut out = [0; 64];
        for chunk in msg.chunks(5) {
            assert_eq!(e.update(chunk, &mut out).unwrap(), 0);
        }
        let mut ct = [0; 64];
        let mut tag = [0; 16];
        let (ct_len, tag_len) = e.finish(&mut ct, &mut tag).unwrap();
        (ct[..ct_len].to_vec(), tag[..tag_len].to_vec())
    }

    fn open(
        algo: aead::Algo,
        key_type: u32,
        key: &[u8],
        ad: &[u8],
        ct: &[u8],
        tag: &[u8],
    ) -> Result<Vec<u8>, Error> {
        let mut e = Engine::new(algo, Direction::Decrypt, key_type, key)?;
        e.set_nonce(&NONCE)?;
        e.update_ad(ad)?;
        let mut out = [0; 64];
        e.update(ct, &mut out)?;
        let mut pt = [0; 64];
        let len = e.verify(tag, &mut pt)?;
        Ok(pt[..len].to_vec())
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn round_trips() {
        let msg = b"attack at dawn, bring snacks";
        for (algo, key_type, key) in [
            (aead::Algo::AesGcm, key::types::AES, &[1u8; 16][..]),
            (aead::Algo::AesGcm, key::types::AES, &[2u8; 32][..]),
            (aead::Algo::ChaCha20Poly1305, key::types::CHACHA20, &[3u8; 32][..]),
        ] {
            let (ct, tag) = seal(algo, key_type, key, b"header", msg);
            assert_ne!(&ct[..], &msg[..]);
            assert_eq!(tag.len(), TAG_LEN);

            let pt = open(algo, key_type, key, b"header", &ct, &tag).unwrap();
            assert_eq!(&pt[..], &msg[..]);

            let e = open(algo, key_type, key, b"footer", &ct, &tag).unwrap_err();
            assert_eq!(e.into_inner(), Error::InvalidSignature);

            let mut bad_tag = tag.clone();
            bad_tag[0] ^= 1;
            let e = open(algo, key_type, key, b"header", &ct, &bad_tag).unwrap_err();
            assert_eq!(e.into_inner(), Error::InvalidSignature);
        }
    }

    #[test]
    fn lifecycle() {
        let mut e =
            Engine::new(aead::Algo::AesGcm, Direction::Encrypt, key::types::AES, &[0; 16])
                .unwrap();
        let mut out = [0; 16];
        let e1 = e.update(b"x", &mut out).unwrap_err();
        assert_eq!(e1.into_inner(), Error::BadState);

        e.set_nonce(&NONCE).unwrap();
        assert!(e.set_nonce(&NONCE).is_err());
        e.set_lengths(0, 2).unwrap();
        e.update(b"x", &mut out).unwrap();
        assert!(e.update_ad(b"late").is_err());

        let mut tag = [0; 16];
        let e2 = e.finish(&mut out, &mut tag).unwrap_err();
        assert_eq!(e2.into_inner(), Error::InvalidArgument);
        assert!(e.finish(&mut out, &mut tag).is_err());
    }

    #[test]
    fn key_mismatch() {
        assert!(Engine::new(
            aead::Algo::ChaCha20Poly1305,
            Direction::Encrypt,
            key::types::AES,
            &[0; 32]
        )
        .is_err());
        let e = Engine::new(
            aead::Algo::AesGcm,
            Direction::Encrypt,
            key::types::AES,
            &[0; 24],
        )
        .err()
        .map(|e| e.into_inner());
        assert_eq!(e, Some(Error::NotSupported));
    }
}

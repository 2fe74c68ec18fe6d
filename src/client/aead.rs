// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! AEAD calls.

use crate::client::copy_out;
use crate::client::decode;
use crate::client::Crypto;
use crate::client::Error;
use crate::protocol::aead::*;
use crate::protocol::wire::WireEnum as _;
use crate::protocol::Codec;
use crate::rpc::Caller;

impl<C: Caller, K: Codec> Crypto<C, K> {
    fn aead_setup(
        &mut self,
        opcode: Opcode,
        key_id: u32,
        alg: u32,
    ) -> crate::Result<u32, Error> {
        self.call(
            opcode.to_wire_value(),
            &SetupRequest { key_id, alg },
            |k, r| Ok(decode::<_, SetupResponse>(k, r)?.op_handle),
        )
    }

    /// Starts an AEAD encryption, returning the operation's handle.
    pub fn aead_encrypt_setup(
        &mut self,
        key_id: u32,
        alg: u32,
    ) -> crate::Result<u32, Error> {
        self.aead_setup(Opcode::EncryptSetup, key_id, alg)
    }

    /// Starts an AEAD decryption, returning the operation's handle.
    pub fn aead_decrypt_setup(
        &mut self,
        key_id: u32,
        alg: u32,
    ) -> crate::Result<u32, Error> {
        self.aead_setup(Opcode::DecryptSetup, key_id, alg)
    }

    /// Has the service pick a nonce, writing it to `out` and returning its
    /// length.
    pub fn aead_generate_nonce(
        &mut self,
        op_handle: u32,
        out: &mut [u8],
    ) -> crate::Result<usize, Error> {
        self.call(
            Opcode::GenerateNonce.to_wire_value(),
            &GenerateNonceRequest { op_handle },
            |k, r| copy_out(decode::<_, GenerateNonceResponse>(k, r)?.nonce, out),
        )
    }

    /// Sets an operation's nonce.
    pub fn aead_set_nonce(
        &mut self,
        op_handle: u32,
        nonce: &[u8],
    ) -> crate::Result<(), Error> {
        self.call_unit(
            Opcode::SetNonce.to_wire_value(),
            &SetNonceRequest { op_handle, nonce },
        )
    }

    /// Declares the total associated data and plaintext lengths.
    pub fn aead_set_lengths(
        &mut self,
        op_handle: u32,
        ad_length: u32,
        plaintext_length: u32,
    ) -> crate::Result<(), Error> {
        self.call_unit(
            Opcode::SetLengths.to_wire_value(),
            &SetLengthsRequest {
                op_handle,
                ad_length,
                plaintext_length,
            },
        )
    }

    /// Feeds associated data.
    pub fn aead_update_ad(
        &mut self,
        op_handle: u32,
        data: &[u8],
    ) -> crate::Result<(), Error> {
        self.call_unit(
            Opcode::UpdateAd.to_wire_value(),
            &UpdateAdRequest { op_handle, data },
        )
    }

    /// Processes `input`, writing any output to `out` and returning its
    /// length.
    pub fn aead_update(
        &mut self,
        op_handle: u32,
        input: &[u8],
        out: &mut [u8],
    ) -> crate::Result<usize, Error> {
        self.call(
            Opcode::Update.to_wire_value(),
            &UpdateRequest {
                op_handle,
                data: input,
            },
            |k, r| copy_out(decode::<_, UpdateResponse>(k, r)?.data, out),
        )
    }

    /// Completes an encryption, returning the lengths of the ciphertext
    /// written to `ciphertext` and the tag written to `tag`.
    pub fn aead_finish(
        &mut self,
        op_handle: u32,
        ciphertext: &mut [u8],
        tag: &mut [u8],
    ) -> crate::Result<(usize, usize), Error> {
        self.call(
            Opcode::Finish.to_wire_value(),
            &FinishRequest { op_handle },
            |k, r| {
                let resp: FinishResponse = decode(k, r)?;
                Ok((
                    copy_out(resp.ciphertext, ciphertext)?,
                    copy_out(resp.tag, tag)?,
                ))
            },
        )
    }

    /// Completes a decryption by checking `tag`, writing the rest of the
    /// plaintext to `out` and returning its length.
    pub fn aead_verify(
        &mut self,
        op_handle: u32,
        tag: &[u8],
        out: &mut [u8],
    ) -> crate::Result<usize, Error> {
        self.call(
            Opcode::Verify.to_wire_value(),
            &VerifyRequest { op_handle, tag },
            |k, r| copy_out(decode::<_, VerifyResponse>(k, r)?.plaintext, out),
        )
    }

    /// Abandons an AEAD operation.
    pub fn aead_abort(&mut self, op_handle: u32) -> crate::Result<(), Error> {
        self.call_unit(Opcode::Abort.to_wire_value(), &AbortRequest { op_handle })
    }
}

#[cfg(test)]
mod test {
    use crate::client::test_util::*;
    use crate::client::Error;
    use crate::crypto;
    use crate::crypto::alg;
    use crate::crypto::key;
    use crate::crypto::key::Usage;
    use crate::protocol::keys::KeyAttributes;
    use crate::protocol::Schema;
    use pretty_assertions::assert_eq;

    #[test]
    #[cfg_attr(miri, ignore)]
    fn chacha_round_trip() {
        let world = World::new();
        with_client(&world, Schema, |client| {
            let key = client
                .generate_key(&KeyAttributes {
                    key_type: key::types::CHACHA20,
                    key_bits: 256,
                    lifetime: key::LIFETIME_VOLATILE,
                    id: 0,
                    usage: (Usage::Encrypt | Usage::Decrypt).bits(),
                    alg: alg::CHACHA20_POLY1305,
                })
                .unwrap();
            let msg = b"a message of no particular importance";

            let h = client.aead_encrypt_setup(key, alg::CHACHA20_POLY1305).unwrap();
            let mut nonce = [0; 12];
            assert_eq!(client.aead_generate_nonce(h, &mut nonce).unwrap(), 12);
            client.aead_set_lengths(h, 2, msg.len() as u32).unwrap();
            client.aead_update_ad(h, b"ad").unwrap();
            let mut ct = [0; 64];
            assert_eq!(client.aead_update(h, msg, &mut ct).unwrap(), 0);
            let mut tag = [0; 16];
            let (ct_len, tag_len) = client.aead_finish(h, &mut ct, &mut tag).unwrap();
            assert_eq!((ct_len, tag_len), (msg.len(), 16));

            let h = client.aead_decrypt_setup(key, alg::CHACHA20_POLY1305).unwrap();
            client.aead_set_nonce(h, &nonce).unwrap();
            client.aead_update_ad(h, b"ad").unwrap();
            let mut pt = [0; 64];
            client.aead_update(h, &ct[..ct_len], &mut pt).unwrap();
            let len = client.aead_verify(h, &tag, &mut pt).unwrap();
            assert_eq!(&pt[..len], &msg[..]);

            // Wrong associated data.
            let h = client.aead_decrypt_setup(key, alg::CHACHA20_POLY1305).unwrap();
            client.aead_set_nonce(h, &nonce).unwrap();
            client.aead_update_ad(h, b"AD").unwrap();
            client.aead_update(h, &ct[..ct_len], &mut pt).unwrap();
            let err = client.aead_verify(h, &tag, &mut pt).unwrap_err();
            assert_eq!(
                err.into_inner(),
                Error::Op(crypto::Error::InvalidSignature)
            );

            let h = client.aead_encrypt_setup(key, alg::CHACHA20_POLY1305).unwrap();
            client.aead_abort(h).unwrap();
        });
    }
}

// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Key derivation calls.

use crate::client::copy_out;
use crate::client::decode;
use crate::client::Crypto;
use crate::client::Error;
use crate::protocol::key_derivation::*;
use crate::protocol::keys::KeyAttributes;
use crate::protocol::wire::WireEnum as _;
use crate::protocol::Codec;
use crate::rpc::Caller;

impl<C: Caller, K: Codec> Crypto<C, K> {
    /// Starts a key derivation, returning its handle.
    pub fn key_derivation_setup(&mut self, alg: u32) -> crate::Result<u32, Error> {
        self.call(
            Opcode::Setup.to_wire_value(),
            &SetupRequest { alg },
            |k, r| Ok(decode::<_, SetupResponse>(k, r)?.op_handle),
        )
    }

    /// Returns how many more bytes a derivation can output.
    pub fn key_derivation_get_capacity(
        &mut self,
        op_handle: u32,
    ) -> crate::Result<u32, Error> {
        self.call(
            Opcode::GetCapacity.to_wire_value(),
            &GetCapacityRequest { op_handle },
            |k, r| Ok(decode::<_, GetCapacityResponse>(k, r)?.capacity),
        )
    }

    /// Lowers a derivation's capacity.
    pub fn key_derivation_set_capacity(
        &mut self,
        op_handle: u32,
        capacity: u32,
    ) -> crate::Result<(), Error> {
        self.call_unit(
            Opcode::SetCapacity.to_wire_value(),
            &SetCapacityRequest {
                op_handle,
                capacity,
            },
        )
    }

    /// Supplies the input for `step` as bytes.
    pub fn key_derivation_input_bytes(
        &mut self,
        op_handle: u32,
        step: u32,
        data: &[u8],
    ) -> crate::Result<(), Error> {
        self.call_unit(
            Opcode::InputBytes.to_wire_value(),
            &InputBytesRequest {
                op_handle,
                step,
                data,
            },
        )
    }

    /// Supplies the input for `step` from a stored key.
    pub fn key_derivation_input_key(
        &mut self,
        op_handle: u32,
        step: u32,
        key_id: u32,
    ) -> crate::Result<(), Error> {
        self.call_unit(
            Opcode::InputKey.to_wire_value(),
            &InputKeyRequest {
                op_handle,
                step,
                key_id,
            },
        )
    }

    /// Fills `out` with derived bytes.
    pub fn key_derivation_output_bytes(
        &mut self,
        op_handle: u32,
        out: &mut [u8],
    ) -> crate::Result<(), Error> {
        let req = OutputBytesRequest {
            op_handle,
            output_len: out.len() as u32,
        };
        self.call(Opcode::OutputBytes.to_wire_value(), &req, |k, r| {
            let resp: OutputBytesResponse = decode(k, r)?;
            check!(
                resp.data.len() == out.len(),
                Error::Rpc(crate::rpc::Error::InvalidResponseBody)
            );
            copy_out(resp.data, out).map(|_| ())
        })
    }

    /// Derives a key with `attributes`, returning its id.
    pub fn key_derivation_output_key(
        &mut self,
        op_handle: u32,
        attributes: &KeyAttributes,
    ) -> crate::Result<u32, Error> {
        let req = OutputKeyRequest {
            op_handle,
            attributes: *attributes,
        };
        self.call(Opcode::OutputKey.to_wire_value(), &req, |k, r| {
            Ok(decode::<_, OutputKeyResponse>(k, r)?.key_id)
        })
    }

    /// Abandons a derivation.
    pub fn key_derivation_abort(
        &mut self,
        op_handle: u32,
    ) -> crate::Result<(), Error> {
        self.call_unit(Opcode::Abort.to_wire_value(), &AbortRequest { op_handle })
    }
}

#[cfg(test)]
mod test {
    use crate::client::test_util::*;
    use crate::crypto::alg;
    use crate::crypto::alg::step;
    use crate::crypto::key;
    use crate::crypto::key::Usage;
    use crate::protocol::keys::KeyAttributes;
    use crate::protocol::PackedC;
    use pretty_assertions::assert_eq;
    use testutil::data::hkdf;

    #[test]
    #[cfg_attr(miri, ignore)]
    fn derive_and_use_a_mac_key() {
        let world = World::new();
        with_client(&world, PackedC, |client| {
            let hkdf256 = alg::hkdf(alg::SHA_256);
            let secret = client
                .import_key(
                    &KeyAttributes {
                        key_type: key::types::DERIVE,
                        key_bits: 0,
                        lifetime: key::LIFETIME_VOLATILE,
                        id: 0,
                        usage: Usage::Derive as u32,
                        alg: hkdf256,
                    },
                    hkdf::CASE1_IKM,
                )
                .unwrap();

            let h = client.key_derivation_setup(hkdf256).unwrap();
            client
                .key_derivation_input_bytes(h, step::SALT, hkdf::CASE1_SALT)
                .unwrap();
            client.key_derivation_input_key(h, step::SECRET, secret).unwrap();
            client
                .key_derivation_input_bytes(h, step::INFO, hkdf::CASE1_INFO)
                .unwrap();
            client.key_derivation_set_capacity(h, 42).unwrap();

            let hmac256 = alg::hmac(alg::SHA_256);
            let mac_key = client
                .key_derivation_output_key(
                    h,
                    &KeyAttributes {
                        key_type: key::types::HMAC,
                        key_bits: 256,
                        lifetime: key::LIFETIME_VOLATILE,
                        id: 0,
                        usage: (Usage::SignHash | Usage::VerifyHash).bits(),
                        alg: hmac256,
                    },
                )
                .unwrap();
            assert_eq!(client.key_derivation_get_capacity(h).unwrap(), 10);
            let mut tail = [0; 10];
            client.key_derivation_output_bytes(h, &mut tail).unwrap();
            assert_eq!(&tail[..], &hkdf::CASE1_OKM[32..]);
            client.key_derivation_abort(h).unwrap();

            // The derived key works, and is the first 32 bytes of output.
            let m = client.mac_sign_setup(mac_key, hmac256).unwrap();
            client.mac_update(m, b"payload").unwrap();
            let mut mac = [0; 32];
            client.mac_sign_finish(m, &mut mac).unwrap();

            let v = client.mac_verify_setup(mac_key, hmac256).unwrap();
            client.mac_update(v, b"payload").unwrap();
            client.mac_verify_finish(v, &mac).unwrap();
            let v = client.mac_verify_setup(mac_key, hmac256).unwrap();
            client.mac_abort(v).unwrap();

            let expected = ring::hmac::sign(
                &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, &hkdf::CASE1_OKM[..32]),
                b"payload",
            );
            assert_eq!(&mac[..], expected.as_ref());
        });
    }
}

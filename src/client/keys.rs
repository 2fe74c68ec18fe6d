// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Key management calls.

use crate::client::copy_out;
use crate::client::decode;
use crate::client::Crypto;
use crate::client::Error;
use crate::protocol::keys::*;
use crate::protocol::wire::WireEnum as _;
use crate::protocol::Codec;
use crate::rpc::Caller;

impl<C: Caller, K: Codec> Crypto<C, K> {
    /// Generates a random key, returning its id.
    pub fn generate_key(
        &mut self,
        attributes: &KeyAttributes,
    ) -> crate::Result<u32, Error> {
        let req = GenerateKeyRequest {
            attributes: *attributes,
        };
        self.call(Opcode::GenerateKey.to_wire_value(), &req, |k, r| {
            Ok(decode::<_, KeyIdResponse>(k, r)?.id)
        })
    }

    /// Destroys a key.
    pub fn destroy_key(&mut self, id: u32) -> crate::Result<(), Error> {
        self.call_unit(
            Opcode::DestroyKey.to_wire_value(),
            &DestroyKeyRequest { id },
        )
    }

    /// Exports a key's material into `out`, returning its length.
    pub fn export_key(
        &mut self,
        id: u32,
        out: &mut [u8],
    ) -> crate::Result<usize, Error> {
        self.call(
            Opcode::ExportKey.to_wire_value(),
            &ExportKeyRequest { id },
            |k, r| copy_out(decode::<_, ExportKeyResponse>(k, r)?.data, out),
        )
    }

    /// Imports key material, returning the new key's id.
    pub fn import_key(
        &mut self,
        attributes: &KeyAttributes,
        data: &[u8],
    ) -> crate::Result<u32, Error> {
        let req = ImportKeyRequest {
            attributes: *attributes,
            data,
        };
        self.call(Opcode::ImportKey.to_wire_value(), &req, |k, r| {
            Ok(decode::<_, KeyIdResponse>(k, r)?.id)
        })
    }

    /// Fills `out` with random bytes.
    pub fn generate_random(&mut self, out: &mut [u8]) -> crate::Result<(), Error> {
        let req = GenerateRandomRequest {
            size: out.len() as u32,
        };
        self.call(Opcode::GenerateRandom.to_wire_value(), &req, |k, r| {
            let resp: GenerateRandomResponse = decode(k, r)?;
            check!(
                resp.random_bytes.len() == out.len(),
                Error::Rpc(crate::rpc::Error::InvalidResponseBody)
            );
            copy_out(resp.random_bytes, out).map(|_| ())
        })
    }

    /// Copies a key under new attributes, returning the copy's id.
    pub fn copy_key(
        &mut self,
        attributes: &KeyAttributes,
        source_key_id: u32,
    ) -> crate::Result<u32, Error> {
        let req = CopyKeyRequest {
            attributes: *attributes,
            source_key_id,
        };
        self.call(Opcode::CopyKey.to_wire_value(), &req, |k, r| {
            Ok(decode::<_, KeyIdResponse>(k, r)?.id)
        })
    }

    /// Purges a key's cached copy.
    pub fn purge_key(&mut self, id: u32) -> crate::Result<(), Error> {
        self.call_unit(Opcode::PurgeKey.to_wire_value(), &PurgeKeyRequest { id })
    }

    /// Returns a key's attributes.
    pub fn get_key_attributes(
        &mut self,
        id: u32,
    ) -> crate::Result<KeyAttributes, Error> {
        self.call(
            Opcode::GetKeyAttributes.to_wire_value(),
            &GetKeyAttributesRequest { id },
            |k, r| Ok(decode::<_, GetKeyAttributesResponse>(k, r)?.attributes),
        )
    }
}

#[cfg(test)]
mod test {
    use crate::client::test_util::*;
    use crate::client::Error;
    use crate::crypto;
    use crate::crypto::key;
    use crate::crypto::key::Usage;
    use crate::protocol::keys::KeyAttributes;
    use crate::protocol::PackedC;
    use crate::protocol::Schema;
    use pretty_assertions::assert_eq;

    fn attrs(key_type: u32, bits: u32, usage: u32) -> KeyAttributes {
        KeyAttributes {
            key_type,
            key_bits: bits,
            lifetime: key::LIFETIME_VOLATILE,
            id: 0,
            usage,
            alg: 0,
        }
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn key_lifecycle() {
        let world = World::new();
        with_client(&world, Schema, |client| {
            let usage = (Usage::Export | Usage::Copy).bits();
            let id = client
                .generate_key(&attrs(key::types::AES, 256, usage))
                .unwrap();
            let got = client.get_key_attributes(id).unwrap();
            assert_eq!(got.key_bits, 256);
            assert_eq!(got.usage, usage);

            let copy = client
                .copy_key(&attrs(key::types::NONE, 0, Usage::Export as u32), id)
                .unwrap();
            let mut a = [0; 32];
            let mut b = [0; 32];
            assert_eq!(client.export_key(id, &mut a).unwrap(), 32);
            assert_eq!(client.export_key(copy, &mut b).unwrap(), 32);
            assert_eq!(a, b);

            client.purge_key(copy).unwrap();
            client.destroy_key(copy).unwrap();
            let err = client.export_key(copy, &mut b).unwrap_err();
            assert_eq!(
                err.into_inner(),
                Error::Op(crypto::Error::InvalidHandle)
            );
        });
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn random() {
        let world = World::new();
        with_client(&world, PackedC, |client| {
            let mut a = [0; 32];
            let mut b = [0; 32];
            client.generate_random(&mut a).unwrap();
            client.generate_random(&mut b).unwrap();
            assert_ne!(a, b);
            client.generate_random(&mut []).unwrap();
        });
    }
}

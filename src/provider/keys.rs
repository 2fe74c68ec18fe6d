// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The core provider: key management and random numbers.
//!
//! Keys are owned by the client that created them. Every lookup is scoped
//! to the calling client, so a key id belonging to some other client is
//! indistinguishable from one that does not exist.

use enumflags2::BitFlags;

use crate::crypto::csrng::Csrng;
use crate::crypto::key;
use crate::crypto::key::Usage;
use crate::crypto::Error;
use crate::protocol::keys::*;
use crate::protocol::wire::WireEnum as _;
use crate::protocol::Encoding;
use crate::provider::op_failed;
use crate::provider::respond;
use crate::provider::wipe;
use crate::provider::MAX_DATA_LEN;
use crate::rpc;
use crate::rpc::CallRequest;
use crate::service::Provider;
use crate::service::Serializers;

/// Parses wire key attributes.
///
/// Unknown usage flags are rejected.
pub fn from_wire(attrs: &KeyAttributes) -> crate::Result<key::Attributes, Error> {
    let usage = BitFlags::<Usage>::from_bits(attrs.usage)
        .map_err(|_| fail!(Error::InvalidArgument))?;
    Ok(key::Attributes {
        key_type: attrs.key_type,
        bits: attrs.key_bits,
        lifetime: attrs.lifetime,
        id: attrs.id,
        usage,
        alg: attrs.alg,
    })
}

impl From<key::Attributes> for KeyAttributes {
    fn from(attrs: key::Attributes) -> Self {
        Self {
            key_type: attrs.key_type,
            key_bits: attrs.bits,
            lifetime: attrs.lifetime,
            id: attrs.id,
            usage: attrs.usage.bits(),
            alg: attrs.alg,
        }
    }
}

/// Returns the byte length of a key of `bits` bits, which must be a
/// non-zero whole number of bytes that fits in a key store.
pub(crate) fn key_len(bits: u32) -> crate::Result<usize, Error> {
    check!(bits != 0 && bits % 8 == 0, Error::InvalidArgument);
    let len = bits as usize / 8;
    check!(len <= key::MAX_KEY_LEN, Error::NotSupported);
    Ok(len)
}

/// The core key-management provider.
pub struct Keys<'a> {
    store: &'a dyn key::Store,
    rng: &'a dyn Csrng,
    serializers: Serializers<'a, dyn KeySerializer + 'a>,
}

impl<'a> Keys<'a> {
    /// Creates a new provider over `store`, generating keys with `rng`.
    pub fn new(store: &'a dyn key::Store, rng: &'a dyn Csrng) -> Self {
        Self {
            store,
            rng,
            serializers: Serializers::new(),
        }
    }

    /// Registers the serializer table for `encoding`.
    pub fn register_serializer(
        &mut self,
        encoding: Encoding,
        table: &'a dyn KeySerializer,
    ) {
        self.serializers.register(encoding, table);
    }

    fn generate_key(
        &self,
        client_id: u32,
        attrs: &KeyAttributes,
    ) -> crate::Result<u32, Error> {
        let attrs = from_wire(attrs)?;
        let len = key_len(attrs.bits)?;
        let mut material = [0; key::MAX_KEY_LEN];
        self.rng.fill(&mut material[..len])?;
        let id = self.store.import(client_id, &attrs, &material[..len]);
        wipe(&mut material);
        id
    }

    fn copy_key(
        &self,
        client_id: u32,
        attrs: &KeyAttributes,
        source: u32,
    ) -> crate::Result<u32, Error> {
        let requested = from_wire(attrs)?;
        let original = self.store.attributes(client_id, source)?;

        // A copy may narrow the source's policy, but never widen it.
        let alg = match (original.alg, requested.alg) {
            (a, 0) => a,
            (0, b) => b,
            (a, b) if a == b => a,
            _ => return Err(fail!(Error::NotPermitted)),
        };
        check!(
            requested.key_type == key::types::NONE
                || requested.key_type == original.key_type,
            Error::InvalidArgument
        );
        let copy = key::Attributes {
            key_type: original.key_type,
            bits: original.bits,
            lifetime: requested.lifetime,
            id: 0,
            usage: requested.usage & original.usage,
            alg,
        };

        let mut material = [0; key::MAX_KEY_LEN];
        let len =
            self.store
                .material(client_id, source, Usage::Copy, None, &mut material)?;
        let id = self.store.import(client_id, &copy, &material[..len]);
        wipe(&mut material);
        id
    }
}

impl Provider for Keys<'_> {
    fn opcodes(&self) -> &'static [u16] {
        Opcode::WIRE_VALUES
    }

    fn dispatch(
        &mut self,
        call: &mut CallRequest,
    ) -> crate::Result<(), rpc::Error> {
        let ser = self.serializers.get(call.encoding)?;
        let opcode = Opcode::from_wire_value(call.opcode)
            .ok_or_else(|| fail!(rpc::Error::InvalidOpcode))?;
        let client = call.client_id;
        let request = call.request;

        match opcode {
            Opcode::GenerateKey => {
                let req = ser.decode_generate_key_request(request)?;
                let result = self.generate_key(client, &req.attributes);
                respond(call, result, |&id, out| {
                    ser.encode_generate_key_response(&KeyIdResponse { id }, out)
                })
            }
            Opcode::ImportKey => {
                let req = ser.decode_import_key_request(request)?;
                let result = from_wire(&req.attributes)
                    .and_then(|attrs| self.store.import(client, &attrs, req.data));
                respond(call, result, |&id, out| {
                    ser.encode_import_key_response(&KeyIdResponse { id }, out)
                })
            }
            Opcode::ExportKey => {
                let req = ser.decode_export_key_request(request)?;
                let mut material = [0; key::MAX_KEY_LEN];
                let result = self.store.material(
                    client,
                    req.id,
                    Usage::Export,
                    None,
                    &mut material,
                );
                let r = respond(call, result, |&len, out| {
                    let resp = ExportKeyResponse {
                        data: &material[..len],
                    };
                    ser.encode_export_key_response(&resp, out)
                });
                wipe(&mut material);
                r
            }
            Opcode::DestroyKey => {
                let req = ser.decode_destroy_key_request(request)?;
                let result = self.store.destroy(client, req.id);
                respond(call, result, |r, out| {
                    ser.encode_destroy_key_response(r, out)
                })
            }
            Opcode::CopyKey => {
                let req = ser.decode_copy_key_request(request)?;
                let result =
                    self.copy_key(client, &req.attributes, req.source_key_id);
                respond(call, result, |&id, out| {
                    ser.encode_copy_key_response(&KeyIdResponse { id }, out)
                })
            }
            Opcode::PurgeKey => {
                // Volatile keys have no cached copy to purge; this only
                // checks that the key exists.
                let req = ser.decode_purge_key_request(request)?;
                let result = self.store.attributes(client, req.id).map(|_| ());
                respond(call, result, |r, out| {
                    ser.encode_purge_key_response(r, out)
                })
            }
            Opcode::GetKeyAttributes => {
                let req = ser.decode_get_key_attributes_request(request)?;
                let result = self.store.attributes(client, req.id);
                respond(call, result, |&attrs, out| {
                    let resp = GetKeyAttributesResponse {
                        attributes: attrs.into(),
                    };
                    ser.encode_get_key_attributes_response(&resp, out)
                })
            }
            Opcode::GenerateRandom => {
                let req = ser.decode_generate_random_request(request)?;
                let len = req.size as usize;
                if len > MAX_DATA_LEN {
                    return op_failed(call, fail!(Error::InsufficientMemory));
                }
                let mut bytes = [0; MAX_DATA_LEN];
                let result = self.rng.fill(&mut bytes[..len]);
                respond(call, result, |_, out| {
                    let resp = GenerateRandomResponse {
                        random_bytes: &bytes[..len],
                    };
                    ser.encode_generate_random_response(&resp, out)
                })
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::key::KeyStore;
    use crate::crypto::ring;
    use crate::protocol::Codec;
    use crate::protocol::PackedC;
    use crate::protocol::Schema;
    use crate::provider::test_util::*;
    use pretty_assertions::assert_eq;

    const AES_128: KeyAttributes = KeyAttributes {
        key_type: key::types::AES,
        key_bits: 128,
        lifetime: key::LIFETIME_VOLATILE,
        id: 0,
        usage: 0x0303,
        alg: 0,
    };

    fn key_id<C: Codec>(codec: &C, resp: &[u8]) -> u32 {
        let resp: KeyIdResponse = codec.decode(resp).unwrap();
        resp.id
    }

    fn with_provider(f: impl FnOnce(&mut Keys)) {
        let store = KeyStore::<4>::new();
        let rng = ring::csrng::Csrng::new();
        let mut keys = Keys::new(&store, &rng);
        keys.register_serializer(Encoding::PackedC, &PackedC);
        keys.register_serializer(Encoding::Schema, &Schema);
        f(&mut keys)
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn import_export_destroy() {
        with_provider(|keys| {
            let material = [0x42; 16];
            let r = call(
                keys,
                &Schema,
                Opcode::ImportKey.to_wire_value(),
                &ImportKeyRequest {
                    attributes: AES_128,
                    data: &material,
                },
            )
            .unwrap();
            assert_eq!(r.op_status, 0);
            let id = key_id(&Schema, &r.response);

            let r = call(
                keys,
                &Schema,
                Opcode::ExportKey.to_wire_value(),
                &ExportKeyRequest { id },
            )
            .unwrap();
            assert_eq!(r.op_status, 0);
            let resp: ExportKeyResponse = Schema.decode(&r.response).unwrap();
            assert_eq!(resp.data, &material[..]);

            let r = call(
                keys,
                &Schema,
                Opcode::GetKeyAttributes.to_wire_value(),
                &GetKeyAttributesRequest { id },
            )
            .unwrap();
            let resp: GetKeyAttributesResponse =
                Schema.decode(&r.response).unwrap();
            assert_eq!(resp.attributes, KeyAttributes { id, ..AES_128 });

            let r = call(
                keys,
                &Schema,
                Opcode::DestroyKey.to_wire_value(),
                &DestroyKeyRequest { id },
            )
            .unwrap();
            assert_eq!(r.op_status, 0);

            let r = call(
                keys,
                &Schema,
                Opcode::ExportKey.to_wire_value(),
                &ExportKeyRequest { id },
            )
            .unwrap();
            assert_eq!(r.op_status, Error::InvalidHandle.status());
            assert!(r.response.is_empty());
        });
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn keys_belong_to_their_client() {
        with_provider(|keys| {
            let r = call_as(
                keys,
                &PackedC,
                1,
                Opcode::GenerateKey.to_wire_value(),
                &GenerateKeyRequest {
                    attributes: AES_128,
                },
            )
            .unwrap();
            assert_eq!(r.op_status, 0);
            let id = key_id(&PackedC, &r.response);

            for opcode in [Opcode::PurgeKey, Opcode::DestroyKey] {
                let r = call_as(
                    keys,
                    &PackedC,
                    2,
                    opcode.to_wire_value(),
                    &PurgeKeyRequest { id },
                )
                .unwrap();
                assert_eq!(r.op_status, Error::InvalidHandle.status());
            }

            let r = call_as(
                keys,
                &PackedC,
                1,
                Opcode::PurgeKey.to_wire_value(),
                &PurgeKeyRequest { id },
            )
            .unwrap();
            assert_eq!(r.op_status, 0);
        });
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn export_needs_permission() {
        with_provider(|keys| {
            let r = call(
                keys,
                &PackedC,
                Opcode::GenerateKey.to_wire_value(),
                &GenerateKeyRequest {
                    attributes: KeyAttributes {
                        usage: Usage::Encrypt as u32,
                        ..AES_128
                    },
                },
            )
            .unwrap();
            let id = key_id(&PackedC, &r.response);

            let r = call(
                keys,
                &PackedC,
                Opcode::ExportKey.to_wire_value(),
                &ExportKeyRequest { id },
            )
            .unwrap();
            assert_eq!(r.op_status, Error::NotPermitted.status());
        });
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn copy_narrows_policy() {
        with_provider(|keys| {
            let r = call(
                keys,
                &PackedC,
                Opcode::ImportKey.to_wire_value(),
                &ImportKeyRequest {
                    attributes: KeyAttributes {
                        alg: 0x04c0_1000,
                        ..AES_128
                    },
                    data: &[7; 16],
                },
            )
            .unwrap();
            let source = key_id(&PackedC, &r.response);

            let r = call(
                keys,
                &PackedC,
                Opcode::CopyKey.to_wire_value(),
                &CopyKeyRequest {
                    attributes: KeyAttributes {
                        key_type: 0,
                        key_bits: 0,
                        usage: (Usage::Encrypt | Usage::SignHash).bits(),
                        ..AES_128
                    },
                    source_key_id: source,
                },
            )
            .unwrap();
            assert_eq!(r.op_status, 0);
            let copy = key_id(&PackedC, &r.response);
            assert_ne!(copy, source);

            let r = call(
                keys,
                &PackedC,
                Opcode::GetKeyAttributes.to_wire_value(),
                &GetKeyAttributesRequest { id: copy },
            )
            .unwrap();
            let resp: GetKeyAttributesResponse =
                PackedC.decode(&r.response).unwrap();
            assert_eq!(resp.attributes.usage, Usage::Encrypt as u32);
            assert_eq!(resp.attributes.alg, 0x04c0_1000);
            assert_eq!(resp.attributes.key_bits, 128);

            let r = call(
                keys,
                &PackedC,
                Opcode::CopyKey.to_wire_value(),
                &CopyKeyRequest {
                    attributes: KeyAttributes {
                        alg: 0x0440_4000,
                        ..AES_128
                    },
                    source_key_id: source,
                },
            )
            .unwrap();
            assert_eq!(r.op_status, Error::NotPermitted.status());
        });
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn random_bytes() {
        with_provider(|keys| {
            let r = call(
                keys,
                &PackedC,
                Opcode::GenerateRandom.to_wire_value(),
                &GenerateRandomRequest { size: 24 },
            )
            .unwrap();
            assert_eq!(r.op_status, 0);
            let resp: GenerateRandomResponse =
                PackedC.decode(&r.response).unwrap();
            assert_eq!(resp.random_bytes.len(), 24);

            let r = call(
                keys,
                &PackedC,
                Opcode::GenerateRandom.to_wire_value(),
                &GenerateRandomRequest {
                    size: MAX_DATA_LEN as u32 + 1,
                },
            )
            .unwrap();
            assert_eq!(r.op_status, Error::InsufficientMemory.status());
        });
    }

    #[test]
    fn bad_requests_are_rejected() {
        with_provider(|keys| {
            let e = call_raw(
                keys,
                Encoding::PackedC,
                Opcode::ImportKey.to_wire_value(),
                &[1, 2, 3],
            )
            .err()
            .map(|e| e.into_inner());
            assert_eq!(e, Some(rpc::Error::InvalidRequestBody));

            let e = call_raw(keys, Encoding::PackedC, 0x0200, &[])
                .err()
                .map(|e| e.into_inner());
            assert_eq!(e, Some(rpc::Error::InvalidOpcode));
        });

        let store = KeyStore::<4>::new();
        let rng = ring::csrng::Csrng::new();
        let mut keys = Keys::new(&store, &rng);
        keys.register_serializer(Encoding::PackedC, &PackedC);
        let e = call_raw(
            &mut keys,
            Encoding::Schema,
            Opcode::PurgeKey.to_wire_value(),
            &[0; 4],
        )
        .err()
        .map(|e| e.into_inner());
        assert_eq!(e, Some(rpc::Error::SerializationNotSupported));
    }

    #[test]
    fn attributes_from_wire() {
        let e = from_wire(&KeyAttributes {
            usage: 0x8000_0000,
            ..AES_128
        })
        .unwrap_err();
        assert_eq!(e.into_inner(), Error::InvalidArgument);

        let attrs = from_wire(&AES_128).unwrap();
        assert_eq!(KeyAttributes::from(attrs), AES_128);
        assert!(key_len(12).is_err());
        assert!(key_len(0).is_err());
        assert_eq!(key_len(256).unwrap(), 32);
    }
}

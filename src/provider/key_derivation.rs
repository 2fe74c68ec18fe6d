// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The multi-step key derivation provider.
//!
//! A derivation's inputs may come straight from the request or from a
//! stored key; its output may be read back as bytes or stored as a new key,
//! in any mix, until the capacity runs out.

use core::convert::TryFrom as _;

use crate::crypto::kdf;
use crate::crypto::kdf::Engine as _;
use crate::crypto::key;
use crate::crypto::key::Usage;
use crate::crypto::pool;
use crate::crypto::pool::ContextPool;
use crate::crypto::pool::Kind;
use crate::crypto::Error;
use crate::protocol::key_derivation::*;
use crate::protocol::keys::KeyAttributes;
use crate::protocol::wire::WireEnum as _;
use crate::protocol::Encoding;
use crate::provider::keys::from_wire;
use crate::provider::keys::key_len;
use crate::provider::op_failed;
use crate::provider::respond;
use crate::provider::wipe;
use crate::provider::MAX_DATA_LEN;
use crate::rpc;
use crate::rpc::CallRequest;
use crate::service::Provider;
use crate::service::Serializers;

/// A derivation in flight.
struct Op<E> {
    engine: E,
    alg: u32,
}

/// A key derivation provider, holding up to `N` derivations in flight.
pub struct KeyDerivation<
    'a,
    B: kdf::Builder,
    const N: usize = { pool::DEFAULT_CAPACITY },
> {
    backend: &'a B,
    store: &'a dyn key::Store,
    pool: ContextPool<Op<B::Engine>, N>,
    serializers: Serializers<'a, dyn KeyDerivationSerializer + 'a>,
}

impl<'a, B: kdf::Builder, const N: usize> KeyDerivation<'a, B, N> {
    /// Creates a new provider over `backend`, reading and writing keys in
    /// `store`.
    pub fn new(backend: &'a B, store: &'a dyn key::Store) -> Self {
        Self {
            backend,
            store,
            pool: ContextPool::new(),
            serializers: Serializers::new(),
        }
    }

    /// Registers the serializer table for `encoding`.
    pub fn register_serializer(
        &mut self,
        encoding: Encoding,
        table: &'a dyn KeyDerivationSerializer,
    ) {
        self.serializers.register(encoding, table);
    }

    /// Returns the number of derivations in flight.
    pub fn in_flight(&self) -> usize {
        self.pool.len()
    }

    fn setup(&mut self, client: u32, alg: u32) -> crate::Result<pool::Context, Error> {
        let engine = self.backend.new_kdf(alg)?;
        Ok(self.pool.alloc(Kind::KeyDerivation, client, Op { engine, alg })?)
    }

    fn op(
        &mut self,
        client: u32,
        handle: u32,
    ) -> crate::Result<&mut Op<B::Engine>, Error> {
        let ctx = self.pool.find(Kind::KeyDerivation, client, handle)?;
        Ok(self.pool.get_mut(ctx)?)
    }

    fn input_key(
        &mut self,
        client: u32,
        req: &InputKeyRequest,
    ) -> crate::Result<(), Error> {
        let store = self.store;
        let op = self.op(client, req.op_handle)?;
        let attrs = store.attributes(client, req.key_id)?;
        check!(
            matches!(attrs.key_type, key::types::DERIVE | key::types::RAW_DATA),
            Error::InvalidArgument
        );

        let mut material = [0; key::MAX_KEY_LEN];
        let result = store
            .material(client, req.key_id, Usage::Derive, Some(op.alg), &mut material)
            .and_then(|len| op.engine.input(req.step, &material[..len]));
        wipe(&mut material);
        result
    }

    fn output_bytes<'b>(
        &mut self,
        client: u32,
        req: &OutputBytesRequest,
        out: &'b mut [u8; MAX_DATA_LEN],
    ) -> crate::Result<&'b [u8], Error> {
        let len = req.output_len as usize;
        check!(len <= MAX_DATA_LEN, Error::InsufficientMemory);
        let out = &mut out[..len];
        self.op(client, req.op_handle)?.engine.output(out)?;
        Ok(out)
    }

    fn output_key(
        &mut self,
        client: u32,
        handle: u32,
        attrs: &KeyAttributes,
    ) -> crate::Result<u32, Error> {
        let attrs = from_wire(attrs)?;
        let len = key_len(attrs.bits)?;
        let store = self.store;
        let op = self.op(client, handle)?;

        let mut material = [0; key::MAX_KEY_LEN];
        let result = op
            .engine
            .output(&mut material[..len])
            .and_then(|_| store.import(client, &attrs, &material[..len]));
        wipe(&mut material);
        result
    }
}

impl<B: kdf::Builder, const N: usize> Provider for KeyDerivation<'_, B, N> {
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
            Opcode::Setup => {
                let req = ser.decode_setup_request(request)?;
                let result = self.setup(client, req.alg);
                let ctx = result.ok();
                respond(call, result, |ctx, out| {
                    let resp = SetupResponse {
                        op_handle: ctx.handle(),
                    };
                    ser.encode_setup_response(&resp, out)
                })
                .map_err(|e| {
                    if let Some(ctx) = ctx {
                        let _ = self.pool.free(ctx);
                    }
                    e
                })
            }
            Opcode::GetCapacity => {
                let req = ser.decode_get_capacity_request(request)?;
                let result = self
                    .op(client, req.op_handle)
                    .map(|op| op.engine.capacity());
                respond(call, result, |&capacity, out| {
                    let resp = GetCapacityResponse {
                        capacity: u32::try_from(capacity).unwrap_or(u32::MAX),
                    };
                    ser.encode_get_capacity_response(&resp, out)
                })
            }
            Opcode::SetCapacity => {
                let req = ser.decode_set_capacity_request(request)?;
                let result = self
                    .op(client, req.op_handle)
                    .and_then(|op| op.engine.set_capacity(req.capacity as usize));
                respond(call, result, |r, out| {
                    ser.encode_set_capacity_response(r, out)
                })
            }
            Opcode::InputBytes => {
                let req = ser.decode_input_bytes_request(request)?;
                if req.data.len() > MAX_DATA_LEN {
                    return op_failed(call, fail!(Error::InsufficientMemory));
                }
                let result = self
                    .op(client, req.op_handle)
                    .and_then(|op| op.engine.input(req.step, req.data));
                respond(call, result, |r, out| {
                    ser.encode_input_bytes_response(r, out)
                })
            }
            Opcode::InputKey => {
                let req = ser.decode_input_key_request(request)?;
                let result = self.input_key(client, &req);
                respond(call, result, |r, out| {
                    ser.encode_input_key_response(r, out)
                })
            }
            Opcode::OutputBytes => {
                let req = ser.decode_output_bytes_request(request)?;
                let mut output = [0; MAX_DATA_LEN];
                let result = self.output_bytes(client, &req, &mut output);
                respond(call, result, |&data, out| {
                    let resp = OutputBytesResponse { data };
                    ser.encode_output_bytes_response(&resp, out)
                })
            }
            Opcode::OutputKey => {
                let req = ser.decode_output_key_request(request)?;
                let result =
                    self.output_key(client, req.op_handle, &req.attributes);
                respond(call, result, |&key_id, out| {
                    let resp = OutputKeyResponse { key_id };
                    ser.encode_output_key_response(&resp, out)
                })
            }
            Opcode::Abort => {
                let req = ser.decode_abort_request(request)?;
                self.pool.release(Kind::KeyDerivation, client, req.op_handle);
                respond(call, Ok(()), |r, out| ser.encode_abort_response(r, out))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::alg;
    use crate::crypto::alg::step;
    use crate::crypto::key::KeyStore;
    use crate::crypto::key::Store as _;
    use crate::crypto::ring;
    use crate::protocol::Codec;
    use crate::protocol::PackedC;
    use crate::protocol::Schema;
    use crate::provider::test_util::*;
    use pretty_assertions::assert_eq;
    use testutil::data::hkdf;

    fn setup<C: Codec>(p: &mut dyn Provider, codec: &C) -> u32 {
        let r = call(
            p,
            codec,
            Opcode::Setup.to_wire_value(),
            &SetupRequest {
                alg: alg::hkdf(alg::SHA_256),
            },
        )
        .unwrap();
        assert_eq!(r.op_status, 0);
        let resp: SetupResponse = codec.decode(&r.response).unwrap();
        resp.op_handle
    }

    fn input<C: Codec>(p: &mut dyn Provider, codec: &C, h: u32, step: u32, data: &[u8]) -> i16 {
        call(
            p,
            codec,
            Opcode::InputBytes.to_wire_value(),
            &InputBytesRequest {
                op_handle: h,
                step,
                data,
            },
        )
        .unwrap()
        .op_status
    }

    fn output<C: Codec>(p: &mut dyn Provider, codec: &C, h: u32, len: u32) -> Outcome {
        call(
            p,
            codec,
            Opcode::OutputBytes.to_wire_value(),
            &OutputBytesRequest {
                op_handle: h,
                output_len: len,
            },
        )
        .unwrap()
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn hkdf_from_bytes() {
        let backend = ring::Backend::new();
        let store = KeyStore::<4>::new();
        let mut p: KeyDerivation<_> = KeyDerivation::new(&backend, &store);
        p.register_serializer(Encoding::Schema, &Schema);

        let h = setup(&mut p, &Schema);
        assert_eq!(input(&mut p, &Schema, h, step::SALT, hkdf::CASE1_SALT), 0);
        assert_eq!(input(&mut p, &Schema, h, step::SECRET, hkdf::CASE1_IKM), 0);
        assert_eq!(input(&mut p, &Schema, h, step::INFO, hkdf::CASE1_INFO), 0);

        let r = call(
            &mut p,
            &Schema,
            Opcode::GetCapacity.to_wire_value(),
            &GetCapacityRequest { op_handle: h },
        )
        .unwrap();
        let cap: GetCapacityResponse = Schema.decode(&r.response).unwrap();
        assert_eq!(cap.capacity, 255 * 32);

        let mut okm = Vec::new();
        for &len in &[10, 32] {
            let r = output(&mut p, &Schema, h, len);
            assert_eq!(r.op_status, 0);
            let resp: OutputBytesResponse = Schema.decode(&r.response).unwrap();
            okm.extend_from_slice(resp.data);
        }
        assert_eq!(okm, hkdf::CASE1_OKM);

        // No more input once output has begun.
        assert_eq!(
            input(&mut p, &Schema, h, step::INFO, b"more"),
            Error::BadState.status()
        );
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn keys_in_and_out() {
        let backend = ring::Backend::new();
        let store = KeyStore::<4>::new();
        let mut p: KeyDerivation<_> = KeyDerivation::new(&backend, &store);
        p.register_serializer(Encoding::PackedC, &PackedC);

        let secret = store
            .import(
                CLIENT,
                &key::Attributes {
                    key_type: key::types::DERIVE,
                    bits: 0,
                    lifetime: key::LIFETIME_VOLATILE,
                    id: 0,
                    usage: Usage::Derive.into(),
                    alg: alg::hkdf(alg::SHA_256),
                },
                hkdf::CASE3_IKM,
            )
            .unwrap();

        let h = setup(&mut p, &PackedC);
        let r = call(
            &mut p,
            &PackedC,
            Opcode::InputKey.to_wire_value(),
            &InputKeyRequest {
                op_handle: h,
                step: step::SECRET,
                key_id: secret,
            },
        )
        .unwrap();
        assert_eq!(r.op_status, 0);

        let r = call(
            &mut p,
            &PackedC,
            Opcode::OutputKey.to_wire_value(),
            &OutputKeyRequest {
                op_handle: h,
                attributes: KeyAttributes {
                    key_type: key::types::AES,
                    key_bits: 128,
                    lifetime: key::LIFETIME_VOLATILE,
                    id: 0,
                    usage: Usage::Export as u32,
                    alg: 0,
                },
            },
        )
        .unwrap();
        assert_eq!(r.op_status, 0);
        let resp: OutputKeyResponse = PackedC.decode(&r.response).unwrap();

        let mut material = [0; 16];
        let len = store
            .material(CLIENT, resp.key_id, Usage::Export, None, &mut material)
            .unwrap();
        assert_eq!(&material[..len], &hkdf::CASE3_OKM[..16]);

        let r = output(&mut p, &PackedC, h, 26);
        let resp: OutputBytesResponse = PackedC.decode(&r.response).unwrap();
        assert_eq!(resp.data, &hkdf::CASE3_OKM[16..]);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn capacity_and_policy() {
        let backend = ring::Backend::new();
        let store = KeyStore::<4>::new();
        let mut p: KeyDerivation<_> = KeyDerivation::new(&backend, &store);
        p.register_serializer(Encoding::PackedC, &PackedC);

        let r = call(
            &mut p,
            &PackedC,
            Opcode::Setup.to_wire_value(),
            &SetupRequest { alg: alg::SHA_256 },
        )
        .unwrap();
        assert_eq!(r.op_status, Error::NotSupported.status());

        let h = setup(&mut p, &PackedC);
        assert_eq!(output(&mut p, &PackedC, h, 4).op_status, Error::BadState.status());
        input(&mut p, &PackedC, h, step::SECRET, b"secret");

        let r = call(
            &mut p,
            &PackedC,
            Opcode::SetCapacity.to_wire_value(),
            &SetCapacityRequest {
                op_handle: h,
                capacity: 8,
            },
        )
        .unwrap();
        assert_eq!(r.op_status, 0);
        assert_eq!(output(&mut p, &PackedC, h, 6).op_status, 0);
        assert_eq!(
            output(&mut p, &PackedC, h, 6).op_status,
            Error::InsufficientData.status()
        );

        // A key without the derive permission cannot be an input.
        let plain = store
            .import(
                CLIENT,
                &key::Attributes {
                    key_type: key::types::DERIVE,
                    bits: 0,
                    lifetime: key::LIFETIME_VOLATILE,
                    id: 0,
                    usage: Usage::Export.into(),
                    alg: 0,
                },
                b"secret",
            )
            .unwrap();
        let h = setup(&mut p, &PackedC);
        let r = call(
            &mut p,
            &PackedC,
            Opcode::InputKey.to_wire_value(),
            &InputKeyRequest {
                op_handle: h,
                step: step::SECRET,
                key_id: plain,
            },
        )
        .unwrap();
        assert_eq!(r.op_status, Error::NotPermitted.status());

        call(
            &mut p,
            &PackedC,
            Opcode::Abort.to_wire_value(),
            &AbortRequest { op_handle: h },
        )
        .unwrap();
        assert_eq!(p.in_flight(), 1);
    }
}

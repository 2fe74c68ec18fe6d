// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The multi-step MAC provider, which computes HMACs with stored keys.

use crate::crypto::alg;
use crate::crypto::hash;
use crate::crypto::hash::Engine as _;
use crate::crypto::hash::EngineExt as _;
use crate::crypto::key;
use crate::crypto::key::Usage;
use crate::crypto::pool;
use crate::crypto::pool::ContextPool;
use crate::crypto::pool::Kind;
use crate::crypto::Error;
use crate::protocol::mac::*;
use crate::protocol::wire::WireEnum as _;
use crate::protocol::Encoding;
use crate::provider::load_key;
use crate::provider::respond;
use crate::provider::wipe;
use crate::rpc;
use crate::rpc::CallRequest;
use crate::service::Provider;
use crate::service::Serializers;

/// A MAC operation in flight.
struct Op<E> {
    engine: E,
    verify: bool,
}

/// A MAC provider, holding up to `N` operations in flight.
pub struct Mac<'a, B: hash::Builder, const N: usize = { pool::DEFAULT_CAPACITY }> {
    backend: &'a B,
    store: &'a dyn key::Store,
    pool: ContextPool<Op<B::Engine>, N>,
    serializers: Serializers<'a, dyn MacSerializer + 'a>,
}

impl<'a, B: hash::Builder, const N: usize> Mac<'a, B, N> {
    /// Creates a new provider over `backend`, using keys from `store`.
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
        table: &'a dyn MacSerializer,
    ) {
        self.serializers.register(encoding, table);
    }

    /// Returns the number of operations in flight.
    pub fn in_flight(&self) -> usize {
        self.pool.len()
    }

    fn setup(
        &mut self,
        client: u32,
        req: &SetupRequest,
        verify: bool,
    ) -> crate::Result<pool::Context, Error> {
        check!(alg::is_hmac(req.alg), Error::NotSupported);
        let algo = hash::Algo::from_alg(alg::underlying_hash(req.alg))
            .ok_or_else(|| fail!(Error::NotSupported))?;

        let usage = if verify {
            Usage::VerifyHash
        } else {
            Usage::SignHash
        };
        let mut material = [0; key::MAX_KEY_LEN];
        let engine = load_key(
            self.store,
            client,
            req.key_id,
            usage,
            req.alg,
            &mut material,
        )
        .and_then(|(key_type, len)| {
            check!(key_type == key::types::HMAC, Error::InvalidArgument);
            self.backend.new_hmac(algo, &material[..len])
        });
        wipe(&mut material);

        let op = Op {
            engine: engine?,
            verify,
        };
        Ok(self.pool.alloc(Kind::Mac, client, op)?)
    }

    fn op(&mut self, client: u32, handle: u32) -> crate::Result<&mut Op<B::Engine>, Error> {
        let ctx = self.pool.find(Kind::Mac, client, handle)?;
        Ok(self.pool.get_mut(ctx)?)
    }

    /// Takes an operation out of the pool for completion, checking that it
    /// was set up for the right kind of completion.
    fn take(
        &mut self,
        client: u32,
        handle: u32,
        verify: bool,
    ) -> crate::Result<B::Engine, Error> {
        let ctx = self.pool.find(Kind::Mac, client, handle)?;
        check!(self.pool.get_mut(ctx)?.verify == verify, Error::BadState);
        Ok(self.pool.free(ctx)?.engine)
    }
}

impl<B: hash::Builder, const N: usize> Provider for Mac<'_, B, N> {
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
            Opcode::SignSetup | Opcode::VerifySetup => {
                let req = ser.decode_setup_request(request)?;
                let verify = opcode == Opcode::VerifySetup;
                let result = self.setup(client, &req, verify);
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
            Opcode::Update => {
                let req = ser.decode_update_request(request)?;
                let result = self
                    .op(client, req.op_handle)
                    .and_then(|op| op.engine.update(req.data));
                respond(call, result, |r, out| ser.encode_update_response(r, out))
            }
            Opcode::SignFinish => {
                let req = ser.decode_sign_finish_request(request)?;
                let mut mac = [0; hash::MAX_DIGEST_LEN];
                let result = self
                    .take(client, req.op_handle, false)
                    .and_then(|mut e| e.finish(&mut mac));
                respond(call, result, |&len, out| {
                    let resp = SignFinishResponse { mac: &mac[..len] };
                    ser.encode_sign_finish_response(&resp, out)
                })
            }
            Opcode::VerifyFinish => {
                let req = ser.decode_verify_finish_request(request)?;
                let result = self
                    .take(client, req.op_handle, true)
                    .and_then(|mut e| e.verify(req.mac));
                respond(call, result, |r, out| {
                    ser.encode_verify_finish_response(r, out)
                })
            }
            Opcode::Abort => {
                let req = ser.decode_abort_request(request)?;
                self.pool.release(Kind::Mac, client, req.op_handle);
                respond(call, Ok(()), |r, out| ser.encode_abort_response(r, out))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::key::KeyStore;
    use crate::crypto::ring;
    use crate::protocol::Codec as _;
    use crate::protocol::PackedC;
    use crate::provider::test_util::*;
    use enumflags2::BitFlags;
    use pretty_assertions::assert_eq;
    use testutil::data::misc_crypto;

    fn hmac_key(store: &dyn key::Store, usage: BitFlags<Usage>, alg: u32) -> u32 {
        let attrs = key::Attributes {
            key_type: key::types::HMAC,
            bits: 0,
            lifetime: key::LIFETIME_VOLATILE,
            id: 0,
            usage,
            alg,
        };
        store.import(CLIENT, &attrs, misc_crypto::JEFE_KEY).unwrap()
    }

    fn setup(p: &mut dyn Provider, opcode: Opcode, key_id: u32, alg: u32) -> Outcome {
        call(
            p,
            &PackedC,
            opcode.to_wire_value(),
            &SetupRequest { key_id, alg },
        )
        .unwrap()
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn sign_and_verify() {
        let backend = ring::Backend::new();
        let store = KeyStore::<4>::new();
        let mut p: Mac<_> = Mac::new(&backend, &store);
        p.register_serializer(Encoding::PackedC, &PackedC);

        let hmac384 = alg::hmac(alg::SHA_384);
        let key = hmac_key(&store, Usage::SignHash | Usage::VerifyHash, hmac384);

        let r = setup(&mut p, Opcode::SignSetup, key, hmac384);
        assert_eq!(r.op_status, 0);
        let h: SetupResponse = PackedC.decode(&r.response).unwrap();
        for chunk in misc_crypto::JEFE_DATA.chunks(7) {
            let r = call(
                &mut p,
                &PackedC,
                Opcode::Update.to_wire_value(),
                &UpdateRequest {
                    op_handle: h.op_handle,
                    data: chunk,
                },
            )
            .unwrap();
            assert_eq!(r.op_status, 0);
        }

        // The wrong kind of completion leaves the operation alone.
        let r = call(
            &mut p,
            &PackedC,
            Opcode::VerifyFinish.to_wire_value(),
            &VerifyFinishRequest {
                op_handle: h.op_handle,
                mac: misc_crypto::JEFE_HMAC_SHA384,
            },
        )
        .unwrap();
        assert_eq!(r.op_status, Error::BadState.status());

        let r = call(
            &mut p,
            &PackedC,
            Opcode::SignFinish.to_wire_value(),
            &SignFinishRequest {
                op_handle: h.op_handle,
            },
        )
        .unwrap();
        assert_eq!(r.op_status, 0);
        let resp: SignFinishResponse = PackedC.decode(&r.response).unwrap();
        assert_eq!(resp.mac, misc_crypto::JEFE_HMAC_SHA384);

        let r = setup(&mut p, Opcode::VerifySetup, key, hmac384);
        let h: SetupResponse = PackedC.decode(&r.response).unwrap();
        call(
            &mut p,
            &PackedC,
            Opcode::Update.to_wire_value(),
            &UpdateRequest {
                op_handle: h.op_handle,
                data: misc_crypto::JEFE_DATA,
            },
        )
        .unwrap();
        let r = call(
            &mut p,
            &PackedC,
            Opcode::VerifyFinish.to_wire_value(),
            &VerifyFinishRequest {
                op_handle: h.op_handle,
                mac: misc_crypto::JEFE_HMAC_SHA256,
            },
        )
        .unwrap();
        assert_eq!(r.op_status, Error::InvalidSignature.status());
        assert_eq!(p.in_flight(), 0);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn key_policy() {
        let backend = ring::Backend::new();
        let store = KeyStore::<4>::new();
        let mut p: Mac<_> = Mac::new(&backend, &store);
        p.register_serializer(Encoding::PackedC, &PackedC);

        let hmac256 = alg::hmac(alg::SHA_256);
        let sign_only = hmac_key(&store, Usage::SignHash.into(), hmac256);

        let r = setup(&mut p, Opcode::VerifySetup, sign_only, hmac256);
        assert_eq!(r.op_status, Error::NotPermitted.status());
        let r = setup(&mut p, Opcode::SignSetup, sign_only, alg::hmac(alg::SHA_512));
        assert_eq!(r.op_status, Error::NotPermitted.status());
        let r = setup(&mut p, Opcode::SignSetup, sign_only, alg::SHA_256);
        assert_eq!(r.op_status, Error::NotSupported.status());
        let r = setup(&mut p, Opcode::SignSetup, sign_only + 1, hmac256);
        assert_eq!(r.op_status, Error::InvalidHandle.status());
        assert_eq!(p.in_flight(), 0);

        let r = setup(&mut p, Opcode::SignSetup, sign_only, hmac256);
        assert_eq!(r.op_status, 0);
        assert_eq!(p.in_flight(), 1);
    }
}

// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The multi-step hash provider.

use crate::crypto::hash;
use crate::crypto::hash::Engine as _;
use crate::crypto::hash::EngineExt as _;
use crate::crypto::pool;
use crate::crypto::pool::ContextPool;
use crate::crypto::pool::Kind;
use crate::crypto::Error;
use crate::protocol::hash::*;
use crate::protocol::wire::WireEnum as _;
use crate::protocol::Encoding;
use crate::provider::respond;
use crate::rpc;
use crate::rpc::CallRequest;
use crate::service::Provider;
use crate::service::Serializers;

/// A hash provider, holding up to `N` operations in flight.
pub struct Hash<'a, B: hash::Builder, const N: usize = { pool::DEFAULT_CAPACITY }> {
    backend: &'a B,
    pool: ContextPool<B::Engine, N>,
    serializers: Serializers<'a, dyn HashSerializer + 'a>,
}

impl<'a, B: hash::Builder, const N: usize> Hash<'a, B, N> {
    /// Creates a new provider over `backend`.
    pub fn new(backend: &'a B) -> Self {
        Self {
            backend,
            pool: ContextPool::new(),
            serializers: Serializers::new(),
        }
    }

    /// Registers the serializer table for `encoding`.
    pub fn register_serializer(
        &mut self,
        encoding: Encoding,
        table: &'a dyn HashSerializer,
    ) {
        self.serializers.register(encoding, table);
    }

    /// Returns the number of operations in flight.
    pub fn in_flight(&self) -> usize {
        self.pool.len()
    }

    fn setup(&mut self, client: u32, alg: u32) -> crate::Result<pool::Context, Error> {
        let algo =
            hash::Algo::from_alg(alg).ok_or_else(|| fail!(Error::NotSupported))?;
        let engine = self.backend.new_hash(algo)?;
        Ok(self.pool.alloc(Kind::Hash, client, engine)?)
    }

    fn engine(
        &mut self,
        client: u32,
        handle: u32,
    ) -> crate::Result<&mut B::Engine, Error> {
        let ctx = self.pool.find(Kind::Hash, client, handle)?;
        Ok(self.pool.get_mut(ctx)?)
    }

    /// Takes an operation out of the pool, for completion.
    fn take(&mut self, client: u32, handle: u32) -> crate::Result<B::Engine, Error> {
        let ctx = self.pool.find(Kind::Hash, client, handle)?;
        Ok(self.pool.free(ctx)?)
    }

    fn clone_op(&mut self, client: u32, handle: u32) -> crate::Result<u32, Error> {
        let fork = self.engine(client, handle)?.clone();
        let ctx = self.pool.alloc(Kind::Hash, client, fork)?;
        Ok(ctx.handle())
    }
}

impl<B: hash::Builder, const N: usize> Provider for Hash<'_, B, N> {
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
            Opcode::Update => {
                let req = ser.decode_update_request(request)?;
                let result = self
                    .engine(client, req.op_handle)
                    .and_then(|e| e.update(req.data));
                respond(call, result, |r, out| ser.encode_update_response(r, out))
            }
            Opcode::Finish => {
                let req = ser.decode_finish_request(request)?;
                let mut digest = [0; hash::MAX_DIGEST_LEN];
                let result = self
                    .take(client, req.op_handle)
                    .and_then(|mut e| e.finish(&mut digest));
                respond(call, result, |&len, out| {
                    let resp = FinishResponse {
                        hash: &digest[..len],
                    };
                    ser.encode_finish_response(&resp, out)
                })
            }
            Opcode::Verify => {
                let req = ser.decode_verify_request(request)?;
                let result = self
                    .take(client, req.op_handle)
                    .and_then(|mut e| e.verify(req.hash));
                respond(call, result, |r, out| ser.encode_verify_response(r, out))
            }
            Opcode::Abort => {
                let req = ser.decode_abort_request(request)?;
                self.pool.release(Kind::Hash, client, req.op_handle);
                respond(call, Ok(()), |r, out| ser.encode_abort_response(r, out))
            }
            Opcode::Clone => {
                let req = ser.decode_clone_request(request)?;
                let result = self.clone_op(client, req.source_op_handle);
                respond(call, result, |&handle, out| {
                    let resp = CloneResponse {
                        target_op_handle: handle,
                    };
                    ser.encode_clone_response(&resp, out)
                })
            }
        }
    }
}

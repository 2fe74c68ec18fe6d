// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The multi-step AEAD provider.

use crate::crypto::aead;
use crate::crypto::aead::Engine as _;
use crate::crypto::aead::TAG_LEN;
use crate::crypto::cipher::Direction;
use crate::crypto::csrng::Csrng;
use crate::crypto::key;
use crate::crypto::key::Usage;
use crate::crypto::pool;
use crate::crypto::pool::ContextPool;
use crate::crypto::pool::Kind;
use crate::crypto::Error;
use crate::protocol::aead::*;
use crate::protocol::wire::WireEnum as _;
use crate::protocol::Encoding;
use crate::provider::load_key;
use crate::provider::op_failed;
use crate::provider::respond;
use crate::provider::wipe;
use crate::provider::MAX_DATA_LEN;
use crate::rpc;
use crate::rpc::CallRequest;
use crate::service::Provider;
use crate::service::Serializers;

/// The longest nonce any supported algorithm needs.
const MAX_NONCE_LEN: usize = 16;

/// An AEAD operation in flight.
struct Op<E> {
    engine: E,
    direction: Direction,
}

/// An AEAD provider, holding up to `N` operations in flight.
pub struct Aead<'a, B: aead::Builder, const N: usize = { pool::DEFAULT_CAPACITY }> {
    backend: &'a B,
    store: &'a dyn key::Store,
    rng: &'a dyn Csrng,
    pool: ContextPool<Op<B::Engine>, N>,
    serializers: Serializers<'a, dyn AeadSerializer + 'a>,
}

impl<'a, B: aead::Builder, const N: usize> Aead<'a, B, N> {
    /// Creates a new provider over `backend`, using keys from `store` and
    /// generating nonces with `rng`.
    pub fn new(
        backend: &'a B,
        store: &'a dyn key::Store,
        rng: &'a dyn Csrng,
    ) -> Self {
        Self {
            backend,
            store,
            rng,
            pool: ContextPool::new(),
            serializers: Serializers::new(),
        }
    }

    /// Registers the serializer table for `encoding`.
    pub fn register_serializer(
        &mut self,
        encoding: Encoding,
        table: &'a dyn AeadSerializer,
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
        direction: Direction,
    ) -> crate::Result<pool::Context, Error> {
        let algo = aead::Algo::from_alg(req.alg)
            .ok_or_else(|| fail!(Error::NotSupported))?;
        let usage = match direction {
            Direction::Encrypt => Usage::Encrypt,
            Direction::Decrypt => Usage::Decrypt,
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
            self.backend
                .new_aead(algo, direction, key_type, &material[..len])
        });
        wipe(&mut material);

        let op = Op {
            engine: engine?,
            direction,
        };
        Ok(self.pool.alloc(Kind::Aead, client, op)?)
    }

    fn engine(
        &mut self,
        client: u32,
        handle: u32,
    ) -> crate::Result<&mut B::Engine, Error> {
        let ctx = self.pool.find(Kind::Aead, client, handle)?;
        Ok(&mut self.pool.get_mut(ctx)?.engine)
    }

    /// Takes an operation out of the pool for completion, checking that it
    /// runs in `direction`.
    fn take(
        &mut self,
        client: u32,
        handle: u32,
        direction: Direction,
    ) -> crate::Result<B::Engine, Error> {
        let ctx = self.pool.find(Kind::Aead, client, handle)?;
        check!(
            self.pool.get_mut(ctx)?.direction == direction,
            Error::BadState
        );
        Ok(self.pool.free(ctx)?.engine)
    }

    fn generate_nonce(
        &mut self,
        client: u32,
        handle: u32,
        nonce: &mut [u8; MAX_NONCE_LEN],
    ) -> crate::Result<usize, Error> {
        let rng = self.rng;
        let engine = self.engine(client, handle)?;
        let len = engine.nonce_len();
        check!(len <= MAX_NONCE_LEN, Error::NotSupported);
        rng.fill(&mut nonce[..len])?;
        engine.set_nonce(&nonce[..len])?;
        Ok(len)
    }
}

impl<B: aead::Builder, const N: usize> Provider for Aead<'_, B, N> {
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
            Opcode::EncryptSetup | Opcode::DecryptSetup => {
                let req = ser.decode_setup_request(request)?;
                let direction = match opcode {
                    Opcode::EncryptSetup => Direction::Encrypt,
                    _ => Direction::Decrypt,
                };
                let result = self.setup(client, &req, direction);
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
            Opcode::GenerateNonce => {
                let req = ser.decode_generate_nonce_request(request)?;
                let mut nonce = [0; MAX_NONCE_LEN];
                let result =
                    self.generate_nonce(client, req.op_handle, &mut nonce);
                respond(call, result, |&len, out| {
                    let resp = GenerateNonceResponse {
                        nonce: &nonce[..len],
                    };
                    ser.encode_generate_nonce_response(&resp, out)
                })
            }
            Opcode::SetNonce => {
                let req = ser.decode_set_nonce_request(request)?;
                let result = self
                    .engine(client, req.op_handle)
                    .and_then(|e| e.set_nonce(req.nonce));
                respond(call, result, |r, out| {
                    ser.encode_set_nonce_response(r, out)
                })
            }
            Opcode::SetLengths => {
                let req = ser.decode_set_lengths_request(request)?;
                let result =
                    self.engine(client, req.op_handle).and_then(|e| {
                        e.set_lengths(
                            req.ad_length as usize,
                            req.plaintext_length as usize,
                        )
                    });
                respond(call, result, |r, out| {
                    ser.encode_set_lengths_response(r, out)
                })
            }
            Opcode::UpdateAd => {
                let req = ser.decode_update_ad_request(request)?;
                let result = self
                    .engine(client, req.op_handle)
                    .and_then(|e| e.update_ad(req.data));
                respond(call, result, |r, out| {
                    ser.encode_update_ad_response(r, out)
                })
            }
            Opcode::Update => {
                let req = ser.decode_update_request(request)?;
                if req.data.len() > MAX_DATA_LEN {
                    return op_failed(call, fail!(Error::InsufficientMemory));
                }
                let mut output = [0; MAX_DATA_LEN];
                let result = self
                    .engine(client, req.op_handle)
                    .and_then(|e| e.update(req.data, &mut output));
                respond(call, result, |&len, out| {
                    let resp = UpdateResponse {
                        data: &output[..len],
                    };
                    ser.encode_update_response(&resp, out)
                })
            }
            Opcode::Finish => {
                let req = ser.decode_finish_request(request)?;
                let mut ciphertext = [0; MAX_DATA_LEN];
                let mut tag = [0; TAG_LEN];
                let result = self
                    .take(client, req.op_handle, Direction::Encrypt)
                    .and_then(|mut e| e.finish(&mut ciphertext, &mut tag));
                respond(call, result, |&(ct_len, tag_len), out| {
                    let resp = FinishResponse {
                        ciphertext: &ciphertext[..ct_len],
                        tag: &tag[..tag_len],
                    };
                    ser.encode_finish_response(&resp, out)
                })
            }
            Opcode::Verify => {
                let req = ser.decode_verify_request(request)?;
                let mut plaintext = [0; MAX_DATA_LEN];
                let result = self
                    .take(client, req.op_handle, Direction::Decrypt)
                    .and_then(|mut e| e.verify(req.tag, &mut plaintext));
                respond(call, result, |&len, out| {
                    let resp = VerifyResponse {
                        plaintext: &plaintext[..len],
                    };
                    ser.encode_verify_response(&resp, out)
                })
            }
            Opcode::Abort => {
                let req = ser.decode_abort_request(request)?;
                self.pool.release(Kind::Aead, client, req.op_handle);
                respond(call, Ok(()), |r, out| ser.encode_abort_response(r, out))
            }
        }
    }
}

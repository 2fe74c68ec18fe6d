// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The multi-step symmetric cipher provider.

use crate::crypto::cipher;
use crate::crypto::cipher::Direction;
use crate::crypto::cipher::Engine as _;
use crate::crypto::cipher::BLOCK_LEN;
use crate::crypto::csrng::Csrng;
use crate::crypto::key;
use crate::crypto::key::Usage;
use crate::crypto::pool;
use crate::crypto::pool::ContextPool;
use crate::crypto::pool::Kind;
use crate::crypto::Error;
use crate::protocol::cipher::*;
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

/// The longest IV any supported mode needs.
const MAX_IV_LEN: usize = 16;

/// A cipher provider, holding up to `N` operations in flight.
pub struct Cipher<'a, B: cipher::Builder, const N: usize = { pool::DEFAULT_CAPACITY }> {
    backend: &'a B,
    store: &'a dyn key::Store,
    rng: &'a dyn Csrng,
    pool: ContextPool<B::Engine, N>,
    serializers: Serializers<'a, dyn CipherSerializer + 'a>,
}

impl<'a, B: cipher::Builder, const N: usize> Cipher<'a, B, N> {
    /// Creates a new provider over `backend`, using keys from `store` and
    /// generating IVs with `rng`.
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
        table: &'a dyn CipherSerializer,
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
        let mode = cipher::Mode::from_alg(req.alg)
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
                .new_cipher(mode, direction, key_type, &material[..len])
        });
        wipe(&mut material);
        Ok(self.pool.alloc(Kind::Cipher, client, engine?)?)
    }

    fn engine(
        &mut self,
        client: u32,
        handle: u32,
    ) -> crate::Result<&mut B::Engine, Error> {
        let ctx = self.pool.find(Kind::Cipher, client, handle)?;
        Ok(self.pool.get_mut(ctx)?)
    }

    fn generate_iv(
        &mut self,
        client: u32,
        handle: u32,
        iv: &mut [u8; MAX_IV_LEN],
    ) -> crate::Result<usize, Error> {
        let rng = self.rng;
        let engine = self.engine(client, handle)?;
        let len = engine.iv_len();
        check!(len <= MAX_IV_LEN, Error::NotSupported);
        rng.fill(&mut iv[..len])?;
        engine.set_iv(&iv[..len])?;
        Ok(len)
    }
}

impl<B: cipher::Builder, const N: usize> Provider for Cipher<'_, B, N> {
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
            Opcode::GenerateIv => {
                let req = ser.decode_generate_iv_request(request)?;
                let mut iv = [0; MAX_IV_LEN];
                let result = self.generate_iv(client, req.op_handle, &mut iv);
                respond(call, result, |&len, out| {
                    let resp = GenerateIvResponse { iv: &iv[..len] };
                    ser.encode_generate_iv_response(&resp, out)
                })
            }
            Opcode::SetIv => {
                let req = ser.decode_set_iv_request(request)?;
                let result = self
                    .engine(client, req.op_handle)
                    .and_then(|e| e.set_iv(req.iv));
                respond(call, result, |r, out| ser.encode_set_iv_response(r, out))
            }
            Opcode::Update => {
                let req = ser.decode_update_request(request)?;
                if req.data.len() > MAX_DATA_LEN {
                    return op_failed(call, fail!(Error::InsufficientMemory));
                }
                let mut output = [0; MAX_DATA_LEN + BLOCK_LEN];
                let result = self
                    .engine(client, req.op_handle)
                    .and_then(|e| e.update(req.data, &mut output));
                respond(call, result, |&len, out| {
                    let resp = OutputResponse {
                        data: &output[..len],
                    };
                    ser.encode_update_response(&resp, out)
                })
            }
            Opcode::Finish => {
                let req = ser.decode_finish_request(request)?;
                let mut output = [0; BLOCK_LEN];
                let result = self
                    .pool
                    .find(Kind::Cipher, client, req.op_handle)
                    .and_then(|ctx| self.pool.free(ctx))
                    .map_err(|e| e.cast::<Error>())
                    .and_then(|mut e| e.finish(&mut output));
                respond(call, result, |&len, out| {
                    let resp = OutputResponse {
                        data: &output[..len],
                    };
                    ser.encode_finish_response(&resp, out)
                })
            }
            Opcode::Abort => {
                let req = ser.decode_abort_request(request)?;
                self.pool.release(Kind::Cipher, client, req.op_handle);
                respond(call, Ok(()), |r, out| ser.encode_abort_response(r, out))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::alg;
    use crate::crypto::key::KeyStore;
    use crate::crypto::ring;
    use crate::protocol::Codec;
    use crate::protocol::PackedC;
    use crate::protocol::Schema;
    use crate::provider::test_util::*;
    use pretty_assertions::assert_eq;
    use testutil::data::aes as vectors;

    fn aes_key(store: &dyn key::Store) -> u32 {
        let attrs = key::Attributes {
            key_type: key::types::AES,
            bits: 128,
            lifetime: key::LIFETIME_VOLATILE,
            id: 0,
            usage: Usage::Encrypt | Usage::Decrypt,
            alg: 0,
        };
        store.import(CLIENT, &attrs, vectors::KEY_128).unwrap()
    }

    fn setup<C: Codec>(
        p: &mut dyn Provider,
        codec: &C,
        opcode: Opcode,
        key_id: u32,
        alg: u32,
    ) -> u32 {
        let r = call(p, codec, opcode.to_wire_value(), &SetupRequest { key_id, alg })
            .unwrap();
        assert_eq!(r.op_status, 0);
        let resp: SetupResponse = codec.decode(&r.response).unwrap();
        resp.op_handle
    }

    fn update<C: Codec>(
        p: &mut dyn Provider,
        codec: &C,
        handle: u32,
        data: &[u8],
    ) -> Vec<u8> {
        let r = call(
            p,
            codec,
            Opcode::Update.to_wire_value(),
            &UpdateRequest {
                op_handle: handle,
                data,
            },
        )
        .unwrap();
        assert_eq!(r.op_status, 0);
        let resp: OutputResponse = codec.decode(&r.response).unwrap();
        resp.data.to_vec()
    }

    fn finish<C: Codec>(p: &mut dyn Provider, codec: &C, handle: u32) -> Outcome {
        call(
            p,
            codec,
            Opcode::Finish.to_wire_value(),
            &FinishRequest { op_handle: handle },
        )
        .unwrap()
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn cbc_known_answer() {
        let backend = ring::Backend::new();
        let store = KeyStore::<4>::new();
        let rng = ring::csrng::Csrng::new();
        let mut p: Cipher<_> = Cipher::new(&backend, &store, &rng);
        p.register_serializer(Encoding::Schema, &Schema);
        let key = aes_key(&store);

        let h = setup(&mut p, &Schema, Opcode::EncryptSetup, key, alg::CBC_NO_PADDING);
        let r = call(
            &mut p,
            &Schema,
            Opcode::SetIv.to_wire_value(),
            &SetIvRequest {
                op_handle: h,
                iv: vectors::CBC_IV,
            },
        )
        .unwrap();
        assert_eq!(r.op_status, 0);

        let mut ct = update(&mut p, &Schema, h, &vectors::PLAINTEXT[..20]);
        ct.extend(update(&mut p, &Schema, h, &vectors::PLAINTEXT[20..]));
        let r = finish(&mut p, &Schema, h);
        assert_eq!(r.op_status, 0);
        assert_eq!(ct, vectors::CBC_128_CIPHERTEXT);
        assert_eq!(p.in_flight(), 0);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn generated_iv_round_trip() {
        let backend = ring::Backend::new();
        let store = KeyStore::<4>::new();
        let rng = ring::csrng::Csrng::new();
        let mut p: Cipher<_> = Cipher::new(&backend, &store, &rng);
        p.register_serializer(Encoding::PackedC, &PackedC);
        let key = aes_key(&store);
        let msg = b"the quick brown fox jumps over the lazy dog";

        let enc = setup(&mut p, &PackedC, Opcode::EncryptSetup, key, alg::CBC_PKCS7);
        let r = call(
            &mut p,
            &PackedC,
            Opcode::GenerateIv.to_wire_value(),
            &GenerateIvRequest { op_handle: enc },
        )
        .unwrap();
        assert_eq!(r.op_status, 0);
        let resp: GenerateIvResponse = PackedC.decode(&r.response).unwrap();
        let iv = resp.iv.to_vec();
        assert_eq!(iv.len(), BLOCK_LEN);

        // The IV is already set.
        let r = call(
            &mut p,
            &PackedC,
            Opcode::SetIv.to_wire_value(),
            &SetIvRequest {
                op_handle: enc,
                iv: &iv,
            },
        )
        .unwrap();
        assert_eq!(r.op_status, Error::BadState.status());

        let mut ct = update(&mut p, &PackedC, enc, &msg[..10]);
        ct.extend(update(&mut p, &PackedC, enc, &msg[10..]));
        let r = finish(&mut p, &PackedC, enc);
        let resp: OutputResponse = PackedC.decode(&r.response).unwrap();
        ct.extend_from_slice(resp.data);
        assert_eq!(ct.len(), 48);

        let dec = setup(&mut p, &PackedC, Opcode::DecryptSetup, key, alg::CBC_PKCS7);
        call(
            &mut p,
            &PackedC,
            Opcode::SetIv.to_wire_value(),
            &SetIvRequest {
                op_handle: dec,
                iv: &iv,
            },
        )
        .unwrap();
        let mut pt = update(&mut p, &PackedC, dec, &ct);
        let r = finish(&mut p, &PackedC, dec);
        let resp: OutputResponse = PackedC.decode(&r.response).unwrap();
        pt.extend_from_slice(resp.data);
        assert_eq!(pt, &msg[..]);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn lifecycle_errors() {
        let backend = ring::Backend::new();
        let store = KeyStore::<4>::new();
        let rng = ring::csrng::Csrng::new();
        let mut p: Cipher<_> = Cipher::new(&backend, &store, &rng);
        p.register_serializer(Encoding::PackedC, &PackedC);
        let key = aes_key(&store);

        let r = call(
            &mut p,
            &PackedC,
            Opcode::EncryptSetup.to_wire_value(),
            &SetupRequest {
                key_id: key,
                alg: alg::GCM,
            },
        )
        .unwrap();
        assert_eq!(r.op_status, Error::NotSupported.status());

        let h = setup(&mut p, &PackedC, Opcode::EncryptSetup, key, alg::CTR);
        let r = call(
            &mut p,
            &PackedC,
            Opcode::Update.to_wire_value(),
            &UpdateRequest {
                op_handle: h,
                data: b"no iv yet",
            },
        )
        .unwrap();
        assert_eq!(r.op_status, Error::BadState.status());

        call(
            &mut p,
            &PackedC,
            Opcode::Abort.to_wire_value(),
            &AbortRequest { op_handle: h },
        )
        .unwrap();
        let r = finish(&mut p, &PackedC, h);
        assert_eq!(r.op_status, Error::BadState.status());
        assert_eq!(p.in_flight(), 0);
    }
}

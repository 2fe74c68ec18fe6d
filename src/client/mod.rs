// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The client side of the crypto service.
//!
//! [`Crypto`] turns each crypto operation into one call on some
//! [`Caller`], serializing the request in a fixed dialect. Outputs that the
//! service returns as byte strings are copied into caller-provided buffers,
//! since the response only lives until the call ends.
//!
//! Methods are grouped by operation family, one submodule each.

use serde::Serialize;

use crate::crypto;
use crate::io::Cursor;
use crate::protocol::wire;
use crate::protocol::wire::ToWire;
use crate::protocol::Codec;
use crate::protocol::Message;
use crate::provider::MAX_DATA_LEN;
use crate::rpc;
use crate::rpc::Caller;

mod aead;
mod cipher;
mod hash;
mod key_derivation;
mod keys;
mod mac;

/// The largest request a [`Crypto`] will send.
pub const MAX_REQUEST_LEN: usize = MAX_DATA_LEN + 128;

/// An error from a crypto call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The call itself failed; the operation never ran, or its response
    /// could not be read.
    Rpc(rpc::Error),
    /// The call went through, but the operation failed.
    Op(crypto::Error),
}

impl From<rpc::Error> for Error {
    fn from(e: rpc::Error) -> Self {
        Self::Rpc(e)
    }
}

impl From<crypto::Error> for Error {
    fn from(e: crypto::Error) -> Self {
        Self::Op(e)
    }
}

debug_from!(Error => rpc::Error, crypto::Error);

/// A crypto service client.
pub struct Crypto<C, K> {
    caller: C,
    codec: K,
    scratch: [u8; MAX_REQUEST_LEN],
}

impl<C: Caller, K: Codec> Crypto<C, K> {
    /// Creates a new client that makes calls on `caller`, encoded with
    /// `codec`.
    ///
    /// `codec` must match the encoding `caller` was set up with.
    pub fn new(caller: C, codec: K) -> Self {
        Self {
            caller,
            codec,
            scratch: [0; MAX_REQUEST_LEN],
        }
    }

    /// Returns the underlying caller.
    pub fn caller(&mut self) -> &mut C {
        &mut self.caller
    }

    /// Unwraps this client.
    pub fn into_inner(self) -> C {
        self.caller
    }

    /// Makes one call, handing the response to `read` if the operation
    /// succeeded.
    ///
    /// The call is always ended, even if it failed.
    fn call<M, R>(
        &mut self,
        opcode: u16,
        req: &M,
        read: impl FnOnce(&K, &[u8]) -> crate::Result<R, Error>,
    ) -> crate::Result<R, Error>
    where
        M: ToWire + Serialize,
    {
        let mut cursor = Cursor::new(&mut self.scratch);
        self.codec
            .encode(req, &mut cursor)
            .map_err(|e| e.map(|_| Error::Rpc(rpc::Error::InvalidParameter)))?;
        let len = cursor.consumed_len();

        let (handle, buf) =
            self.caller.begin(len).map_err(|e| e.cast::<Error>())?;
        buf[..len].copy_from_slice(&self.scratch[..len]);

        let result = match self.caller.invoke(handle, opcode) {
            Ok(reply) => match crypto::Error::from_status(reply.op_status) {
                Ok(()) => read(&self.codec, reply.response),
                Err(e) => Err(fail!(Error::Op(e))),
            },
            Err(e) => Err(e.cast::<Error>()),
        };
        let ended = self.caller.end(handle).map_err(|e| e.cast::<Error>());
        let value = result?;
        ended?;
        Ok(value)
    }

    /// Makes a call whose response carries nothing.
    fn call_unit<M: ToWire + Serialize>(
        &mut self,
        opcode: u16,
        req: &M,
    ) -> crate::Result<(), Error> {
        self.call(opcode, req, |_, _| Ok(()))
    }
}

/// Decodes a response, mapping failures to
/// [`rpc::Error::InvalidResponseBody`].
fn decode<'wire, K: Codec, M: Message<'wire>>(
    codec: &K,
    bytes: &'wire [u8],
) -> crate::Result<M, Error> {
    codec.decode(bytes).map_err(|e: crate::Error<wire::Error>| {
        e.map(|_| Error::Rpc(rpc::Error::InvalidResponseBody))
    })
}

/// Copies a byte string out of a response.
fn copy_out(data: &[u8], out: &mut [u8]) -> crate::Result<usize, Error> {
    check!(
        out.len() >= data.len(),
        Error::Op(crypto::Error::BufferTooSmall)
    );
    out[..data.len()].copy_from_slice(data);
    Ok(data.len())
}

#[cfg(test)]
pub(crate) mod test_util {
    //! A complete in-process stack for client tests.

    use crate::crypto::key::KeyStore;
    use crate::crypto::ring;
    use crate::protocol::Codec;
    use crate::protocol::Encoding;
    use crate::protocol::PackedC;
    use crate::protocol::Schema;
    use crate::provider;
    use crate::rpc::direct::Direct;
    use crate::rpc::session::Session;
    use crate::rpc::session::SessionOptions;
    use crate::service::Options;
    use crate::service::ServiceProvider;

    use super::Crypto;

    /// Shared state that every provider borrows.
    pub struct World {
        pub backend: ring::Backend,
        pub rng: ring::csrng::Csrng,
        pub store: KeyStore<8>,
    }

    impl World {
        pub fn new() -> Self {
            Self {
                backend: ring::Backend::new(),
                rng: ring::csrng::Csrng::new(),
                store: KeyStore::new(),
            }
        }
    }

    /// Builds every provider over `world`, wires them into an endpoint
    /// and a session speaking `codec`, and hands a client to `f`.
    pub fn with_client<K: Codec + Copy>(
        world: &World,
        codec: K,
        f: impl FnOnce(&mut Crypto<&mut dyn crate::rpc::Caller, K>),
    ) {
        let mut keys = provider::keys::Keys::new(&world.store, &world.rng);
        let mut hash: provider::hash::Hash<_> =
            provider::hash::Hash::new(&world.backend);
        let mut mac: provider::mac::Mac<_> =
            provider::mac::Mac::new(&world.backend, &world.store);
        let mut cipher: provider::cipher::Cipher<_> = provider::cipher::Cipher::new(
            &world.backend,
            &world.store,
            &world.rng,
        );
        let mut aead: provider::aead::Aead<_> =
            provider::aead::Aead::new(&world.backend, &world.store, &world.rng);
        let mut kdf: provider::key_derivation::KeyDerivation<_> =
            provider::key_derivation::KeyDerivation::new(
                &world.backend,
                &world.store,
            );

        for &encoding in &Encoding::ALL {
            match encoding {
                Encoding::PackedC => {
                    keys.register_serializer(encoding, &PackedC);
                    hash.register_serializer(encoding, &PackedC);
                    mac.register_serializer(encoding, &PackedC);
                    cipher.register_serializer(encoding, &PackedC);
                    aead.register_serializer(encoding, &PackedC);
                    kdf.register_serializer(encoding, &PackedC);
                }
                Encoding::Schema => {
                    keys.register_serializer(encoding, &Schema);
                    hash.register_serializer(encoding, &Schema);
                    mac.register_serializer(encoding, &Schema);
                    cipher.register_serializer(encoding, &Schema);
                    aead.register_serializer(encoding, &Schema);
                    kdf.register_serializer(encoding, &Schema);
                }
            }
        }

        let mut endpoint =
            ServiceProvider::<6>::new(&mut keys, Options::default());
        endpoint.extend(&mut hash).unwrap();
        endpoint.extend(&mut mac).unwrap();
        endpoint.extend(&mut cipher).unwrap();
        endpoint.extend(&mut aead).unwrap();
        endpoint.extend(&mut kdf).unwrap();

        let mut memory = vec![0; 8192];
        let mut session = Session::open(
            Direct::new(&mut endpoint),
            &mut memory,
            SessionOptions {
                encoding: codec.encoding(),
                caller_id: 1,
                ..Default::default()
            },
        )
        .unwrap();
        let mut client =
            Crypto::new(&mut session as &mut dyn crate::rpc::Caller, codec);
        f(&mut client);
    }
}

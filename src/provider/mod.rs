// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The crypto service.
//!
//! Each operation family is served by its own [`service::Provider`]:
//! [`keys::Keys`] is the core provider, which an endpoint is created
//! around, and the others are extensions. A sample setup looks something
//! like this:
//! ```text
//! let backend = crypto::ring::Backend::new();
//! let rng = crypto::ring::csrng::Csrng::new();
//! let store = KeyStore::<16>::new();
//! let mut keys = keys::Keys::new(&store, &rng);
//! let mut hash: hash::Hash<_> = hash::Hash::new(&backend);
//! keys.register_serializer(Encoding::PackedC, &PackedC);
//! hash.register_serializer(Encoding::PackedC, &PackedC);
//!
//! let mut endpoint = ServiceProvider::<4>::new(&mut keys, opts);
//! endpoint.extend(&mut hash)?;
//! ```
//!
//! Providers that keep operations in flight across calls (every one but the
//! core) own a [`pool::ContextPool`] of backend engines, whose capacity is
//! a const generic of the provider.
//!
//! Every handler follows the same shape: the request is decoded with the
//! serializer table for the call's encoding (a failure here means the call
//! is rejected), the operation runs against the backend, and either its
//! error becomes the call's `op_status`, or its result is encoded as the
//! response.
//!
//! [`service::Provider`]: crate::service::Provider

use crate::crypto;
use crate::io::Cursor;
use crate::rpc;
use crate::rpc::CallRequest;

#[cfg(doc)]
use crate::crypto::pool;

pub mod aead;
pub mod cipher;
pub mod hash;
pub mod key_derivation;
pub mod keys;
pub mod mac;

/// The most data a provider will consume or produce in a single call.
pub const MAX_DATA_LEN: usize = 1024;

/// Records a failed operation.
///
/// The call is still accepted: `e` becomes its `op_status`, and it has no
/// response.
fn op_failed(
    call: &mut CallRequest,
    e: crate::Error<crypto::Error>,
) -> crate::Result<(), rpc::Error> {
    let e = e.into_inner();
    trace!("opcode {:#06x} failed: {:?}", call.opcode, e);
    call.op_status = e.status();
    call.response.clear();
    Ok(())
}

/// Records the outcome of an operation, encoding the response of a
/// successful one with `encode`.
fn respond<T>(
    call: &mut CallRequest,
    result: crate::Result<T, crypto::Error>,
    encode: impl FnOnce(&T, &mut Cursor) -> crate::Result<(), rpc::Error>,
) -> crate::Result<(), rpc::Error> {
    match result {
        Ok(value) => {
            call.op_status = crypto::SUCCESS;
            call.response.write_with(|out| encode(&value, out))
        }
        Err(e) => op_failed(call, e),
    }
}

/// Looks up the material of a key for use by an operation, checking the
/// key's policy.
///
/// Returns the key's type and the length of the material written to `buf`.
fn load_key(
    store: &dyn crypto::key::Store,
    client_id: u32,
    key_id: u32,
    usage: crypto::key::Usage,
    alg: u32,
    buf: &mut [u8; crypto::key::MAX_KEY_LEN],
) -> crate::Result<(u32, usize), crypto::Error> {
    let attrs = store.attributes(client_id, key_id)?;
    let len = store.material(client_id, key_id, usage, Some(alg), buf)?;
    Ok((attrs.key_type, len))
}

/// Zeroes a key buffer once it is no longer needed.
fn wipe(buf: &mut [u8]) {
    for b in buf {
        *b = 0;
    }
}

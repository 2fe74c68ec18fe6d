// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Hash calls.

use crate::client::copy_out;
use crate::client::decode;
use crate::client::Crypto;
use crate::client::Error;
use crate::protocol::hash::*;
use crate::protocol::wire::WireEnum as _;
use crate::protocol::Codec;
use crate::rpc::Caller;

impl<C: Caller, K: Codec> Crypto<C, K> {
    /// Starts a hash operation, returning its handle.
    pub fn hash_setup(&mut self, alg: u32) -> crate::Result<u32, Error> {
        self.call(
            Opcode::Setup.to_wire_value(),
            &SetupRequest { alg },
            |k, r| Ok(decode::<_, SetupResponse>(k, r)?.op_handle),
        )
    }

    /// Feeds `data` to a hash operation.
    pub fn hash_update(
        &mut self,
        op_handle: u32,
        data: &[u8],
    ) -> crate::Result<(), Error> {
        self.call_unit(
            Opcode::Update.to_wire_value(),
            &UpdateRequest { op_handle, data },
        )
    }

    /// Completes a hash operation, writing the digest to `out` and returning
    /// its length.
    pub fn hash_finish(
        &mut self,
        op_handle: u32,
        out: &mut [u8],
    ) -> crate::Result<usize, Error> {
        self.call(
            Opcode::Finish.to_wire_value(),
            &FinishRequest { op_handle },
            |k, r| copy_out(decode::<_, FinishResponse>(k, r)?.hash, out),
        )
    }

    /// Completes a hash operation by comparing against `hash`.
    pub fn hash_verify(
        &mut self,
        op_handle: u32,
        hash: &[u8],
    ) -> crate::Result<(), Error> {
        self.call_unit(
            Opcode::Verify.to_wire_value(),
            &VerifyRequest { op_handle, hash },
        )
    }

    /// Abandons a hash operation.
    pub fn hash_abort(&mut self, op_handle: u32) -> crate::Result<(), Error> {
        self.call_unit(Opcode::Abort.to_wire_value(), &AbortRequest { op_handle })
    }

    /// Forks a hash operation, returning the new operation's handle.
    pub fn hash_clone(&mut self, op_handle: u32) -> crate::Result<u32, Error> {
        self.call(
            Opcode::Clone.to_wire_value(),
            &CloneRequest {
                source_op_handle: op_handle,
            },
            |k, r| Ok(decode::<_, CloneResponse>(k, r)?.target_op_handle),
        )
    }
}

#[cfg(test)]
mod test {
    use crate::client::test_util::*;
    use crate::client::Error;
    use crate::crypto;
    use crate::crypto::alg;
    use crate::protocol::PackedC;
    use crate::protocol::Schema;
    use pretty_assertions::assert_eq;
    use testutil::data::misc_crypto;

    #[test]
    #[cfg_attr(miri, ignore)]
    fn digests() {
        let world = World::new();
        with_client(&world, PackedC, |client| {
            for &(alg, expected) in &[
                (alg::SHA_256, misc_crypto::ABC_SHA256),
                (alg::SHA_384, misc_crypto::ABC_SHA384),
                (alg::SHA_512, misc_crypto::ABC_SHA512),
            ] {
                let h = client.hash_setup(alg).unwrap();
                client.hash_update(h, misc_crypto::ABC).unwrap();
                let mut out = [0; 64];
                let len = client.hash_finish(h, &mut out).unwrap();
                assert_eq!(&out[..len], expected);
            }
        });
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn clone_and_verify() {
        let world = World::new();
        with_client(&world, Schema, |client| {
            let h = client.hash_setup(alg::SHA_256).unwrap();
            client.hash_update(h, b"a").unwrap();
            let fork = client.hash_clone(h).unwrap();
            client.hash_update(h, b"bc").unwrap();
            client.hash_update(fork, b"bc").unwrap();
            client.hash_verify(h, misc_crypto::ABC_SHA256).unwrap();
            client.hash_verify(fork, misc_crypto::ABC_SHA256).unwrap();

            let h = client.hash_setup(alg::SHA_256).unwrap();
            client.hash_abort(h).unwrap();
            let err = client.hash_update(h, b"late").unwrap_err();
            assert_eq!(err.into_inner(), Error::Op(crypto::Error::BadState));
        });
    }
}

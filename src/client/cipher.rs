// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Cipher calls.

use crate::client::copy_out;
use crate::client::decode;
use crate::client::Crypto;
use crate::client::Error;
use crate::protocol::cipher::*;
use crate::protocol::wire::WireEnum as _;
use crate::protocol::Codec;
use crate::rpc::Caller;

impl<C: Caller, K: Codec> Crypto<C, K> {
    fn cipher_setup(
        &mut self,
        opcode: Opcode,
        key_id: u32,
        alg: u32,
    ) -> crate::Result<u32, Error> {
        self.call(
            opcode.to_wire_value(),
            &SetupRequest { key_id, alg },
            |k, r| Ok(decode::<_, SetupResponse>(k, r)?.op_handle),
        )
    }

    /// Starts an encryption, returning the operation's handle.
    pub fn cipher_encrypt_setup(
        &mut self,
        key_id: u32,
        alg: u32,
    ) -> crate::Result<u32, Error> {
        self.cipher_setup(Opcode::EncryptSetup, key_id, alg)
    }

    /// Starts a decryption, returning the operation's handle.
    pub fn cipher_decrypt_setup(
        &mut self,
        key_id: u32,
        alg: u32,
    ) -> crate::Result<u32, Error> {
        self.cipher_setup(Opcode::DecryptSetup, key_id, alg)
    }

    /// Has the service pick an IV, writing it to `out` and returning its
    /// length.
    pub fn cipher_generate_iv(
        &mut self,
        op_handle: u32,
        out: &mut [u8],
    ) -> crate::Result<usize, Error> {
        self.call(
            Opcode::GenerateIv.to_wire_value(),
            &GenerateIvRequest { op_handle },
            |k, r| copy_out(decode::<_, GenerateIvResponse>(k, r)?.iv, out),
        )
    }

    /// Sets an operation's IV.
    pub fn cipher_set_iv(
        &mut self,
        op_handle: u32,
        iv: &[u8],
    ) -> crate::Result<(), Error> {
        self.call_unit(
            Opcode::SetIv.to_wire_value(),
            &SetIvRequest { op_handle, iv },
        )
    }

    /// Processes `input`, writing any output to `out` and returning its
    /// length.
    pub fn cipher_update(
        &mut self,
        op_handle: u32,
        input: &[u8],
        out: &mut [u8],
    ) -> crate::Result<usize, Error> {
        self.call(
            Opcode::Update.to_wire_value(),
            &UpdateRequest {
                op_handle,
                data: input,
            },
            |k, r| copy_out(decode::<_, OutputResponse>(k, r)?.data, out),
        )
    }

    /// Completes an operation, writing any remaining output to `out` and
    /// returning its length.
    pub fn cipher_finish(
        &mut self,
        op_handle: u32,
        out: &mut [u8],
    ) -> crate::Result<usize, Error> {
        self.call(
            Opcode::Finish.to_wire_value(),
            &FinishRequest { op_handle },
            |k, r| copy_out(decode::<_, OutputResponse>(k, r)?.data, out),
        )
    }

    /// Abandons a cipher operation.
    pub fn cipher_abort(&mut self, op_handle: u32) -> crate::Result<(), Error> {
        self.call_unit(Opcode::Abort.to_wire_value(), &AbortRequest { op_handle })
    }
}

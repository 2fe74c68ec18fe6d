// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! MAC calls.

use crate::client::copy_out;
use crate::client::decode;
use crate::client::Crypto;
use crate::client::Error;
use crate::protocol::mac::*;
use crate::protocol::wire::WireEnum as _;
use crate::protocol::Codec;
use crate::rpc::Caller;

impl<C: Caller, K: Codec> Crypto<C, K> {
    fn mac_setup(
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

    /// Starts computing a MAC, returning the operation's handle.
    pub fn mac_sign_setup(
        &mut self,
        key_id: u32,
        alg: u32,
    ) -> crate::Result<u32, Error> {
        self.mac_setup(Opcode::SignSetup, key_id, alg)
    }

    /// Starts checking a MAC, returning the operation's handle.
    pub fn mac_verify_setup(
        &mut self,
        key_id: u32,
        alg: u32,
    ) -> crate::Result<u32, Error> {
        self.mac_setup(Opcode::VerifySetup, key_id, alg)
    }

    /// Feeds `data` to a MAC operation.
    pub fn mac_update(
        &mut self,
        op_handle: u32,
        data: &[u8],
    ) -> crate::Result<(), Error> {
        self.call_unit(
            Opcode::Update.to_wire_value(),
            &UpdateRequest { op_handle, data },
        )
    }

    /// Completes a signing MAC operation, writing the MAC to `out` and
    /// returning its length.
    pub fn mac_sign_finish(
        &mut self,
        op_handle: u32,
        out: &mut [u8],
    ) -> crate::Result<usize, Error> {
        self.call(
            Opcode::SignFinish.to_wire_value(),
            &SignFinishRequest { op_handle },
            |k, r| copy_out(decode::<_, SignFinishResponse>(k, r)?.mac, out),
        )
    }

    /// Completes a verifying MAC operation by comparing against `mac`.
    pub fn mac_verify_finish(
        &mut self,
        op_handle: u32,
        mac: &[u8],
    ) -> crate::Result<(), Error> {
        self.call_unit(
            Opcode::VerifyFinish.to_wire_value(),
            &VerifyFinishRequest { op_handle, mac },
        )
    }

    /// Abandons a MAC operation.
    pub fn mac_abort(&mut self, op_handle: u32) -> crate::Result<(), Error> {
        self.call_unit(Opcode::Abort.to_wire_value(), &AbortRequest { op_handle })
    }
}

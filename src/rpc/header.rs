// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Call framing headers.
//!
//! When a call crosses a shared-memory boundary, the request parameters are
//! preceded by a [`CallHeader`] and the response parameters by a
//! [`ResponseHeader`]. Both are always packed, regardless of the encoding of
//! the parameters they frame.

message! {
    /// Precedes the request parameters of a call.
    pub struct CallHeader {
        /// The identity of the caller. A transport running at a higher
        /// privilege level than the caller fills this in.
        caller_id: u32,
        /// The interface instance the call is addressed to.
        interface_id: u16,
        /// The requested operation.
        opcode: u16,
        /// The [`Encoding`](crate::protocol::Encoding) of the parameters.
        encoding: u16,
        /// The length of the request parameters.
        param_len: u16,
    }
}

message! {
    /// Precedes the response parameters of a call.
    pub struct ResponseHeader {
        /// The RPC-level status; see [`rpc::Error`](super::Error).
        rpc_status: i16,
        /// The operation status, only meaningful if the call was accepted.
        op_status: i16,
        /// The length of the response parameters.
        param_len: u16,
    }
}

impl CallHeader {
    /// The encoded length of a `CallHeader`.
    pub const LEN: usize = 12;
}

impl ResponseHeader {
    /// The encoded length of a `ResponseHeader`.
    pub const LEN: usize = 6;
}

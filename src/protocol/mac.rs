// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Multi-step MAC messages.

wire_enum! {
    /// A MAC opcode.
    pub enum Opcode: u16 {
        /// See [`SetupRequest`].
        SignSetup = 0x0400,
        /// See [`SetupRequest`].
        VerifySetup = 0x0401,
        /// See [`UpdateRequest`].
        Update = 0x0402,
        /// See [`SignFinishRequest`].
        SignFinish = 0x0403,
        /// See [`VerifyFinishRequest`].
        VerifyFinish = 0x0404,
        /// See [`AbortRequest`].
        Abort = 0x0405,
    }
}

message! {
    /// Starts a MAC operation.
    pub struct SetupRequest {
        /// The MAC key.
        key_id: u32,
        /// The MAC algorithm.
        alg: u32,
    }
}

message! {
    /// The handle of a new MAC operation.
    pub struct SetupResponse {
        /// The operation handle.
        op_handle: u32,
    }
}

message! {
    /// Feeds bytes into a MAC operation.
    pub struct UpdateRequest<'wire> {
        /// The operation handle.
        op_handle: u32,
    } tlv {
        /// The bytes to authenticate.
        1 => data,
    }
}

message! {
    /// Completes a signing MAC operation.
    pub struct SignFinishRequest {
        /// The operation handle.
        op_handle: u32,
    }
}

message! {
    /// A computed MAC.
    pub struct SignFinishResponse<'wire> {
    } tlv {
        /// The MAC.
        1 => mac,
    }
}

message! {
    /// Completes a verifying MAC operation.
    pub struct VerifyFinishRequest<'wire> {
        /// The operation handle.
        op_handle: u32,
    } tlv {
        /// The MAC to check.
        1 => mac,
    }
}

message! {
    /// Abandons a MAC operation.
    pub struct AbortRequest {
        /// The operation handle.
        op_handle: u32,
    }
}

serializer! {
    /// Serializer table for the MAC family.
    pub trait MacSerializer {
        setup<'a>: SetupRequest => SetupResponse,
        update<'a>: UpdateRequest<'a> => (),
        sign_finish<'a>: SignFinishRequest => SignFinishResponse<'_>,
        verify_finish<'a>: VerifyFinishRequest<'a> => (),
        abort<'a>: AbortRequest => (),
    }
}

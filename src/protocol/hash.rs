// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Multi-step hash messages.

wire_enum! {
    /// A hash opcode.
    pub enum Opcode: u16 {
        /// See [`SetupRequest`].
        Setup = 0x0200,
        /// See [`UpdateRequest`].
        Update = 0x0201,
        /// See [`FinishRequest`].
        Finish = 0x0202,
        /// See [`AbortRequest`].
        Abort = 0x0203,
        /// See [`VerifyRequest`].
        Verify = 0x0204,
        /// See [`CloneRequest`].
        Clone = 0x0205,
    }
}

message! {
    /// Starts a hash operation.
    pub struct SetupRequest {
        /// The hash algorithm.
        alg: u32,
    }
}

message! {
    /// The handle of a new hash operation.
    pub struct SetupResponse {
        /// The operation handle.
        op_handle: u32,
    }
}

message! {
    /// Feeds bytes into a hash operation.
    pub struct UpdateRequest<'wire> {
        /// The operation handle.
        op_handle: u32,
    } tlv {
        /// The bytes to hash.
        1 => data,
    }
}

message! {
    /// Completes a hash operation.
    pub struct FinishRequest {
        /// The operation handle.
        op_handle: u32,
    }
}

message! {
    /// A computed digest.
    pub struct FinishResponse<'wire> {
    } tlv {
        /// The digest.
        1 => hash,
    }
}

message! {
    /// Abandons a hash operation.
    pub struct AbortRequest {
        /// The operation handle.
        op_handle: u32,
    }
}

message! {
    /// Completes a hash operation by comparing against an expected digest.
    pub struct VerifyRequest<'wire> {
        /// The operation handle.
        op_handle: u32,
    } tlv {
        /// The expected digest.
        1 => hash,
    }
}

message! {
    /// Duplicates a hash operation.
    pub struct CloneRequest {
        /// The operation to duplicate.
        source_op_handle: u32,
    }
}

message! {
    /// The handle of a duplicated operation.
    pub struct CloneResponse {
        /// The new operation's handle.
        target_op_handle: u32,
    }
}

serializer! {
    /// Serializer table for the hash family.
    pub trait HashSerializer {
        setup<'a>: SetupRequest => SetupResponse,
        update<'a>: UpdateRequest<'a> => (),
        finish<'a>: FinishRequest => FinishResponse<'_>,
        abort<'a>: AbortRequest => (),
        verify<'a>: VerifyRequest<'a> => (),
        clone<'a>: CloneRequest => CloneResponse,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    round_trip_test! {
        setup_round_trip: {
            bytes: &[0x09, 0x00, 0x00, 0x02],
            value: SetupRequest { alg: 0x0200_0009 },
        },
        update_round_trip: {
            bytes: &[
                0x07, 0x00, 0x00, 0x00,
                0x00, 0x01, 0x00, 0x05, b'h', b'e', b'l', b'l', b'o',
            ],
            value: UpdateRequest { op_handle: 7, data: b"hello" },
        },
        finish_round_trip: {
            bytes: &[0x00, 0x01, 0x00, 0x02, 0xde, 0xad],
            value: FinishResponse { hash: &[0xde, 0xad] },
        },
        clone_round_trip: {
            bytes: &[0x01, 0x02, 0x03, 0x04],
            value: CloneResponse { target_op_handle: 0x0403_0201 },
        },
    }

    #[test]
    fn unknown_tags_are_skipped() {
        use crate::protocol::Codec as _;
        let bytes = [
            0x07, 0x00, 0x00, 0x00, //
            0x00, 0x09, 0x00, 0x01, 0xff, //
            0x00, 0x01, 0x00, 0x01, 0x42,
        ];
        let req: VerifyRequest = crate::protocol::PackedC.decode(&bytes).unwrap();
        assert_eq!(req.op_handle, 7);
        assert_eq!(req.hash, &[0x42]);
    }
}

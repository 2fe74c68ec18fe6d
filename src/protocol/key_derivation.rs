// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Multi-step key derivation messages.

use crate::protocol::keys::KeyAttributes;

wire_enum! {
    /// A key derivation opcode.
    pub enum Opcode: u16 {
        /// See [`SetupRequest`].
        Setup = 0x0500,
        /// See [`GetCapacityRequest`].
        GetCapacity = 0x0501,
        /// See [`SetCapacityRequest`].
        SetCapacity = 0x0502,
        /// See [`InputBytesRequest`].
        InputBytes = 0x0503,
        /// See [`InputKeyRequest`].
        InputKey = 0x0504,
        /// See [`OutputBytesRequest`].
        OutputBytes = 0x0505,
        /// See [`OutputKeyRequest`].
        OutputKey = 0x0506,
        /// See [`AbortRequest`].
        Abort = 0x0507,
    }
}

message! {
    /// Starts a key derivation.
    pub struct SetupRequest {
        /// The derivation algorithm.
        alg: u32,
    }
}

message! {
    /// The handle of a new derivation.
    pub struct SetupResponse {
        /// The operation handle.
        op_handle: u32,
    }
}

message! {
    /// Asks how many more bytes the derivation can produce.
    pub struct GetCapacityRequest {
        /// The operation handle.
        op_handle: u32,
    }
}

message! {
    /// Remaining output capacity.
    pub struct GetCapacityResponse {
        /// Bytes that may still be output.
        capacity: u32,
    }
}

message! {
    /// Lowers the derivation's capacity.
    pub struct SetCapacityRequest {
        /// The operation handle.
        op_handle: u32,
        /// The new capacity; may not exceed the current one.
        capacity: u32,
    }
}

message! {
    /// Supplies a derivation input as bytes.
    pub struct InputBytesRequest<'wire> {
        /// The operation handle.
        op_handle: u32,
        /// Which input this is, such as `SALT` or `INFO`.
        step: u32,
    } tlv {
        /// The input.
        1 => data,
    }
}

message! {
    /// Supplies a derivation input from a key.
    pub struct InputKeyRequest {
        /// The operation handle.
        op_handle: u32,
        /// Which input this is, typically `SECRET`.
        step: u32,
        /// The key whose material is the input.
        key_id: u32,
    }
}

message! {
    /// Reads derived bytes.
    pub struct OutputBytesRequest {
        /// The operation handle.
        op_handle: u32,
        /// How many bytes to output.
        output_len: u32,
    }
}

message! {
    /// Derived bytes.
    pub struct OutputBytesResponse<'wire> {
    } tlv {
        /// `output_len` bytes.
        1 => data,
    }
}

message! {
    /// Derives a key.
    pub struct OutputKeyRequest {
        /// The operation handle.
        op_handle: u32,
        /// Attributes of the new key; its size is taken from `key_bits`.
        attributes: KeyAttributes,
    }
}

message! {
    /// The id of a derived key.
    pub struct OutputKeyResponse {
        /// The new key's id.
        key_id: u32,
    }
}

message! {
    /// Abandons a derivation.
    pub struct AbortRequest {
        /// The operation handle.
        op_handle: u32,
    }
}

serializer! {
    /// Serializer table for the key derivation family.
    pub trait KeyDerivationSerializer {
        setup<'a>: SetupRequest => SetupResponse,
        get_capacity<'a>: GetCapacityRequest => GetCapacityResponse,
        set_capacity<'a>: SetCapacityRequest => (),
        input_bytes<'a>: InputBytesRequest<'a> => (),
        input_key<'a>: InputKeyRequest => (),
        output_bytes<'a>: OutputBytesRequest => OutputBytesResponse<'_>,
        output_key<'a>: OutputKeyRequest => OutputKeyResponse,
        abort<'a>: AbortRequest => (),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    round_trip_test! {
        input_bytes_round_trip: {
            bytes: &[
                0x01, 0x00, 0x00, 0x00,
                0x02, 0x02, 0x00, 0x00,
                0x00, 0x01, 0x00, 0x03, b's', b'a', b'l',
            ],
            value: InputBytesRequest { op_handle: 1, step: 0x0202, data: b"sal" },
        },
        output_key_round_trip: {
            bytes: &[
                0x09, 0x00, 0x00, 0x00,
                0x00, 0x24, 0x00, 0x00,
                0x00, 0x01, 0x00, 0x00,
                0x00, 0x00, 0x00, 0x00,
                0x00, 0x00, 0x00, 0x00,
                0x01, 0x00, 0x00, 0x00,
                0x00, 0x12, 0x50, 0x05,
            ],
            value: OutputKeyRequest {
                op_handle: 9,
                attributes: KeyAttributes {
                    key_type: 0x2400,
                    key_bits: 256,
                    lifetime: 0,
                    id: 0,
                    usage: 1,
                    alg: 0x0550_1200,
                },
            },
        },
    }
}

// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Multi-step symmetric cipher messages.

wire_enum! {
    /// A cipher opcode.
    pub enum Opcode: u16 {
        /// See [`SetupRequest`].
        EncryptSetup = 0x0300,
        /// See [`SetupRequest`].
        DecryptSetup = 0x0301,
        /// See [`GenerateIvRequest`].
        GenerateIv = 0x0302,
        /// See [`SetIvRequest`].
        SetIv = 0x0303,
        /// See [`UpdateRequest`].
        Update = 0x0304,
        /// See [`FinishRequest`].
        Finish = 0x0305,
        /// See [`AbortRequest`].
        Abort = 0x0306,
    }
}

message! {
    /// Starts an encryption or decryption operation.
    pub struct SetupRequest {
        /// The key to use.
        key_id: u32,
        /// The cipher algorithm.
        alg: u32,
    }
}

message! {
    /// The handle of a new cipher operation.
    pub struct SetupResponse {
        /// The operation handle.
        op_handle: u32,
    }
}

message! {
    /// Asks the service to pick a random IV.
    pub struct GenerateIvRequest {
        /// The operation handle.
        op_handle: u32,
    }
}

message! {
    /// A generated IV.
    pub struct GenerateIvResponse<'wire> {
    } tlv {
        /// The IV, now in use by the operation.
        1 => iv,
    }
}

message! {
    /// Supplies the operation's IV.
    pub struct SetIvRequest<'wire> {
        /// The operation handle.
        op_handle: u32,
    } tlv {
        /// The IV.
        1 => iv,
    }
}

message! {
    /// Feeds input into a cipher operation.
    pub struct UpdateRequest<'wire> {
        /// The operation handle.
        op_handle: u32,
    } tlv {
        /// Plaintext or ciphertext.
        1 => data,
    }
}

message! {
    /// Output produced by a cipher step.
    pub struct OutputResponse<'wire> {
    } tlv {
        /// The output, possibly empty.
        1 => data,
    }
}

message! {
    /// Completes a cipher operation.
    pub struct FinishRequest {
        /// The operation handle.
        op_handle: u32,
    }
}

message! {
    /// Abandons a cipher operation.
    pub struct AbortRequest {
        /// The operation handle.
        op_handle: u32,
    }
}

serializer! {
    /// Serializer table for the cipher family.
    pub trait CipherSerializer {
        setup<'a>: SetupRequest => SetupResponse,
        generate_iv<'a>: GenerateIvRequest => GenerateIvResponse<'_>,
        set_iv<'a>: SetIvRequest<'a> => (),
        update<'a>: UpdateRequest<'a> => OutputResponse<'_>,
        finish<'a>: FinishRequest => OutputResponse<'_>,
        abort<'a>: AbortRequest => (),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    round_trip_test! {
        setup_round_trip: {
            bytes: &[
                0x01, 0x00, 0x00, 0x00,
                0x00, 0x10, 0xc0, 0x04,
            ],
            value: SetupRequest { key_id: 1, alg: 0x04c0_1000 },
        },
        set_iv_round_trip: {
            bytes: &[
                0x03, 0x00, 0x00, 0x00,
                0x00, 0x01, 0x00, 0x04, 0xa0, 0xa1, 0xa2, 0xa3,
            ],
            value: SetIvRequest { op_handle: 3, iv: &[0xa0, 0xa1, 0xa2, 0xa3] },
        },
        empty_output_round_trip: {
            bytes: &[0x00, 0x01, 0x00, 0x00],
            value: OutputResponse { data: &[] },
        },
    }
}

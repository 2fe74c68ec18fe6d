// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Multi-step AEAD messages.

wire_enum! {
    /// An AEAD opcode.
    pub enum Opcode: u16 {
        /// See [`SetupRequest`].
        EncryptSetup = 0x0600,
        /// See [`SetupRequest`].
        DecryptSetup = 0x0601,
        /// See [`GenerateNonceRequest`].
        GenerateNonce = 0x0602,
        /// See [`SetNonceRequest`].
        SetNonce = 0x0603,
        /// See [`SetLengthsRequest`].
        SetLengths = 0x0604,
        /// See [`UpdateAdRequest`].
        UpdateAd = 0x0605,
        /// See [`UpdateRequest`].
        Update = 0x0606,
        /// See [`FinishRequest`].
        Finish = 0x0607,
        /// See [`VerifyRequest`].
        Verify = 0x0608,
        /// See [`AbortRequest`].
        Abort = 0x0609,
    }
}

message! {
    /// Starts an AEAD encryption or decryption.
    pub struct SetupRequest {
        /// The key to use.
        key_id: u32,
        /// The AEAD algorithm.
        alg: u32,
    }
}

message! {
    /// The handle of a new AEAD operation.
    pub struct SetupResponse {
        /// The operation handle.
        op_handle: u32,
    }
}

message! {
    /// Asks the service to pick a random nonce.
    pub struct GenerateNonceRequest {
        /// The operation handle.
        op_handle: u32,
    }
}

message! {
    /// A generated nonce.
    pub struct GenerateNonceResponse<'wire> {
    } tlv {
        /// The nonce, now in use by the operation.
        1 => nonce,
    }
}

message! {
    /// Supplies the operation's nonce.
    pub struct SetNonceRequest<'wire> {
        /// The operation handle.
        op_handle: u32,
    } tlv {
        /// The nonce.
        1 => nonce,
    }
}

message! {
    /// Declares the total associated data and plaintext lengths up front.
    pub struct SetLengthsRequest {
        /// The operation handle.
        op_handle: u32,
        /// Total length of associated data.
        ad_length: u32,
        /// Total length of plaintext.
        plaintext_length: u32,
    }
}

message! {
    /// Feeds associated data.
    pub struct UpdateAdRequest<'wire> {
        /// The operation handle.
        op_handle: u32,
    } tlv {
        /// Associated data.
        1 => data,
    }
}

message! {
    /// Feeds plaintext or ciphertext.
    pub struct UpdateRequest<'wire> {
        /// The operation handle.
        op_handle: u32,
    } tlv {
        /// The input.
        1 => data,
    }
}

message! {
    /// Output produced by an update step.
    pub struct UpdateResponse<'wire> {
    } tlv {
        /// The output, possibly empty.
        1 => data,
    }
}

message! {
    /// Completes an encryption.
    pub struct FinishRequest {
        /// The operation handle.
        op_handle: u32,
    }
}

message! {
    /// The last of the ciphertext, and the tag.
    pub struct FinishResponse<'wire> {
    } tlv {
        /// Remaining ciphertext.
        1 => ciphertext,
        /// The authentication tag.
        2 => tag,
    }
}

message! {
    /// Completes a decryption by checking the tag.
    pub struct VerifyRequest<'wire> {
        /// The operation handle.
        op_handle: u32,
    } tlv {
        /// The expected tag.
        1 => tag,
    }
}

message! {
    /// The last of the plaintext.
    pub struct VerifyResponse<'wire> {
    } tlv {
        /// Remaining plaintext.
        1 => plaintext,
    }
}

message! {
    /// Abandons an AEAD operation.
    pub struct AbortRequest {
        /// The operation handle.
        op_handle: u32,
    }
}

serializer! {
    /// Serializer table for the AEAD family.
    pub trait AeadSerializer {
        setup<'a>: SetupRequest => SetupResponse,
        generate_nonce<'a>: GenerateNonceRequest => GenerateNonceResponse<'_>,
        set_nonce<'a>: SetNonceRequest<'a> => (),
        set_lengths<'a>: SetLengthsRequest => (),
        update_ad<'a>: UpdateAdRequest<'a> => (),
        update<'a>: UpdateRequest<'a> => UpdateResponse<'_>,
        finish<'a>: FinishRequest => FinishResponse<'_>,
        verify<'a>: VerifyRequest<'a> => VerifyResponse<'_>,
        abort<'a>: AbortRequest => (),
    }
}

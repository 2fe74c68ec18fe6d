// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Core key-management messages.
//!
//! These operations are served by the core crypto provider itself, rather
//! than by an extension; every other family refers to keys by the ids these
//! operations hand out.

use serde::Deserialize;
use serde::Serialize;
use zerocopy::byteorder::U32;
use zerocopy::byteorder::LE;
use zerocopy::AsBytes;
use zerocopy::FromBytes;
use zerocopy::Unaligned;

use crate::protocol::wire::Packed;

wire_enum! {
    /// A core key-management opcode.
    pub enum Opcode: u16 {
        /// See [`GenerateKeyRequest`].
        GenerateKey = 0x0101,
        /// See [`DestroyKeyRequest`].
        DestroyKey = 0x0102,
        /// See [`ExportKeyRequest`].
        ExportKey = 0x0103,
        /// See [`ImportKeyRequest`].
        ImportKey = 0x0104,
        /// See [`GenerateRandomRequest`].
        GenerateRandom = 0x0105,
        /// See [`CopyKeyRequest`].
        CopyKey = 0x0106,
        /// See [`PurgeKeyRequest`].
        PurgeKey = 0x0107,
        /// See [`GetKeyAttributesRequest`].
        GetKeyAttributes = 0x0108,
    }
}

/// Key attributes, as they appear on the wire.
///
/// Packed layout is `type, key_bits, lifetime, id, usage, alg`, every field
/// a little-endian `u32`; the last two form the key's policy.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct KeyAttributes {
    /// The key type, such as `AES` or `HMAC`.
    pub key_type: u32,
    /// The key size, in bits. Zero means "whatever the material implies".
    pub key_bits: u32,
    /// Whether the key is volatile or persistent.
    pub lifetime: u32,
    /// The requested key id, for persistent keys.
    pub id: u32,
    /// Permitted usage flags.
    pub usage: u32,
    /// The one algorithm this key may be used with.
    pub alg: u32,
}

#[derive(Copy, Clone, FromBytes, AsBytes, Unaligned)]
#[repr(C)]
#[doc(hidden)]
pub struct RawKeyAttributes {
    key_type: U32<LE>,
    key_bits: U32<LE>,
    lifetime: U32<LE>,
    id: U32<LE>,
    usage: U32<LE>,
    alg: U32<LE>,
}

impl Packed for KeyAttributes {
    type Raw = RawKeyAttributes;

    fn pack(self) -> Self::Raw {
        RawKeyAttributes {
            key_type: U32::new(self.key_type),
            key_bits: U32::new(self.key_bits),
            lifetime: U32::new(self.lifetime),
            id: U32::new(self.id),
            usage: U32::new(self.usage),
            alg: U32::new(self.alg),
        }
    }

    fn unpack(raw: Self::Raw) -> Self {
        Self {
            key_type: raw.key_type.get(),
            key_bits: raw.key_bits.get(),
            lifetime: raw.lifetime.get(),
            id: raw.id.get(),
            usage: raw.usage.get(),
            alg: raw.alg.get(),
        }
    }
}

message! {
    /// Generates a fresh random key with the given attributes.
    pub struct GenerateKeyRequest {
        /// Attributes of the new key.
        attributes: KeyAttributes,
    }
}

message! {
    /// The id of a newly created key.
    pub struct KeyIdResponse {
        /// The new key's id.
        id: u32,
    }
}

message! {
    /// Destroys a key.
    pub struct DestroyKeyRequest {
        /// The key to destroy.
        id: u32,
    }
}

message! {
    /// Exports a key's material.
    pub struct ExportKeyRequest {
        /// The key to export.
        id: u32,
    }
}

message! {
    /// Exported key material.
    pub struct ExportKeyResponse<'wire> {
    } tlv {
        /// The key material.
        1 => data,
    }
}

message! {
    /// Imports key material with the given attributes.
    pub struct ImportKeyRequest<'wire> {
        /// Attributes of the new key.
        attributes: KeyAttributes,
    } tlv {
        /// The key material.
        1 => data,
    }
}

message! {
    /// Asks for random bytes.
    pub struct GenerateRandomRequest {
        /// The number of bytes wanted.
        size: u32,
    }
}

message! {
    /// Random bytes.
    pub struct GenerateRandomResponse<'wire> {
    } tlv {
        /// `size` random bytes.
        1 => random_bytes,
    }
}

message! {
    /// Copies a key, possibly narrowing its policy.
    pub struct CopyKeyRequest {
        /// Attributes of the copy.
        attributes: KeyAttributes,
        /// The key to copy.
        source_key_id: u32,
    }
}

message! {
    /// Removes a persistent key's cached copy.
    pub struct PurgeKeyRequest {
        /// The key to purge.
        id: u32,
    }
}

message! {
    /// Asks for a key's attributes.
    pub struct GetKeyAttributesRequest {
        /// The key to describe.
        id: u32,
    }
}

message! {
    /// A key's attributes.
    pub struct GetKeyAttributesResponse {
        /// The attributes.
        attributes: KeyAttributes,
    }
}

serializer! {
    /// Serializer table for core key management.
    pub trait KeySerializer {
        generate_key<'a>: GenerateKeyRequest => KeyIdResponse,
        destroy_key<'a>: DestroyKeyRequest => (),
        export_key<'a>: ExportKeyRequest => ExportKeyResponse<'_>,
        import_key<'a>: ImportKeyRequest<'a> => KeyIdResponse,
        generate_random<'a>: GenerateRandomRequest => GenerateRandomResponse<'_>,
        copy_key<'a>: CopyKeyRequest => KeyIdResponse,
        purge_key<'a>: PurgeKeyRequest => (),
        get_key_attributes<'a>: GetKeyAttributesRequest => GetKeyAttributesResponse,
    }
}

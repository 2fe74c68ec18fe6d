// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Crypto service protocol messages.
//!
//! Every operation exposed by the crypto service is identified by an opcode
//! and carries a typed request and a typed response. Each operation family
//! (core key management, hash, cipher, MAC, AEAD, key derivation) lives in its
//! own module, which provides:
//! - An `Opcode` enum, listing the family's operations.
//! - A request and response struct per operation.
//! - A *serializer table*, an object-safe trait with a decode/encode pair per
//!   operation, generated by `serializer!`.
//!
//! Messages can be carried in one of two [`Encoding`]s, each implemented as a
//! [`Codec`]:
//! - [`PackedC`], where a message is a fixed-size little-endian header
//!   followed by [TLV](crate::tlv) records for variable-length fields. This is
//!   implemented by the [`wire`] traits.
//! - [`Schema`], where a message is encoded according to its `serde` schema,
//!   using `postcard`.
//!
//! The encoding is picked when a session is opened, not per call.

use serde::Deserialize;
use serde::Serialize;

use crate::io::Cursor;
use crate::protocol::wire::FromWire;
use crate::protocol::wire::ToWire;

#[macro_use]
mod macros;

#[macro_use]
pub mod wire;

pub mod aead;
pub mod cipher;
pub mod hash;
pub mod key_derivation;
pub mod keys;
pub mod mac;

wire_enum! {
    /// A wire dialect.
    #[derive(Serialize, Deserialize)]
    pub enum Encoding: u16 {
        /// The packed, fixed-layout dialect; see [`PackedC`].
        PackedC = 0,
        /// The schema-based dialect; see [`Schema`].
        Schema = 1,
    }
}

impl Encoding {
    /// The number of supported encodings.
    pub const COUNT: usize = 2;

    /// All supported encodings, in wire-value order.
    pub const ALL: [Encoding; Self::COUNT] = [Self::PackedC, Self::Schema];

    /// Returns a dense index for `self`, for use in per-encoding tables.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl Default for Encoding {
    fn default() -> Self {
        Self::PackedC
    }
}

/// A type that can be carried in either dialect.
pub trait Message<'wire>:
    FromWire<'wire> + ToWire + Serialize + Deserialize<'wire>
{
}

impl<'wire, M> Message<'wire> for M where
    M: FromWire<'wire> + ToWire + Serialize + Deserialize<'wire>
{
}

/// A wire dialect implementation.
///
/// A `Codec` is stateless; every family's serializer table is implemented
/// for every `Codec`.
pub trait Codec {
    /// Returns the dialect this codec reads and writes.
    fn encoding(&self) -> Encoding;

    /// Decodes a message out of `bytes`.
    fn decode<'wire, M: Message<'wire>>(
        &self,
        bytes: &'wire [u8],
    ) -> crate::Result<M, wire::Error>;

    /// Encodes `msg` into `out`.
    ///
    /// On failure, `out` may have been partially consumed; the caller must
    /// discard it.
    fn encode<M: ToWire + Serialize>(
        &self,
        msg: &M,
        out: &mut Cursor,
    ) -> crate::Result<(), wire::Error>;
}

/// The packed dialect: a fixed header followed by TLV records.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PackedC;

impl Codec for PackedC {
    fn encoding(&self) -> Encoding {
        Encoding::PackedC
    }

    fn decode<'wire, M: Message<'wire>>(
        &self,
        mut bytes: &'wire [u8],
    ) -> crate::Result<M, wire::Error> {
        M::from_wire(&mut bytes)
    }

    fn encode<M: ToWire + Serialize>(
        &self,
        msg: &M,
        out: &mut Cursor,
    ) -> crate::Result<(), wire::Error> {
        msg.to_wire(out)
    }
}

/// The schema dialect: `postcard` over each message's `serde` schema.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema;

impl Codec for Schema {
    fn encoding(&self) -> Encoding {
        Encoding::Schema
    }

    fn decode<'wire, M: Message<'wire>>(
        &self,
        bytes: &'wire [u8],
    ) -> crate::Result<M, wire::Error> {
        postcard::from_bytes(bytes).map_err(|e| {
            fail!(wire::Error::Malformed, "schema decode failed: {:?}", e)
        })
    }

    fn encode<M: ToWire + Serialize>(
        &self,
        msg: &M,
        out: &mut Cursor,
    ) -> crate::Result<(), wire::Error> {
        let len = match postcard::to_slice(msg, out.remaining_mut()) {
            Ok(used) => used.len(),
            Err(postcard::Error::SerializeBufferFull) => {
                return Err(fail!(wire::Error::Io(
                    crate::io::Error::BufferExhausted
                )))
            }
            Err(e) => {
                return Err(fail!(
                    wire::Error::Malformed,
                    "schema encode failed: {:?}",
                    e
                ))
            }
        };
        out.consume(len)?;
        Ok(())
    }
}

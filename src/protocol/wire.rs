// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Packed wire format traits.
//!
//! This module provides [`FromWire`] and [`ToWire`], a pair of traits similar
//! to the core traits in the [`serde`] library. Rather than representing a
//! generically serializeable type, they represent types that can be converted
//! to and from the packed dialect: a fixed little-endian header followed by
//! [TLV](crate::tlv) records.

use core::fmt;

use zerocopy::byteorder::I16;
use zerocopy::byteorder::LE;
use zerocopy::byteorder::U16;
use zerocopy::byteorder::U32;

use crate::io;
use crate::io::endian::LeInt;
use crate::io::Cursor;
use crate::io::ReadZero;
use crate::io::Write as _;
use crate::tlv;

/// A type which can be deserialized from the packed wire format.
///
/// The lifetime `'wire` indicates that the type can be deserialized from a
/// buffer of lifetime `'wire`.
pub trait FromWire<'wire>: Sized {
    /// Deserializes a `Self` out of `r`.
    fn from_wire<R: ReadZero<'wire> + ?Sized>(
        r: &mut R,
    ) -> crate::Result<Self, Error>;
}

/// A type which can be serialized into the packed wire format.
pub trait ToWire: Sized {
    /// Serializes `self` into `w`.
    ///
    /// On error, `w` may have been partially consumed; callers only commit
    /// the consumed bytes on success.
    fn to_wire(&self, w: &mut Cursor) -> crate::Result<(), Error>;
}

/// A marshalling error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// Indicates that something went wrong in an `io` operation.
    Io(io::Error),

    /// Indicates that a TLV record could not be encoded or decoded.
    Tlv(tlv::Error),

    /// Indicates that some field within the message was outside of its
    /// valid range.
    OutOfRange,

    /// Indicates that a schema-encoded message did not match its schema.
    Malformed,
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<tlv::Error> for Error {
    fn from(e: tlv::Error) -> Self {
        Self::Tlv(e)
    }
}

impl From<io::Error> for crate::Error<Error> {
    fn from(e: io::Error) -> Self {
        fail!(Error::Io(e))
    }
}

debug_from!(Error => tlv::Error);

/// Reads a fixed-layout header by raw copy.
///
/// `H` must be a `zerocopy` type without alignment requirements; the read
/// fails if fewer than `size_of::<H>()` bytes remain.
pub fn read_header<'wire, H, R>(r: &mut R) -> crate::Result<H, Error>
where
    H: zerocopy::FromBytes + zerocopy::Unaligned + Copy,
    R: ReadZero<'wire> + ?Sized,
{
    let bytes = r.read_slice(core::mem::size_of::<H>())?;
    let header =
        zerocopy::LayoutVerified::<_, H>::new_unaligned(bytes)
            .ok_or_else(|| fail!(Error::Io(io::Error::BufferExhausted)))?;
    Ok(*header)
}

/// Writes a fixed-layout header by raw copy.
pub fn write_header<H>(header: &H, w: &mut Cursor) -> crate::Result<(), Error>
where
    H: zerocopy::AsBytes,
{
    w.write_bytes(header.as_bytes())?;
    Ok(())
}

/// Returns the value of the first TLV record tagged `tag` in `region`, or the
/// empty slice if there is none.
pub fn tlv_or_empty(region: &[u8], tag: u16) -> crate::Result<&[u8], Error> {
    Ok(tlv::find_decode(region, tag)?
        .map(|rec| rec.value)
        .unwrap_or(&[]))
}

/// A value that is laid out in a fixed-size header by raw copy.
///
/// `Raw` is the unaligned, little-endian image of `Self`.
pub trait Packed: Copy {
    /// The on-the-wire image of `Self`.
    type Raw: zerocopy::FromBytes + zerocopy::AsBytes + zerocopy::Unaligned + Copy;

    /// Converts `self` into its wire image.
    fn pack(self) -> Self::Raw;

    /// Converts a wire image back into a `Self`.
    fn unpack(raw: Self::Raw) -> Self;
}

impl Packed for u16 {
    type Raw = U16<LE>;
    fn pack(self) -> Self::Raw {
        U16::new(self)
    }
    fn unpack(raw: Self::Raw) -> Self {
        raw.get()
    }
}

impl Packed for u32 {
    type Raw = U32<LE>;
    fn pack(self) -> Self::Raw {
        U32::new(self)
    }
    fn unpack(raw: Self::Raw) -> Self {
        raw.get()
    }
}

impl Packed for i16 {
    type Raw = I16<LE>;
    fn pack(self) -> Self::Raw {
        I16::new(self)
    }
    fn unpack(raw: Self::Raw) -> Self {
        raw.get()
    }
}

impl<'wire> FromWire<'wire> for () {
    fn from_wire<R: ReadZero<'wire> + ?Sized>(
        _: &mut R,
    ) -> crate::Result<Self, Error> {
        Ok(())
    }
}

impl ToWire for () {
    fn to_wire(&self, _: &mut Cursor) -> crate::Result<(), Error> {
        Ok(())
    }
}

/// Represents a C-like enum that can be converted to and from a wire
/// representation as well as to and from a string representation.
///
/// An implementation of this trait can be thought of as an unsigned
/// integer with a limited range: every enum variant can be converted
/// to the wire format and back, though not every value of the wire
/// representation can be converted into an enum variant.
///
/// In particular the following identity must hold for all types T:
/// ```
/// # use trustsvc::protocol::wire::WireEnum;
/// # fn test<T: WireEnum + Copy + PartialEq + std::fmt::Debug>(x: T) {
/// assert_eq!(T::from_wire_value(T::to_wire_value(x)), Some(x));
/// # }
/// ```
pub trait WireEnum: Sized + Copy {
    /// The unrelying "wire type". This is almost always some kind of
    /// unsigned integer.
    type Wire;

    /// Converts `self` into its underlying wire representation.
    fn to_wire_value(self) -> Self::Wire;

    /// Attempts to parse a value of `Self` from the underlying wire
    /// representation.
    fn from_wire_value(wire: Self::Wire) -> Option<Self>;

    /// Converts `self` into a string representation.
    fn name(self) -> &'static str;

    /// Attempts to convert a value of `Self` from a string representation.
    fn from_name(str: &str) -> Option<Self>;
}

impl<'wire, E> FromWire<'wire> for E
where
    E: WireEnum,
    E::Wire: LeInt,
{
    fn from_wire<R: ReadZero<'wire> + ?Sized>(
        r: &mut R,
    ) -> crate::Result<Self, Error> {
        let wire = <Self as WireEnum>::Wire::read_from(r)?;
        Self::from_wire_value(wire).ok_or_else(|| fail!(Error::OutOfRange))
    }
}

impl<E> ToWire for E
where
    E: WireEnum,
    E::Wire: LeInt,
{
    fn to_wire(&self, w: &mut Cursor) -> crate::Result<(), Error> {
        self.to_wire_value().write_to(w)?;
        Ok(())
    }
}

/// A deserialization-from-string error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct WireEnumFromStrError;

impl fmt::Display for WireEnumFromStrError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown variant")
    }
}

/// A conveinence macro for generating `WireEnum`-implementing enums.
///
/// Syntax is as follows:
/// ```text
/// wire_enum! {
///     /// This is my enum.
///     pub enum MyEnum : u8 {
///         /// Variant `A`.
///         A = 0x00,
///         /// Variant `B`.
///         B = 0x01,
///     }
/// }
/// ```
/// This macro will generate an implementation of `WireEnum<Wire=u8>` for
/// the above enum.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $vis:vis enum $name:ident : $wire:ident {
        $($(#[$meta_variant:meta])* $variant:ident = $value:tt,)*
    }) => {
        $(#[$meta])*
        #[repr($wire)]
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        $vis enum $name {
           $(
               $(#[$meta_variant])*
               $variant = $value,
           )*
        }

        impl $crate::protocol::wire::WireEnum for $name {
            type Wire = $wire;
            fn to_wire_value(self) -> Self::Wire {
                self as $wire
            }

            fn from_wire_value(wire: Self::Wire) -> Option<Self> {
                match wire {
                    $(
                        $value => Some(Self::$variant),
                    )*
                    _ => None,
                }
            }

            fn name(self) -> &'static str {
                match self {
                    $(
                        Self::$variant => stringify!($variant),
                    )*
                }
            }

            fn from_name(name: &str) -> Option<Self> {
                match name {
                    $(
                        stringify!($variant) => Some(Self::$variant),
                    )*
                    _ => None,
                }
            }
        }

        impl $name {
            /// Every wire value of this enum, in declaration order.
            #[allow(dead_code)]
            pub const WIRE_VALUES: &'static [$wire] = &[$($value,)*];
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                use $crate::protocol::wire::WireEnum;

                write!(f, "{}", self.name())
            }
        }

        impl core::str::FromStr for $name {
            type Err = $crate::protocol::wire::WireEnumFromStrError;

            fn from_str(
                s: &str
            ) -> core::result::Result<
                Self,
                $crate::protocol::wire::WireEnumFromStrError
            > {
                use $crate::protocol::wire::WireEnum;

                match $name::from_name(s) {
                    Some(val) => Ok(val),
                    None => Err($crate::protocol::wire::WireEnumFromStrError),
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    wire_enum! {
        /// An enum for testing.
        pub enum DemoEnum: u16 {
            /// Unknown value
            Unknown = 0x0000,

            /// First enum value
            First = 0x0101,
        }
    }

    #[test]
    fn names() {
        assert_eq!(DemoEnum::from_name("First"), Some(DemoEnum::First));
        assert_eq!(DemoEnum::from_name("does not exist"), None);
        assert_eq!(DemoEnum::Unknown.name(), "Unknown");
        assert_eq!("First".parse::<DemoEnum>(), Ok(DemoEnum::First));
        assert_eq!(DemoEnum::WIRE_VALUES, &[0x0000, 0x0101]);
    }

    #[test]
    fn enum_on_the_wire() {
        let mut buf = [0; 2];
        let mut cursor = Cursor::new(&mut buf);
        DemoEnum::First.to_wire(&mut cursor).unwrap();
        assert_eq!(buf, [0x01, 0x01]);

        let mut r = &[0x02, 0x00][..];
        let e = DemoEnum::from_wire(&mut r).unwrap_err();
        assert_eq!(e.into_inner(), Error::OutOfRange);
    }

    #[test]
    fn missing_tlv_is_empty() {
        let buf = [0, 1, 0, 2, 0xaa, 0xbb];
        assert_eq!(tlv_or_empty(&buf, 1).unwrap(), &[0xaa, 0xbb]);
        assert_eq!(tlv_or_empty(&buf, 2).unwrap(), &[] as &[u8]);
        assert!(tlv_or_empty(&buf[..5], 2).is_err());
    }

    #[test]
    fn header_too_short() {
        let mut r = &[1, 2, 3][..];
        let e = read_header::<<u32 as Packed>::Raw, _>(&mut r).unwrap_err();
        assert_eq!(e.into_inner(), Error::Io(io::Error::BufferExhausted));

        let mut r = &[1, 0, 0, 0, 9][..];
        let raw = read_header::<<u32 as Packed>::Raw, _>(&mut r).unwrap();
        assert_eq!(u32::unpack(raw), 1);
        assert_eq!(r, &[9]);
    }
}

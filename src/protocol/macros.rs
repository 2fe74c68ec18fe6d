// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Macros for generating protocol messages and serializer tables.

/// Generates a protocol message: a struct with a fixed-size header and,
/// optionally, some TLV-encoded byte fields after it.
///
/// The generated struct implements [`FromWire`], [`ToWire`] and the `serde`
/// traits, so it can be carried by either dialect.
///
/// Syntax:
/// ```text
/// message! {
///     /// A message with only a header.
///     pub struct Setup {
///         /// Some header field.
///         alg: u32,
///     }
/// }
///
/// message! {
///     /// A message with a header and TLV fields.
///     pub struct Update<'wire> {
///         op_handle: u32,
///     } tlv {
///         /// Tag `1`; absent means empty.
///         1 => data,
///     }
/// }
/// ```
/// Header fields may be of any [`Packed`] type; TLV fields are always
/// `&'wire [u8]`. Header fields are laid out in declaration order, without
/// padding.
///
/// [`FromWire`]: crate::protocol::wire::FromWire
/// [`ToWire`]: crate::protocol::wire::ToWire
/// [`Packed`]: crate::protocol::wire::Packed
macro_rules! message {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($(#[$hmeta:meta])* $hfield:ident: $hty:ty,)*
        }
    ) => {paste::paste! {
        $(#[$meta])*
        #[derive(
            Copy, Clone, Debug, PartialEq, Eq,
            serde::Serialize, serde::Deserialize,
        )]
        $vis struct $name {
            $($(#[$hmeta])* pub $hfield: $hty,)*
        }

        message!(@header [<$name Header>] { $($hfield: $hty,)* });

        impl<'wire> $crate::protocol::wire::FromWire<'wire> for $name {
            fn from_wire<R: $crate::io::ReadZero<'wire> + ?Sized>(
                r: &mut R,
            ) -> $crate::Result<Self, $crate::protocol::wire::Error> {
                #[allow(unused_imports)]
                use $crate::protocol::wire::Packed as _;

                let [<$name Header>] { $($hfield,)* } =
                    $crate::protocol::wire::read_header(r)?;
                Ok(Self { $($hfield: <$hty>::unpack($hfield),)* })
            }
        }

        impl $crate::protocol::wire::ToWire for $name {
            fn to_wire(
                &self,
                w: &mut $crate::io::Cursor,
            ) -> $crate::Result<(), $crate::protocol::wire::Error> {
                #[allow(unused_imports)]
                use $crate::protocol::wire::Packed as _;

                let header = [<$name Header>] {
                    $($hfield: self.$hfield.pack(),)*
                };
                $crate::protocol::wire::write_header(&header, w)
            }
        }
    }};

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident<$lt:lifetime> {
            $($(#[$hmeta:meta])* $hfield:ident: $hty:ty,)*
        } tlv {
            $($(#[$tmeta:meta])* $tag:literal => $tfield:ident,)+
        }
    ) => {paste::paste! {
        $(#[$meta])*
        #[derive(
            Copy, Clone, Debug, PartialEq, Eq,
            serde::Serialize, serde::Deserialize,
        )]
        $vis struct $name<$lt> {
            $($(#[$hmeta])* pub $hfield: $hty,)*
            $($(#[$tmeta])* pub $tfield: &$lt [u8],)+
        }

        message!(@header [<$name Header>] { $($hfield: $hty,)* });

        impl<$lt> $crate::protocol::wire::FromWire<$lt> for $name<$lt> {
            fn from_wire<R: $crate::io::ReadZero<$lt> + ?Sized>(
                r: &mut R,
            ) -> $crate::Result<Self, $crate::protocol::wire::Error> {
                #[allow(unused_imports)]
                use $crate::protocol::wire::Packed as _;

                let [<$name Header>] { $($hfield,)* } =
                    $crate::protocol::wire::read_header(r)?;
                let rest = r.read_rest();
                Ok(Self {
                    $($hfield: <$hty>::unpack($hfield),)*
                    $($tfield: $crate::protocol::wire::tlv_or_empty(rest, $tag)?,)+
                })
            }
        }

        impl $crate::protocol::wire::ToWire for $name<'_> {
            fn to_wire(
                &self,
                w: &mut $crate::io::Cursor,
            ) -> $crate::Result<(), $crate::protocol::wire::Error> {
                #[allow(unused_imports)]
                use $crate::protocol::wire::Packed as _;

                let header = [<$name Header>] {
                    $($hfield: self.$hfield.pack(),)*
                };
                $crate::protocol::wire::write_header(&header, w)?;

                let mut records = $crate::tlv::Writer::new(w);
                $(records.encode($crate::tlv::Record::new($tag, self.$tfield))?;)+
                Ok(())
            }
        }
    }};

    (@header $header:ident { $($hfield:ident: $hty:ty,)* }) => {
        #[derive(
            Copy, Clone,
            zerocopy::FromBytes, zerocopy::AsBytes, zerocopy::Unaligned,
        )]
        #[repr(C)]
        struct $header {
            $($hfield: <$hty as $crate::protocol::wire::Packed>::Raw,)*
        }
    };
}

/// Generates a serializer table for one operation family.
///
/// For each operation `op`, the table has a `decode_op_request()` and an
/// `encode_op_response()` function. The generated trait is object-safe, and
/// is implemented for every [`Codec`]; a provider holds one table per
/// [`Encoding`] it supports.
///
/// Decode failures become [`rpc::Error::InvalidRequestBody`]; encode failures
/// become [`rpc::Error::Internal`].
///
/// Syntax:
/// ```text
/// serializer! {
///     /// Docs for the table.
///     pub trait HashSerializer {
///         setup<'a>: SetupRequest => SetupResponse,
///         update<'a>: UpdateRequest<'a> => (),
///     }
/// }
/// ```
///
/// [`Codec`]: crate::protocol::Codec
/// [`Encoding`]: crate::protocol::Encoding
/// [`rpc::Error::InvalidRequestBody`]: crate::rpc::Error::InvalidRequestBody
/// [`rpc::Error::Internal`]: crate::rpc::Error::Internal
macro_rules! serializer {
    (
        $(#[$meta:meta])*
        $vis:vis trait $name:ident {
            $($op:ident<$lt:lifetime>: $req:ty => $resp:ty,)*
        }
    ) => {paste::paste! {
        $(#[$meta])*
        $vis trait $name {
            $(
                #[doc = "Decodes the request of `" $op "`."]
                fn [<decode_ $op _request>]<$lt>(
                    &self,
                    request: &$lt [u8],
                ) -> $crate::Result<$req, $crate::rpc::Error>;

                #[doc = "Encodes the response of `" $op "`."]
                fn [<encode_ $op _response>](
                    &self,
                    response: &$resp,
                    out: &mut $crate::io::Cursor,
                ) -> $crate::Result<(), $crate::rpc::Error>;
            )*
        }

        impl<C: $crate::protocol::Codec> $name for C {
            $(
                fn [<decode_ $op _request>]<$lt>(
                    &self,
                    request: &$lt [u8],
                ) -> $crate::Result<$req, $crate::rpc::Error> {
                    $crate::protocol::Codec::decode(self, request).map_err(|e| {
                        fail!(
                            $crate::rpc::Error::InvalidRequestBody,
                            "could not decode `{}` request: {:?}",
                            stringify!($op),
                            e,
                        )
                    })
                }

                fn [<encode_ $op _response>](
                    &self,
                    response: &$resp,
                    out: &mut $crate::io::Cursor,
                ) -> $crate::Result<(), $crate::rpc::Error> {
                    $crate::protocol::Codec::encode(self, response, out).map_err(|e| {
                        fail!(
                            $crate::rpc::Error::Internal,
                            "could not encode `{}` response: {:?}",
                            stringify!($op),
                            e,
                        )
                    })
                }
            )*
        }
    }};
}

/// Covenience macro for generating a "round trip unit test".
///
/// This macro generates a unit test for a protocol struct that ensures that a
/// given byte slice can be converted back and forth with a given value of a
/// protocol struct, exactly, in the packed dialect. The value is then also
/// passed through the schema dialect.
///
/// Syntax:
/// ```text
/// round_trip_test! {
///     test_name: {
///         bytes: <contant expression of type &[u8]>,
///         value: <struct initializer for the corresponding protocol value>,
///     },
///     // more cases ...
/// }
/// ```
#[cfg(test)]
macro_rules! round_trip_test {
    ($($name:ident: {
        bytes: $bytes:expr,
        value: $ty:ident $({ $($field:ident: $field_val:expr),* $(,)? })?,
    },)+) => {$(
        #[test]
        fn $name() {
            use $crate::io::*;
            use $crate::protocol::Codec as _;
            const BUF_LEN: usize = 1 << 10;

            let bytes: &[u8] = $bytes;
            let value = $ty $({ $($field: $field_val,)* })?;

            let deserialized: $ty = $crate::protocol::PackedC.decode(bytes)
                .expect("deserialization failed");
            assert_eq!(deserialized, value);

            let mut buf = vec![0u8; BUF_LEN];
            let mut cursor = Cursor::new(&mut buf);
            $crate::protocol::PackedC.encode(&value, &mut cursor)
                .expect("serialization failed");
            assert_eq!(cursor.consumed_bytes(), bytes);

            let mut buf = vec![0u8; BUF_LEN];
            let mut cursor = Cursor::new(&mut buf);
            $crate::protocol::Schema.encode(&value, &mut cursor)
                .expect("schema serialization failed");
            let len = cursor.consumed_len();
            let deserialized: $ty = $crate::protocol::Schema.decode(&buf[..len])
                .expect("schema deserialization failed");
            assert_eq!(deserialized, value);
        }
    )+}
}

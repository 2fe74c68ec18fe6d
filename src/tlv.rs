// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Tag/length/value records.
//!
//! Variable-length parameters in the packed wire dialect follow a message's
//! fixed header as a sequence of TLV records:
//! ```text
//! +---------+---------+-----------------+
//! | tag u16 | len u16 | value [u8; len] |  ...
//! +---------+---------+-----------------+
//! ```
//! Both integers are big-endian. Tags are scoped to one operation's request
//! or response and are written in ascending order; a decoder that does not
//! find an optional tag substitutes a default rather than failing.

use byteorder::ByteOrder as _;
use byteorder::BE;

use crate::io::Cursor;

/// The size of a record header, in bytes.
pub const HEADER_LEN: usize = 4;

/// Returns the number of bytes needed to encode a record whose value is
/// `len` bytes long.
#[inline]
pub const fn required_space(len: usize) -> usize {
    HEADER_LEN + len
}

/// A TLV error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The record does not fit in the remaining buffer.
    InsufficientSpace,
    /// The record's tag is lower than the previously encoded tag.
    OutOfOrder,
    /// The record's value is longer than a `u16` length can describe.
    TooLong,
    /// A record header advertises more bytes than remain in the buffer.
    Corrupt,
}

/// A single TLV record.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Record<'a> {
    /// The record's tag.
    pub tag: u16,
    /// The record's value; its length is implied.
    pub value: &'a [u8],
}

impl<'a> Record<'a> {
    /// Creates a new record.
    pub fn new(tag: u16, value: &'a [u8]) -> Self {
        Self { tag, value }
    }

    /// Returns the number of bytes this record occupies when encoded.
    pub fn encoded_len(&self) -> usize {
        required_space(self.value.len())
    }
}

/// An encoding position within a buffer.
///
/// Each successful call to [`Writer::encode()`] appends one record to the
/// underlying [`Cursor`]; a failed call leaves the cursor untouched.
pub struct Writer<'c, 'a> {
    cursor: &'c mut Cursor<'a>,
    prev_tag: u16,
}

impl<'c, 'a> Writer<'c, 'a> {
    /// Starts encoding records at the cursor's current position.
    pub fn new(cursor: &'c mut Cursor<'a>) -> Self {
        Self {
            cursor,
            prev_tag: 0,
        }
    }

    /// Encodes `record`, advancing the cursor past it.
    pub fn encode(&mut self, record: Record) -> crate::Result<(), Error> {
        check!(record.tag >= self.prev_tag, Error::OutOfOrder);
        check!(record.value.len() <= u16::MAX as usize, Error::TooLong);
        check!(
            self.cursor.remaining_capacity() >= record.encoded_len(),
            Error::InsufficientSpace
        );

        let out = self
            .cursor
            .consume(record.encoded_len())
            .map_err(|_| fail!(Error::InsufficientSpace))?;
        let (header, value) = out.split_at_mut(HEADER_LEN);
        BE::write_u16(&mut header[0..2], record.tag);
        BE::write_u16(&mut header[2..4], record.value.len() as u16);
        value.copy_from_slice(record.value);

        self.prev_tag = record.tag;
        Ok(())
    }
}

/// A decoding position within a buffer.
#[derive(Copy, Clone, Debug)]
pub struct Reader<'a> {
    rest: &'a [u8],
}

impl<'a> Reader<'a> {
    /// Starts decoding records at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { rest: buf }
    }

    /// Returns the bytes that have not been decoded yet.
    pub fn remaining(&self) -> &'a [u8] {
        self.rest
    }

    /// Decodes the next record.
    ///
    /// Returns `Ok(None)` once every byte has been consumed. If the next
    /// header is truncated, or advertises more bytes than remain, returns
    /// [`Error::Corrupt`] without advancing.
    pub fn decode(&mut self) -> crate::Result<Option<Record<'a>>, Error> {
        if self.rest.is_empty() {
            return Ok(None);
        }

        let input = untrusted::Input::from(self.rest);
        let (record, rest) = input
            .read_all(Error::Corrupt, |r| {
                let tag = read_u16(r)?;
                let len = read_u16(r)?;
                let value = r.read_bytes(len as usize).map_err(|_| Error::Corrupt)?;
                Ok((
                    Record::new(tag, value.as_slice_less_safe()),
                    r.read_bytes_to_end().as_slice_less_safe(),
                ))
            })
            .map_err(|e| fail!(e))?;

        self.rest = rest;
        Ok(Some(record))
    }
}

fn read_u16(r: &mut untrusted::Reader) -> Result<u16, Error> {
    let hi = r.read_byte().map_err(|_| Error::Corrupt)?;
    let lo = r.read_byte().map_err(|_| Error::Corrupt)?;
    Ok(u16::from_be_bytes([hi, lo]))
}

/// Scans `region` from its start for the first record tagged `tag`.
///
/// An absent tag is `Ok(None)`: callers decide what the default is. A
/// corrupt record encountered before the tag is found is an error.
pub fn find_decode(region: &[u8], tag: u16) -> crate::Result<Option<Record<'_>>, Error> {
    let mut reader = Reader::new(region);
    while let Some(record) = reader.decode()? {
        if record.tag == tag {
            return Ok(Some(record));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn space() {
        assert_eq!(required_space(0), 4);
        assert_eq!(required_space(16), 20);
    }

    #[test]
    fn encode_then_decode() {
        let mut buf = [0; 64];
        let mut cursor = Cursor::new(&mut buf);
        let mut w = Writer::new(&mut cursor);
        w.encode(Record::new(1, b"first")).unwrap();
        w.encode(Record::new(2, b"")).unwrap();
        w.encode(Record::new(7, b"seventh")).unwrap();
        let len = cursor.consumed_len();
        assert_eq!(len, 3 * HEADER_LEN + 5 + 7);

        assert_eq!(&buf[..9], &[0, 1, 0, 5, b'f', b'i', b'r', b's', b't']);

        let mut r = Reader::new(&buf[..len]);
        assert_eq!(r.decode().unwrap(), Some(Record::new(1, b"first")));
        assert_eq!(r.decode().unwrap(), Some(Record::new(2, b"")));
        assert_eq!(r.decode().unwrap(), Some(Record::new(7, b"seventh")));
        assert_eq!(r.decode().unwrap(), None);
    }

    #[test]
    fn encode_failure_leaves_buffer() {
        let mut buf = [0xaa; 12];
        let mut cursor = Cursor::new(&mut buf);
        let mut w = Writer::new(&mut cursor);
        w.encode(Record::new(3, b"abcd")).unwrap();

        let e = w.encode(Record::new(4, b"xyz")).unwrap_err();
        assert_eq!(e.into_inner(), Error::InsufficientSpace);
        let e = w.encode(Record::new(2, b"")).unwrap_err();
        assert_eq!(e.into_inner(), Error::OutOfOrder);

        assert_eq!(cursor.consumed_len(), 8);
        assert_eq!(&buf[8..], &[0xaa; 4]);
    }

    #[test]
    fn decode_rejects_overlong_length() {
        let buf = [0, 1, 0, 9, 1, 2, 3];
        let mut r = Reader::new(&buf);
        assert_eq!(r.decode().unwrap_err().into_inner(), Error::Corrupt);
        assert_eq!(r.remaining(), &buf[..]);

        let truncated = [0, 1, 0];
        assert!(Reader::new(&truncated).decode().is_err());
    }

    #[test]
    fn find() {
        let mut buf = [0; 32];
        let mut cursor = Cursor::new(&mut buf);
        let mut w = Writer::new(&mut cursor);
        w.encode(Record::new(1, b"one")).unwrap();
        w.encode(Record::new(3, b"three")).unwrap();
        let len = cursor.consumed_len();

        let region = &buf[..len];
        assert_eq!(
            find_decode(region, 3).unwrap(),
            Some(Record::new(3, b"three"))
        );
        assert_eq!(find_decode(region, 2).unwrap(), None);
        assert_eq!(find_decode(&[], 1).unwrap(), None);
    }

    #[test]
    fn find_uses_first_match() {
        let buf = [0, 5, 0, 1, b'a', 0, 5, 0, 1, b'b'];
        assert_eq!(find_decode(&buf, 5).unwrap(), Some(Record::new(5, b"a")));
    }
}

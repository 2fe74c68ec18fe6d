// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Provides the [`Read`] and [`ReadZero`] traits.

use crate::io;
use crate::io::endian::LeInt;

/// Represents a place that bytes can be read from, such as a `&[u8]`.
///
/// Unlike `std::io::Read`, a `Read` always knows how many bytes remain,
/// which is what allows decoders to reject a length field that claims more
/// data than is actually present.
pub trait Read {
    /// Reads exactly `out.len()` bytes from `self`.
    fn read_bytes(&mut self, out: &mut [u8]) -> Result<(), io::Error>;

    /// Returns the number of bytes still available to read.
    fn remaining_data(&self) -> usize;

    /// Reads a little-endian integer.
    #[inline]
    fn read_le<I: LeInt>(&mut self) -> Result<I, io::Error>
    where
        Self: Sized,
    {
        I::read_from(self)
    }
}

/// A [`Read`] that can hand out borrowed slices of its underlying buffer,
/// rather than copying them out.
///
/// The lifetime `'a` is the lifetime of the underlying buffer.
pub trait ReadZero<'a>: Read {
    /// Reads exactly `n` bytes, returning a reference to them.
    fn read_slice(&mut self, n: usize) -> Result<&'a [u8], io::Error>;

    /// Reads every remaining byte.
    fn read_rest(&mut self) -> &'a [u8];
}

// Ensure both traits are object-safe.
impl dyn Read {}
impl dyn ReadZero<'_> {}

impl<R: Read + ?Sized> Read for &'_ mut R {
    #[inline]
    fn read_bytes(&mut self, out: &mut [u8]) -> Result<(), io::Error> {
        R::read_bytes(*self, out)
    }

    #[inline]
    fn remaining_data(&self) -> usize {
        R::remaining_data(*self)
    }
}

impl<'a, R: ReadZero<'a> + ?Sized> ReadZero<'a> for &'_ mut R {
    #[inline]
    fn read_slice(&mut self, n: usize) -> Result<&'a [u8], io::Error> {
        R::read_slice(*self, n)
    }

    #[inline]
    fn read_rest(&mut self) -> &'a [u8] {
        R::read_rest(*self)
    }
}

impl Read for &[u8] {
    fn read_bytes(&mut self, out: &mut [u8]) -> Result<(), io::Error> {
        let n = out.len();
        if self.len() < n {
            return Err(io::Error::BufferExhausted);
        }

        out.copy_from_slice(&self[..n]);
        *self = &self[n..];
        Ok(())
    }

    fn remaining_data(&self) -> usize {
        self.len()
    }
}

impl<'a> ReadZero<'a> for &'a [u8] {
    fn read_slice(&mut self, n: usize) -> Result<&'a [u8], io::Error> {
        if self.len() < n {
            return Err(io::Error::BufferExhausted);
        }

        let (head, tail) = self.split_at(n);
        *self = tail;
        Ok(head)
    }

    fn read_rest(&mut self) -> &'a [u8] {
        let rest = *self;
        *self = &[];
        rest
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn read_bytes() {
        let mut bytes: &[u8] = b"Hello!";
        let mut three_bytes = [0; 3];
        bytes.read_bytes(&mut three_bytes).unwrap();
        assert_eq!(&three_bytes[..], b"Hel");
        assert_eq!(bytes.len(), 3);
        assert_eq!(bytes.read_le::<u16>().unwrap(), 0x6f6c);
        assert_eq!(bytes.len(), 1);
        assert!(bytes.read_le::<u32>().is_err());
    }

    #[test]
    fn read_zero_copy() {
        let buf = *b"header+body";
        let mut bytes = &buf[..];
        assert_eq!(bytes.read_slice(6).unwrap(), b"header");
        assert_eq!(bytes.read_slice(64), Err(io::Error::BufferExhausted));
        assert_eq!(bytes.read_rest(), b"+body");
        assert_eq!(bytes.remaining_data(), 0);
    }
}

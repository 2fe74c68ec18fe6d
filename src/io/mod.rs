// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! I/O interfaces, in lieu of [`std::io`].
//!
//! These traits are intended for manipulating the bounded byte buffers that
//! make up RPC shared memory: every read is checked against the bytes that
//! are actually present, and every write against the capacity that remains.
//!
//! [`std::io`]: https://doc.rust-lang.org/std/io/index.html

pub mod cursor;
pub mod endian;
pub mod read;
pub mod write;

pub use cursor::Cursor;
pub use read::Read;
pub use read::ReadZero;
pub use write::Write;

/// A generic, low-level I/O error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Indicates that some underlying buffer has been completely used up,
    /// either for reading from or writing to.
    BufferExhausted,

    /// Indicates that an unspecified, internal failure occurred.
    Internal,
}

// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The begin/invoke/end call transport.
//!
//! A call goes through three phases, on the client side:
//! 1. [`Caller::begin()`] reserves a request buffer, which the client fills
//!    with a serialized request.
//! 2. [`Caller::invoke()`] delivers the request with an opcode, and returns
//!    either a transport-level [`Error`], or a [`Reply`] carrying the
//!    operation's own status and response.
//! 3. [`Caller::end()`] releases the call's buffers.
//!
//! This two-level status is the core contract of this module: an `op_status`
//! and response only exist once the call has been accepted.
//!
//! On the service side, a call is presented to a [`Service`] as a
//! [`CallRequest`].
//!
//! Callers stack: a [`logging::Logging`] caller wraps some other caller,
//! and the [`session::Session`] at the base of the stack owns the actual
//! buffers and frames each call with a [`header::CallHeader`].

use crate::io::Cursor;
use crate::protocol::Encoding;

pub mod direct;
pub mod header;
pub mod logging;
pub mod session;

/// An RPC-level error.
///
/// Each variant has a fixed, negative `rpc_status` value; zero means the
/// call was accepted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// There is no endpoint to deliver the call to.
    EndpointDoesNotExist,
    /// The opcode is not handled by the service.
    InvalidOpcode,
    /// The service does not speak the call's encoding.
    SerializationNotSupported,
    /// The request could not be decoded.
    InvalidRequestBody,
    /// The response could not be decoded.
    InvalidResponseBody,
    /// A resource, such as memory, could not be allocated.
    ResourceFailure,
    /// The call was made at the wrong point of its lifecycle.
    NotReady,
    /// The call handle is not valid for this caller.
    InvalidTransaction,
    /// An unspecified internal error.
    Internal,
    /// A call parameter was invalid.
    InvalidParameter,
    /// The endpoint does not expose the requested interface.
    InterfaceDoesNotExist,
    /// The caller is not allowed to make this call.
    AccessDenied,
}

/// The `rpc_status` of an accepted call.
pub const CALL_ACCEPTED: i16 = 0;

impl Error {
    /// Returns the `rpc_status` value for this error.
    pub fn status(self) -> i16 {
        match self {
            Self::EndpointDoesNotExist => -1,
            Self::InvalidOpcode => -2,
            Self::SerializationNotSupported => -3,
            Self::InvalidRequestBody => -4,
            Self::InvalidResponseBody => -5,
            Self::ResourceFailure => -6,
            Self::NotReady => -7,
            Self::InvalidTransaction => -8,
            Self::Internal => -9,
            Self::InvalidParameter => -10,
            Self::InterfaceDoesNotExist => -11,
            Self::AccessDenied => -12,
        }
    }

    /// Parses an `rpc_status` value.
    ///
    /// Returns `Ok(())` for [`CALL_ACCEPTED`]; unknown values are mapped to
    /// [`Error::Internal`].
    pub fn from_status(status: i16) -> Result<(), Self> {
        let e = match status {
            CALL_ACCEPTED => return Ok(()),
            -1 => Self::EndpointDoesNotExist,
            -2 => Self::InvalidOpcode,
            -3 => Self::SerializationNotSupported,
            -4 => Self::InvalidRequestBody,
            -5 => Self::InvalidResponseBody,
            -6 => Self::ResourceFailure,
            -7 => Self::NotReady,
            -8 => Self::InvalidTransaction,
            -10 => Self::InvalidParameter,
            -11 => Self::InterfaceDoesNotExist,
            -12 => Self::AccessDenied,
            _ => Self::Internal,
        };
        Err(e)
    }
}

/// Identifies a call in progress on a [`Caller`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallHandle(pub u32);

/// The result of an accepted call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Reply<'a> {
    /// The operation's own status; zero is success.
    pub op_status: i16,
    /// The serialized response parameters.
    pub response: &'a [u8],
}

/// The client side of the call transport.
///
/// At most one call is in progress at a time. A caller may be backed by a
/// real transport, or may wrap another `Caller`.
pub trait Caller {
    /// Begins a call, reserving a request buffer of exactly `request_len`
    /// bytes.
    ///
    /// If no buffer can be reserved, returns an error; in that case the call
    /// was never started, and neither [`Caller::invoke()`] nor
    /// [`Caller::end()`] should be called.
    fn begin(
        &mut self,
        request_len: usize,
    ) -> crate::Result<(CallHandle, &mut [u8]), Error>;

    /// Delivers the request of `call` to the service, under `opcode`.
    ///
    /// `Ok` means the call was accepted; the operation itself may still have
    /// failed, which is reported in [`Reply::op_status`].
    fn invoke(
        &mut self,
        call: CallHandle,
        opcode: u16,
    ) -> crate::Result<Reply<'_>, Error>;

    /// Ends `call`, releasing its buffers.
    fn end(&mut self, call: CallHandle) -> crate::Result<(), Error>;
}

// Ensure Caller is object-safe.
impl dyn Caller {}

impl<C: Caller + ?Sized> Caller for &'_ mut C {
    fn begin(
        &mut self,
        request_len: usize,
    ) -> crate::Result<(CallHandle, &mut [u8]), Error> {
        C::begin(*self, request_len)
    }

    fn invoke(
        &mut self,
        call: CallHandle,
        opcode: u16,
    ) -> crate::Result<Reply<'_>, Error> {
        C::invoke(*self, call, opcode)
    }

    fn end(&mut self, call: CallHandle) -> crate::Result<(), Error> {
        C::end(*self, call)
    }
}

/// A response buffer with a committed length.
///
/// Writes go through [`Buffer::write_with()`], which only commits on success,
/// so a failed serialization never leaves a partial response behind.
pub struct Buffer<'a> {
    data: &'a mut [u8],
    len: usize,
}

impl<'a> Buffer<'a> {
    /// Creates a new, empty buffer over `data`.
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data, len: 0 }
    }

    /// Returns the maximum length of this buffer.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Returns the committed length of this buffer.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether nothing has been committed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the committed bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Discards the committed bytes.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Replaces the contents of this buffer with whatever `f` writes into
    /// the cursor it is given.
    ///
    /// If `f` fails, the buffer is left empty.
    pub fn write_with<E>(
        &mut self,
        f: impl FnOnce(&mut Cursor) -> crate::Result<(), E>,
    ) -> crate::Result<(), E> {
        self.len = 0;
        let mut cursor = Cursor::new(&mut self.data[..]);
        f(&mut cursor)?;
        self.len = cursor.consumed_len();
        Ok(())
    }
}

/// A call, as seen by a [`Service`].
pub struct CallRequest<'a> {
    /// The identity of the calling client, as vouched for by the transport.
    pub client_id: u32,
    /// The interface the call is addressed to.
    pub interface_id: u16,
    /// The requested operation.
    pub opcode: u16,
    /// The dialect of `request`, which `response` must be written in too.
    pub encoding: Encoding,
    /// The operation's status; only meaningful if the call is accepted.
    pub op_status: i16,
    /// The serialized request parameters.
    pub request: &'a [u8],
    /// The buffer for serialized response parameters.
    pub response: Buffer<'a>,
}

/// The service side of the call transport.
///
/// Execution is synchronous: `receive()` runs a call to completion before
/// the next is accepted.
pub trait Service {
    /// Handles `call`.
    ///
    /// Returning `Ok` means the call is accepted, and `call.op_status` and
    /// `call.response` carry the result of the operation.
    fn receive(&mut self, call: &mut CallRequest) -> crate::Result<(), Error>;
}

impl dyn Service {}

impl<S: Service + ?Sized> Service for &'_ mut S {
    fn receive(&mut self, call: &mut CallRequest) -> crate::Result<(), Error> {
        S::receive(*self, call)
    }
}

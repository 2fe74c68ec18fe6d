// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Caller sessions.
//!
//! A [`Session`] binds a client to one service endpoint, reached through a
//! [`Transport`]. It owns the memory shared with the endpoint, and outlives
//! every call made through it.

use serde::Deserialize;
use serde::Serialize;

use crate::io::Cursor;
use crate::protocol::wire::FromWire as _;
use crate::protocol::wire::ToWire as _;
use crate::protocol::Encoding;
use crate::rpc::header::CallHeader;
use crate::rpc::header::ResponseHeader;
use crate::rpc::CallHandle;
use crate::rpc::Caller;
use crate::rpc::Error;
use crate::rpc::Reply;

/// A way of delivering framed calls to an endpoint.
pub trait Transport {
    /// Delivers one call.
    ///
    /// `request` is a [`CallHeader`] followed by the request parameters. The
    /// endpoint writes a [`ResponseHeader`] followed by the response
    /// parameters into `response`, and this function returns the number of
    /// bytes written.
    ///
    /// An `Err` means the call could not be delivered at all.
    fn call(
        &mut self,
        request: &[u8],
        response: &mut [u8],
    ) -> crate::Result<usize, Error>;
}

impl<T: Transport + ?Sized> Transport for &'_ mut T {
    fn call(
        &mut self,
        request: &[u8],
        response: &mut [u8],
    ) -> crate::Result<usize, Error> {
        T::call(*self, request, response)
    }
}

/// How a session carves call buffers out of its shared memory.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryPolicy {
    /// Each call reserves exactly the memory it asks for, up to everything
    /// the session has; the reservation is released by `end`.
    AllocForEachCall,
    /// The session reserves `shared_memory_size` bytes once, when opened;
    /// calls that ask for more fail to begin.
    AllocForSession,
}

/// Options for opening a [`Session`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// The caller identity to stamp on every call.
    pub caller_id: u32,
    /// The interface to address.
    pub interface_id: u16,
    /// The dialect spoken for the lifetime of the session.
    pub encoding: Encoding,
    /// How to reserve memory.
    pub memory_policy: MemoryPolicy,
    /// The parameter space reserved per direction, under
    /// [`MemoryPolicy::AllocForSession`].
    pub shared_memory_size: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            caller_id: 0,
            interface_id: 0,
            encoding: Encoding::PackedC,
            memory_policy: MemoryPolicy::AllocForEachCall,
            shared_memory_size: 4096,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    Idle,
    Begun {
        call: CallHandle,
        request_len: usize,
    },
    Invoked {
        call: CallHandle,
    },
    Closed,
}

/// A caller session; the base of a [`Caller`] stack.
pub struct Session<'m, T> {
    transport: T,
    request_mem: &'m mut [u8],
    response_mem: &'m mut [u8],
    opts: SessionOptions,
    state: State,
    next_call: u32,
}

impl<'m, T: Transport> Session<'m, T> {
    /// Opens a session over `transport`, using `memory` as the shared memory.
    ///
    /// `memory` is split evenly into a request and a response half, each of
    /// which includes room for its framing header.
    pub fn open(
        transport: T,
        memory: &'m mut [u8],
        opts: SessionOptions,
    ) -> crate::Result<Self, Error> {
        let half = memory.len() / 2;
        let (request_mem, response_mem) = memory.split_at_mut(half);
        check!(
            request_mem.len() > CallHeader::LEN,
            Error::ResourceFailure
        );
        if opts.memory_policy == MemoryPolicy::AllocForSession {
            check!(
                opts.shared_memory_size + CallHeader::LEN <= request_mem.len(),
                Error::ResourceFailure
            );
        }

        info!(
            "opened session to interface {} ({:?}, {:?})",
            opts.interface_id,
            opts.encoding,
            opts.memory_policy,
        );
        Ok(Self {
            transport,
            request_mem,
            response_mem,
            opts,
            state: State::Idle,
            next_call: 0,
        })
    }

    /// Returns the dialect this session speaks.
    pub fn encoding(&self) -> Encoding {
        self.opts.encoding
    }

    /// Returns the options this session was opened with.
    pub fn options(&self) -> &SessionOptions {
        &self.opts
    }

    /// Returns whether a call is in progress.
    pub fn is_call_in_progress(&self) -> bool {
        matches!(self.state, State::Begun { .. } | State::Invoked { .. })
    }

    /// Closes this session.
    ///
    /// Fails if a call is still in progress.
    pub fn close(&mut self) -> crate::Result<(), Error> {
        check!(!self.is_call_in_progress(), Error::NotReady);
        self.state = State::Closed;
        Ok(())
    }

    fn request_limit(&self) -> usize {
        match self.opts.memory_policy {
            MemoryPolicy::AllocForSession => self.opts.shared_memory_size,
            MemoryPolicy::AllocForEachCall => {
                self.request_mem.len() - CallHeader::LEN
            }
        }
    }

    fn response_limit(&self) -> usize {
        match self.opts.memory_policy {
            MemoryPolicy::AllocForSession => {
                (self.opts.shared_memory_size + ResponseHeader::LEN)
                    .min(self.response_mem.len())
            }
            MemoryPolicy::AllocForEachCall => self.response_mem.len(),
        }
    }
}

impl<T: Transport> Caller for Session<'_, T> {
    fn begin(
        &mut self,
        request_len: usize,
    ) -> crate::Result<(CallHandle, &mut [u8]), Error> {
        match self.state {
            State::Idle => {}
            State::Closed => return Err(fail!(Error::EndpointDoesNotExist)),
            _ => return Err(fail!(Error::NotReady)),
        }
        check!(
            request_len <= self.request_limit()
                && request_len <= u16::MAX as usize,
            Error::ResourceFailure
        );

        let call = CallHandle(self.next_call);
        self.next_call = self.next_call.wrapping_add(1);
        self.state = State::Begun { call, request_len };

        let params = &mut self.request_mem
            [CallHeader::LEN..CallHeader::LEN + request_len];
        Ok((call, params))
    }

    fn invoke(
        &mut self,
        call: CallHandle,
        opcode: u16,
    ) -> crate::Result<Reply<'_>, Error> {
        let request_len = match self.state {
            State::Begun {
                call: current,
                request_len,
            } => {
                check!(current == call, Error::InvalidTransaction);
                request_len
            }
            _ => return Err(fail!(Error::NotReady)),
        };
        self.state = State::Invoked { call };

        let header = CallHeader {
            caller_id: self.opts.caller_id,
            interface_id: self.opts.interface_id,
            opcode,
            encoding: self.opts.encoding as u16,
            param_len: request_len as u16,
        };
        header
            .to_wire(&mut Cursor::new(
                &mut self.request_mem[..CallHeader::LEN],
            ))
            .map_err(|_| fail!(Error::Internal))?;

        let response_limit = self.response_limit();
        let response_len = self.transport.call(
            &self.request_mem[..CallHeader::LEN + request_len],
            &mut self.response_mem[..response_limit],
        )?;
        check!(response_len <= response_limit, Error::InvalidResponseBody);

        let mut response = &self.response_mem[..response_len];
        let header = ResponseHeader::from_wire(&mut response)
            .map_err(|_| fail!(Error::InvalidResponseBody))?;
        if let Err(e) = Error::from_status(header.rpc_status) {
            return Err(fail!(e));
        }

        let param_len = header.param_len as usize;
        check!(param_len <= response.len(), Error::InvalidResponseBody);
        Ok(Reply {
            op_status: header.op_status,
            response: &response[..param_len],
        })
    }

    fn end(&mut self, call: CallHandle) -> crate::Result<(), Error> {
        match self.state {
            State::Begun { call: current, .. }
            | State::Invoked { call: current } => {
                check!(current == call, Error::InvalidTransaction);
                self.state = State::Idle;
                Ok(())
            }
            _ => Err(fail!(Error::NotReady)),
        }
    }
}

// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! A transport that calls straight into an in-process [`Service`].
//!
//! This is the endpoint half of the call framing: it parses the
//! [`CallHeader`], presents the call to the service as a [`CallRequest`],
//! and frames whatever the service produced with a [`ResponseHeader`].

use core::convert::TryFrom as _;

use crate::io::Cursor;
use crate::protocol::wire::FromWire as _;
use crate::protocol::wire::ToWire as _;
use crate::protocol::wire::WireEnum as _;
use crate::protocol::Encoding;
use crate::rpc::header::CallHeader;
use crate::rpc::header::ResponseHeader;
use crate::rpc::session::Transport;
use crate::rpc::Buffer;
use crate::rpc::CallRequest;
use crate::rpc::Error;
use crate::rpc::Service;
use crate::rpc::CALL_ACCEPTED;

/// A [`Transport`] that delivers calls to a [`Service`] in the same address
/// space.
pub struct Direct<S> {
    service: S,
}

impl<S: Service> Direct<S> {
    /// Creates a new transport over `service`.
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Returns the service this transport delivers to.
    pub fn service(&mut self) -> &mut S {
        &mut self.service
    }

    /// Unwraps this transport.
    pub fn into_inner(self) -> S {
        self.service
    }

    /// Runs one call against the service, returning the accepted call's
    /// `op_status` and response length.
    fn dispatch(
        &mut self,
        header: &CallHeader,
        request: &[u8],
        response: &mut [u8],
    ) -> crate::Result<(i16, usize), Error> {
        let encoding = Encoding::from_wire_value(header.encoding)
            .ok_or_else(|| fail!(Error::SerializationNotSupported))?;

        let mut call = CallRequest {
            client_id: header.caller_id,
            interface_id: header.interface_id,
            opcode: header.opcode,
            encoding,
            op_status: 0,
            request,
            response: Buffer::new(response),
        };
        self.service.receive(&mut call)?;
        Ok((call.op_status, call.response.len()))
    }
}

impl<S: Service> Transport for Direct<S> {
    fn call(
        &mut self,
        request: &[u8],
        response: &mut [u8],
    ) -> crate::Result<usize, Error> {
        check!(response.len() >= ResponseHeader::LEN, Error::ResourceFailure);
        let (header_mem, params) = response.split_at_mut(ResponseHeader::LEN);
        // `param_len` is a u16; never let the service write past it.
        let cap = params.len().min(u16::MAX as usize);
        let params = &mut params[..cap];

        let mut r = request;
        let outcome = match CallHeader::from_wire(&mut r) {
            Ok(header) if header.param_len as usize <= r.len() => {
                let request = &r[..header.param_len as usize];
                trace!(
                    "direct call: client {}, opcode {:#06x}",
                    header.caller_id,
                    header.opcode,
                );
                self.dispatch(&header, request, params)
            }
            _ => Err(fail!(Error::InvalidRequestBody)),
        };

        let reply = match outcome {
            Ok((op_status, len)) => ResponseHeader {
                rpc_status: CALL_ACCEPTED,
                op_status,
                param_len: u16::try_from(len)
                    .map_err(|_| fail!(Error::Internal))?,
            },
            Err(e) => ResponseHeader {
                rpc_status: e.into_inner().status(),
                op_status: 0,
                param_len: 0,
            },
        };
        reply
            .to_wire(&mut Cursor::new(header_mem))
            .map_err(|_| fail!(Error::Internal))?;
        Ok(ResponseHeader::LEN + reply.param_len as usize)
    }
}

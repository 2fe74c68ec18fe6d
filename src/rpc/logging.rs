// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! A caller that logs every call passing through it.

use crate::rpc::CallHandle;
use crate::rpc::Caller;
use crate::rpc::Error;
use crate::rpc::Reply;

/// A [`Caller`] that logs each call before forwarding it to another caller.
///
/// A `Logging` caller starts out detached; until some caller is attached,
/// every call fails with [`Error::InvalidTransaction`].
#[derive(Default)]
pub struct Logging<'c> {
    next: Option<&'c mut dyn Caller>,
    call_index: u32,
}

impl<'c> Logging<'c> {
    /// Creates a detached logging caller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a logging caller already attached to `next`.
    pub fn over(next: &'c mut dyn Caller) -> Self {
        Self {
            next: Some(next),
            call_index: 0,
        }
    }

    /// Attaches `next` as the caller to forward to, replacing any previous
    /// one.
    pub fn attach(&mut self, next: &'c mut dyn Caller) {
        self.next = Some(next);
    }

    /// Detaches the caller being forwarded to, returning it.
    pub fn detach(&mut self) -> Option<&'c mut dyn Caller> {
        self.next.take()
    }

    /// Returns the number of calls begun so far, including failed ones.
    pub fn call_index(&self) -> u32 {
        self.call_index
    }
}

impl Caller for Logging<'_> {
    fn begin(
        &mut self,
        request_len: usize,
    ) -> crate::Result<(CallHandle, &mut [u8]), Error> {
        let index = self.call_index;
        self.call_index = self.call_index.wrapping_add(1);
        info!("call {}: begin, req_len = {}", index, request_len);

        let next = match self.next.as_deref_mut() {
            Some(next) => next,
            None => {
                return Err(fail!(
                    Error::InvalidTransaction,
                    "call {}: no caller attached",
                    index
                ))
            }
        };
        next.begin(request_len).map_err(|e| {
            error!("call {}: begin failed: {:?}", index, e);
            e
        })
    }

    fn invoke(
        &mut self,
        call: CallHandle,
        opcode: u16,
    ) -> crate::Result<Reply<'_>, Error> {
        let next = match self.next.as_deref_mut() {
            Some(next) => next,
            None => return Err(fail!(Error::InvalidTransaction)),
        };

        let result = next.invoke(call, opcode);
        match &result {
            Ok(reply) => {
                info!("invoke: opcode = {:#06x}, rpc_status = 0", opcode);
                info!(
                    "invoke: op_status = {}, resp_len = {}",
                    reply.op_status,
                    reply.response.len()
                );
            }
            Err(e) => {
                info!(
                    "invoke: opcode = {:#06x}, rpc_status = {}",
                    opcode,
                    e.as_ref().status()
                );
            }
        }
        result
    }

    fn end(&mut self, call: CallHandle) -> crate::Result<(), Error> {
        match self.next.as_deref_mut() {
            Some(next) => next.end(call),
            None => Err(fail!(Error::InvalidTransaction)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct Fixed {
        buf: [u8; 8],
        ended: bool,
    }

    impl Caller for Fixed {
        fn begin(
            &mut self,
            request_len: usize,
        ) -> crate::Result<(CallHandle, &mut [u8]), Error> {
            check!(request_len <= self.buf.len(), Error::ResourceFailure);
            Ok((CallHandle(5), &mut self.buf[..request_len]))
        }

        fn invoke(
            &mut self,
            call: CallHandle,
            _: u16,
        ) -> crate::Result<Reply<'_>, Error> {
            check!(call == CallHandle(5), Error::InvalidTransaction);
            Ok(Reply {
                op_status: 0,
                response: &self.buf[..2],
            })
        }

        fn end(&mut self, _: CallHandle) -> crate::Result<(), Error> {
            self.ended = true;
            Ok(())
        }
    }

    #[test]
    fn detached() {
        let mut logging = Logging::new();
        let e = logging.begin(4).unwrap_err();
        assert_eq!(e.into_inner(), Error::InvalidTransaction);
        let e = logging.invoke(CallHandle(0), 1).unwrap_err();
        assert_eq!(e.into_inner(), Error::InvalidTransaction);
        let e = logging.end(CallHandle(0)).unwrap_err();
        assert_eq!(e.into_inner(), Error::InvalidTransaction);
        assert_eq!(logging.call_index(), 1);
    }

    #[test]
    fn forwards() {
        let mut inner = Fixed {
            buf: [0; 8],
            ended: false,
        };
        {
            let mut logging = Logging::new();
            logging.attach(&mut inner);

            let (call, req) = logging.begin(2).unwrap();
            req.copy_from_slice(&[1, 2]);
            let reply = logging.invoke(call, 0x0200).unwrap();
            assert_eq!(reply.response, &[1, 2]);
            logging.end(call).unwrap();

            assert!(logging.begin(9).is_err());
            assert_eq!(logging.call_index(), 2);
            assert!(logging.detach().is_some());
        }
        assert!(inner.ended);
    }

    #[test]
    fn stacked() {
        let mut inner = Fixed {
            buf: [0; 8],
            ended: false,
        };
        let mut middle = Logging::over(&mut inner);
        let mut outer = Logging::over(&mut middle);
        let (call, _) = outer.begin(2).unwrap();
        outer.invoke(call, 1).unwrap();
        outer.end(call).unwrap();
        assert_eq!(outer.call_index(), 1);
    }
}

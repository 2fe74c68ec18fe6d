// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Fuzz tests for a session reading replies from a hostile endpoint.

#![no_main]

use libfuzzer_sys::fuzz_target;

use trustsvc::rpc;
use trustsvc::rpc::session::Session;
use trustsvc::rpc::session::SessionOptions;
use trustsvc::rpc::session::Transport;
use trustsvc::rpc::Caller as _;

/// A transport that answers every call with fixed bytes.
struct Canned<'a>(&'a [u8]);

impl Transport for Canned<'_> {
    fn call(
        &mut self,
        _: &[u8],
        response: &mut [u8],
    ) -> trustsvc::Result<usize, rpc::Error> {
        let len = self.0.len().min(response.len());
        response[..len].copy_from_slice(&self.0[..len]);
        Ok(len)
    }
}

fuzz_target!(|data: &[u8]| {
    let mut memory = [0; 512];
    let mut session =
        match Session::open(Canned(data), &mut memory, SessionOptions::default()) {
            Ok(s) => s,
            Err(_) => return,
        };

    let (call, buf) = session.begin(4).unwrap();
    buf.copy_from_slice(b"fuzz");
    if let Ok(reply) = session.invoke(call, 0x0200) {
        assert!(reply.response.len() <= data.len());
    }
    session.end(call).unwrap();
});

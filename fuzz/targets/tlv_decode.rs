// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Fuzz tests for the TLV reader.

#![no_main]

use libfuzzer_sys::fuzz_target;

use trustsvc::tlv;
use trustsvc::tlv::Reader;

fuzz_target!(|data: &[u8]| {
    let mut reader = Reader::new(data);
    let mut consumed = 0;
    while let Ok(Some(record)) = reader.decode() {
        consumed += record.encoded_len();
        assert!(consumed <= data.len());
    }

    // Whatever was not decoded is still there.
    assert_eq!(consumed + reader.remaining().len(), data.len());

    if let Some(&tag) = data.first() {
        if let Ok(Some(record)) = tlv::find_decode(data, tag as u16) {
            assert_eq!(record.tag, tag as u16);
        }
    }
});

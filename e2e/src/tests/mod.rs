// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end scenarios, each run through the full client, caller stack,
//! transport, endpoint and provider path.

#[ctor::ctor]
fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Runs `$body` once per dialect, with `$client` bound to a fresh client of
/// caller 1 on a fresh endpoint.
macro_rules! each_dialect {
    (|$client:ident| $body:block) => {{
        use trustsvc::protocol::PackedC;
        use trustsvc::protocol::Schema;
        let world = $crate::harness::World::new();
        let config = $crate::harness::Config::default();
        $crate::harness::with_endpoint(&world, config.endpoint, |service| {
            $crate::harness::connect(service, &config, 1, PackedC, |$client| $body);
        });
        let world = $crate::harness::World::new();
        $crate::harness::with_endpoint(&world, config.endpoint, |service| {
            $crate::harness::connect(service, &config, 1, Schema, |$client| $body);
        });
    }};
}

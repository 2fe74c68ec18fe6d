// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Options for a [`ServiceProvider`](super::ServiceProvider).

use serde::Deserialize;
use serde::Serialize;

use crate::protocol::Encoding;

/// Runtime options for a service endpoint.
///
/// Pool capacities are not options; they are fixed per provider type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// The interface id the endpoint answers to. Calls addressed to any
    /// other interface are rejected.
    pub interface_id: u16,
    /// The encoding clients should open sessions with.
    pub default_encoding: Encoding,
    /// The largest request, in bytes, the endpoint will accept.
    pub max_payload: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interface_id: 0,
            default_encoding: Encoding::PackedC,
            max_payload: 4096,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn from_json() {
        let opts: Options = serde_json::from_str(
            r#"{ "interface_id": 3, "default_encoding": "Schema" }"#,
        )
        .unwrap();
        assert_eq!(
            opts,
            Options {
                interface_id: 3,
                default_encoding: Encoding::Schema,
                max_payload: 4096,
            }
        );
    }
}

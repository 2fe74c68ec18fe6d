// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Known-answer test data for the crypto backends.

pub mod aes;
pub mod hkdf;
pub mod misc_crypto;

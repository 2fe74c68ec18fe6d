// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Algorithm identifiers, as carried on the wire.
//!
//! Identifiers are PSA-style `u32`s; parameterized algorithms such as HMAC
//! and HKDF embed the identifier of the hash they use in their low byte.

/// SHA-256.
pub const SHA_256: u32 = 0x0200_0009;
/// SHA-384.
pub const SHA_384: u32 = 0x0200_000a;
/// SHA-512.
pub const SHA_512: u32 = 0x0200_000b;

const HMAC_BASE: u32 = 0x0380_0000;
const HKDF_BASE: u32 = 0x0800_0100;
const HASH_MASK: u32 = 0x0000_00ff;
const HASH_CATEGORY: u32 = 0x0200_0000;

/// AES (or any block cipher) in counter mode.
pub const CTR: u32 = 0x04c0_1000;
/// CBC without padding; input must be a whole number of blocks.
pub const CBC_NO_PADDING: u32 = 0x0440_4000;
/// CBC with PKCS#7 padding.
pub const CBC_PKCS7: u32 = 0x0440_4100;

/// AES-GCM with a 16-byte tag.
pub const GCM: u32 = 0x0550_0200;
/// ChaCha20-Poly1305.
pub const CHACHA20_POLY1305: u32 = 0x0510_0500;

/// Returns the HMAC algorithm over `hash`.
pub const fn hmac(hash: u32) -> u32 {
    HMAC_BASE | (hash & HASH_MASK)
}

/// Returns the HKDF algorithm over `hash`.
pub const fn hkdf(hash: u32) -> u32 {
    HKDF_BASE | (hash & HASH_MASK)
}

/// Returns whether `alg` is an HMAC algorithm.
pub const fn is_hmac(alg: u32) -> bool {
    alg & !HASH_MASK == HMAC_BASE
}

/// Returns whether `alg` is an HKDF algorithm.
pub const fn is_hkdf(alg: u32) -> bool {
    alg & !HASH_MASK == HKDF_BASE
}

/// Returns the hash an HMAC or HKDF algorithm is built on.
pub const fn underlying_hash(alg: u32) -> u32 {
    HASH_CATEGORY | (alg & HASH_MASK)
}

/// Key derivation steps, as passed to `input_bytes` and `input_key`.
pub mod step {
    /// The secret input keying material.
    pub const SECRET: u32 = 0x0101;
    /// A label.
    pub const LABEL: u32 = 0x0201;
    /// A salt.
    pub const SALT: u32 = 0x0202;
    /// Context and application specific information.
    pub const INFO: u32 = 0x0203;
    /// A seed.
    pub const SEED: u32 = 0x0204;
}

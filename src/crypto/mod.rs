// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Pluggable cryptography traits, and the operation context pool.
//!
//! The crypto service does not execute any algorithm itself. Each operation
//! family is backed by a *builder* trait, which starts operations, and an
//! *engine* trait, which is the state of one operation in flight:
//! - [`hash::Builder`] and [`hash::Engine`], for digests and HMAC.
//! - [`cipher::Builder`] and [`cipher::Engine`], for unauthenticated block
//!   cipher modes.
//! - [`aead::Builder`] and [`aead::Engine`].
//! - [`kdf::Builder`] and [`kdf::Engine`], for multi-step key derivation.
//!
//! Alongside these, [`csrng::Csrng`] provides randomness and [`key::Store`]
//! holds key material on behalf of clients.
//!
//! Engines in flight are held by a [`pool::ContextPool`] between calls.
//!
//! It is recommended to not import the traits in this module directly, since
//! a lot of them have the same name. Instead, use imports like
//! `use trustsvc::crypto::hash;` and partially-qualified names like
//! `hash::Engine`.
//!
//! Software implementations of these traits are provided under the
//! [`ring` module], controlled by the `ring` feature flag.
//!
//! [`ring` module]: ring/index.html

pub mod aead;
pub mod alg;
pub mod cipher;
pub mod csrng;
pub mod hash;
pub mod kdf;
pub mod key;
pub mod pool;

#[cfg(feature = "ring")]
pub mod ring;

/// A crypto operation status.
///
/// These are reported verbatim to clients as a call's `op_status`; each
/// variant has a fixed negative value, and zero means success.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// An error that does not correspond to any other variant.
    GenericError,
    /// The operation is not permitted by the key's policy.
    NotPermitted,
    /// The algorithm or parameter is not supported.
    NotSupported,
    /// A parameter is invalid.
    InvalidArgument,
    /// The key or operation handle does not exist.
    InvalidHandle,
    /// The operation was requested in the wrong state.
    BadState,
    /// An output buffer is too small.
    BufferTooSmall,
    /// An identifier is already in use.
    AlreadyExists,
    /// An identifier does not exist.
    DoesNotExist,
    /// Not enough memory.
    InsufficientMemory,
    /// Not enough key storage.
    InsufficientStorage,
    /// Not enough input, or not enough capacity left to output.
    InsufficientData,
    /// Communication with a peripheral failed.
    CommunicationFailure,
    /// The key store failed.
    StorageFailure,
    /// A hardware failure.
    HardwareFailure,
    /// Not enough entropy to generate random bytes.
    InsufficientEntropy,
    /// A MAC, tag or digest did not match.
    InvalidSignature,
    /// Decrypted padding was malformed.
    InvalidPadding,
    /// A tampering attempt was detected.
    CorruptionDetected,
    /// Stored data is corrupt.
    DataCorrupt,
}

/// The `op_status` of a successful operation.
pub const SUCCESS: i16 = 0;

impl Error {
    /// Returns the `op_status` value for this error.
    pub fn status(self) -> i16 {
        match self {
            Self::GenericError => -132,
            Self::NotPermitted => -133,
            Self::NotSupported => -134,
            Self::InvalidArgument => -135,
            Self::InvalidHandle => -136,
            Self::BadState => -137,
            Self::BufferTooSmall => -138,
            Self::AlreadyExists => -139,
            Self::DoesNotExist => -140,
            Self::InsufficientMemory => -141,
            Self::InsufficientStorage => -142,
            Self::InsufficientData => -143,
            Self::CommunicationFailure => -145,
            Self::StorageFailure => -146,
            Self::HardwareFailure => -147,
            Self::InsufficientEntropy => -148,
            Self::InvalidSignature => -149,
            Self::InvalidPadding => -150,
            Self::CorruptionDetected => -151,
            Self::DataCorrupt => -152,
        }
    }

    /// Parses an `op_status` value.
    ///
    /// Returns `Ok(())` for [`SUCCESS`]; unknown values are mapped to
    /// [`Error::GenericError`].
    pub fn from_status(status: i16) -> Result<(), Self> {
        let e = match status {
            SUCCESS => return Ok(()),
            -133 => Self::NotPermitted,
            -134 => Self::NotSupported,
            -135 => Self::InvalidArgument,
            -136 => Self::InvalidHandle,
            -137 => Self::BadState,
            -138 => Self::BufferTooSmall,
            -139 => Self::AlreadyExists,
            -140 => Self::DoesNotExist,
            -141 => Self::InsufficientMemory,
            -142 => Self::InsufficientStorage,
            -143 => Self::InsufficientData,
            -145 => Self::CommunicationFailure,
            -146 => Self::StorageFailure,
            -147 => Self::HardwareFailure,
            -148 => Self::InsufficientEntropy,
            -149 => Self::InvalidSignature,
            -150 => Self::InvalidPadding,
            -151 => Self::CorruptionDetected,
            -152 => Self::DataCorrupt,
            _ => Self::GenericError,
        };
        Err(e)
    }
}

impl From<pool::Error> for Error {
    fn from(e: pool::Error) -> Self {
        match e {
            pool::Error::NotFound => Self::BadState,
            pool::Error::InvalidContext => Self::InvalidHandle,
            pool::Error::NoCapacity => Self::InsufficientMemory,
        }
    }
}
debug_from!(Error => pool::Error);

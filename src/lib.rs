// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! `trustsvc` is the RPC and crypto-operation core of a firmware trust
//! services framework.
//!
//! Isolated *service providers* expose operations to mutually distrusting
//! client partitions over a restricted, shared-memory channel. Every call
//! is synchronous, but crypto operations such as hashing or AEAD span many
//! calls; their state lives on the service side in a
//! [context pool](crypto::pool), addressed by a client-scoped handle.
//!
//! The crate is layered as follows, leaves first:
//! - [`tlv`], the tag/length/value codec for variable-length fields.
//! - [`protocol`], typed messages for each operation family, and the two
//!   wire dialects they can be serialized in.
//! - [`rpc`], the begin/invoke/end call transport, including sessions and
//!   stackable callers.
//! - [`service`], opcode dispatch tables and their composition.
//! - [`crypto`] and [`provider`], the backend interfaces, the context pool,
//!   and the crypto service built on top of them.
//! - [`client`], the client side of the crypto service.
//!
//! `trustsvc` is `no_std`; the `std` feature only forwards to dependencies,
//! and the `ring` feature enables a reference crypto backend.

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]
#![deny(warnings)]
#![deny(unused)]
#![deny(unsafe_code)]

#[cfg(feature = "log")]
extern crate log as __raw_log;

#[macro_use]
pub mod debug;

#[macro_use]
pub mod protocol;

pub mod client;
pub mod crypto;
pub mod io;
pub mod provider;
pub mod rpc;
pub mod service;
pub mod tlv;

pub use debug::Error;

/// A `Result` whose error is wrapped in a [`trustsvc::Error`](Error).
pub type Result<T, E> = core::result::Result<T, Error<E>>;

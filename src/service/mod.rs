// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Service providers and opcode dispatch.
//!
//! A [`Provider`] handles a small, fixed set of opcodes. A
//! [`ServiceProvider`] binds a *core* provider to an interface, and can be
//! extended with further providers, each contributing its own opcodes; it
//! is the [`rpc::Service`] that calls are delivered to.
//!
//! Extension is additive and happens at initialization: once added, a
//! provider cannot be removed, and no two providers may claim the same
//! opcode.
//!
//! Each provider decodes its requests with a *serializer table*, one per
//! [`Encoding`] it speaks; see [`Serializers`].

use arrayvec::ArrayVec;

use crate::protocol::Encoding;
use crate::rpc;
use crate::rpc::CallRequest;

mod options;
pub use options::Options;

/// A set of opcode handlers.
pub trait Provider {
    /// Returns every opcode this provider handles.
    ///
    /// This set must not change over the lifetime of the provider.
    fn opcodes(&self) -> &'static [u16];

    /// Handles `call`, whose opcode is one of [`Provider::opcodes()`].
    ///
    /// Returning `Ok` means the call was accepted; the outcome of the
    /// operation is in `call.op_status` and `call.response`.
    fn dispatch(&mut self, call: &mut CallRequest) -> crate::Result<(), rpc::Error>;
}

// Ensure Provider is object-safe.
impl dyn Provider {}

/// An error returned by [`ServiceProvider::extend()`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExtendError {
    /// The extension claims an opcode that is already handled.
    Overlap(u16),
    /// No more providers can be added.
    Full,
}

/// A service endpoint: a core provider plus its extensions.
///
/// `N` bounds the total number of providers, core included, and must be at
/// least one.
pub struct ServiceProvider<'p, const N: usize = 8> {
    opts: Options,
    providers: ArrayVec<&'p mut dyn Provider, N>,
}

impl<'p, const N: usize> ServiceProvider<'p, N> {
    /// Creates a new endpoint around `core`.
    pub fn new(core: &'p mut dyn Provider, opts: Options) -> Self {
        let mut providers = ArrayVec::new();
        providers.push(core);
        Self { opts, providers }
    }

    /// Returns the options this endpoint was created with.
    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// Merges the opcodes of `ext` into this endpoint.
    ///
    /// If any opcode of `ext` is already handled, nothing is merged.
    pub fn extend(
        &mut self,
        ext: &'p mut dyn Provider,
    ) -> crate::Result<(), ExtendError> {
        for &opcode in ext.opcodes() {
            if self.find(opcode).is_some() {
                return Err(fail!(
                    ExtendError::Overlap(opcode),
                    "opcode {:#06x} is already handled",
                    opcode
                ));
            }
        }
        self.providers
            .try_push(ext)
            .map_err(|_| fail!(ExtendError::Full))
    }

    fn find(&self, opcode: u16) -> Option<usize> {
        self.providers
            .iter()
            .position(|p| p.opcodes().contains(&opcode))
    }
}

impl<const N: usize> rpc::Service for ServiceProvider<'_, N> {
    fn receive(
        &mut self,
        call: &mut CallRequest,
    ) -> crate::Result<(), rpc::Error> {
        check!(
            call.interface_id == self.opts.interface_id,
            rpc::Error::InterfaceDoesNotExist
        );
        check!(
            call.request.len() <= self.opts.max_payload,
            rpc::Error::ResourceFailure
        );

        let idx = self.find(call.opcode).ok_or_else(|| {
            fail!(
                rpc::Error::InvalidOpcode,
                "no provider for opcode {:#06x}",
                call.opcode
            )
        })?;
        self.providers[idx].dispatch(call)
    }
}

/// A provider's serializer tables, one slot per [`Encoding`].
///
/// `T` is a family's serializer trait, such as
/// `dyn protocol::hash::HashSerializer`.
pub struct Serializers<'a, T: ?Sized> {
    tables: [Option<&'a T>; Encoding::COUNT],
}

impl<'a, T: ?Sized> Serializers<'a, T> {
    /// Creates an empty set of tables.
    pub fn new() -> Self {
        Self {
            tables: [None; Encoding::COUNT],
        }
    }

    /// Registers `table` as the serializer for `encoding`, replacing any
    /// previous one.
    pub fn register(&mut self, encoding: Encoding, table: &'a T) {
        self.tables[encoding.index()] = Some(table);
    }

    /// Returns whether a table is registered for `encoding`.
    pub fn is_registered(&self, encoding: Encoding) -> bool {
        self.tables[encoding.index()].is_some()
    }

    /// Looks up the table for `encoding`.
    pub fn get(&self, encoding: Encoding) -> crate::Result<&'a T, rpc::Error> {
        self.tables[encoding.index()].ok_or_else(|| {
            fail!(
                rpc::Error::SerializationNotSupported,
                "no serializer registered for {}",
                encoding
            )
        })
    }
}

impl<T: ?Sized> Default for Serializers<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

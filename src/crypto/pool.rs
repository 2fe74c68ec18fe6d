// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The crypto operation context pool.
//!
//! A multi-step operation, such as a hash spanning several `update` calls,
//! keeps its state on the service side between calls. A [`ContextPool`] is
//! a fixed-capacity table of such states, each stored in a [`Slot`] tagged
//! with the operation [`Kind`], the owning client, and a handle.
//!
//! A slot is only reachable through the exact `(kind, client_id, handle)`
//! triple it was allocated with: two clients that happen to hold the same
//! numeric handle never see each other's operations.
//!
//! The pool never runs out. When every slot is occupied, [`ContextPool::alloc`]
//! evicts the least-recently-used slot, whoever owns it; the owner of an
//! evicted operation finds it missing on its next call, exactly as if it
//! had never existed. Recency is tracked with a monotonic counter that ticks
//! on every `alloc` and `find`, with ties broken by slot index.

use arrayvec::ArrayVec;

/// The capacity of a [`ContextPool`] unless specified otherwise.
pub const DEFAULT_CAPACITY: usize = 10;

/// The kind of operation a context belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// A hash operation.
    Hash,
    /// A MAC operation.
    Mac,
    /// A cipher operation.
    Cipher,
    /// An AEAD operation.
    Aead,
    /// A key derivation operation.
    KeyDerivation,
}

/// An error returned by a [`ContextPool`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// No live context matches the requested triple.
    NotFound,
    /// The context has already been freed, or was evicted.
    InvalidContext,
    /// The pool was created with no slots at all.
    NoCapacity,
}

/// A reference to a live slot in a [`ContextPool`].
///
/// A `Context` is only valid until the slot is freed or evicted; after that,
/// every use of it fails with [`Error::InvalidContext`], even if the slot
/// has since been reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Context {
    index: usize,
    handle: u32,
    born: u64,
}

impl Context {
    /// Returns the handle the owning client addresses this context by.
    pub fn handle(&self) -> u32 {
        self.handle
    }
}

/// One entry of a [`ContextPool`].
pub struct Slot<S> {
    kind: Kind,
    client_id: u32,
    handle: u32,
    state: Option<S>,
    last_used: u64,
    born: u64,
}

impl<S> Slot<S> {
    fn is_live(&self) -> bool {
        self.state.is_some()
    }

    fn matches(&self, kind: Kind, client_id: u32, handle: u32) -> bool {
        self.is_live()
            && self.kind == kind
            && self.client_id == client_id
            && self.handle == handle
    }
}

/// A fixed-capacity pool of operation states of type `S`.
///
/// See the [module documentation](index.html) for more information.
pub struct ContextPool<S, const N: usize = DEFAULT_CAPACITY> {
    slots: ArrayVec<Slot<S>, N>,
    clock: u64,
    last_handle: u32,
}

impl<S, const N: usize> ContextPool<S, N> {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self {
            slots: ArrayVec::new(),
            clock: 0,
            last_handle: 0,
        }
    }

    /// Returns the number of slots in this pool.
    pub fn capacity(&self) -> usize {
        N
    }

    /// Returns the number of live contexts.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_live()).count()
    }

    /// Returns whether no context is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Picks the handle after the most recently issued one that no live
    /// context is using.
    fn next_handle(&mut self) -> u32 {
        let mut handle = self.last_handle.wrapping_add(1);
        while self.slots.iter().any(|s| s.is_live() && s.handle == handle) {
            handle = handle.wrapping_add(1);
        }
        self.last_handle = handle;
        handle
    }

    /// Allocates a context for `client_id`, holding `state`.
    ///
    /// If the pool is full, the least-recently-used context is evicted to
    /// make room.
    pub fn alloc(
        &mut self,
        kind: Kind,
        client_id: u32,
        state: S,
    ) -> crate::Result<Context, Error> {
        let index = match self.slots.iter().position(|s| !s.is_live()) {
            Some(index) => index,
            None if !self.slots.is_full() => {
                self.slots.push(Slot {
                    kind,
                    client_id,
                    handle: 0,
                    state: None,
                    last_used: 0,
                    born: 0,
                });
                self.slots.len() - 1
            }
            None => {
                let (index, victim) = self
                    .slots
                    .iter()
                    .enumerate()
                    .min_by_key(|(i, s)| (s.last_used, *i))
                    .ok_or_else(|| fail!(Error::NoCapacity))?;
                warn!(
                    "evicting {:?} context {} of client {}",
                    victim.kind,
                    victim.handle,
                    victim.client_id
                );
                index
            }
        };

        let handle = self.next_handle();
        let now = self.tick();
        self.slots[index] = Slot {
            kind,
            client_id,
            handle,
            state: Some(state),
            last_used: now,
            born: now,
        };
        trace!("allocated {:?} context {} in slot {}", kind, handle, index);
        Ok(Context {
            index,
            handle,
            born: now,
        })
    }

    /// Finds the live context allocated with exactly this triple, marking it
    /// as most recently used.
    pub fn find(
        &mut self,
        kind: Kind,
        client_id: u32,
        handle: u32,
    ) -> crate::Result<Context, Error> {
        let index = self
            .slots
            .iter()
            .position(|s| s.matches(kind, client_id, handle))
            .ok_or_else(|| fail!(Error::NotFound))?;
        let now = self.tick();
        let slot = &mut self.slots[index];
        slot.last_used = now;
        Ok(Context {
            index,
            handle,
            born: slot.born,
        })
    }

    fn slot_mut(&mut self, ctx: Context) -> crate::Result<&mut Slot<S>, Error> {
        match self.slots.get_mut(ctx.index) {
            Some(slot) if slot.is_live() && slot.born == ctx.born => Ok(slot),
            _ => Err(fail!(Error::InvalidContext)),
        }
    }

    /// Returns the state held by `ctx`.
    pub fn get_mut(&mut self, ctx: Context) -> crate::Result<&mut S, Error> {
        let slot = self.slot_mut(ctx)?;
        slot.state.as_mut().ok_or_else(|| fail!(Error::InvalidContext))
    }

    /// Frees `ctx`, returning the state it held.
    ///
    /// Freeing a context twice, or one that was evicted, is an error.
    pub fn free(&mut self, ctx: Context) -> crate::Result<S, Error> {
        let slot = self.slot_mut(ctx)?;
        trace!("freeing context {} in slot {}", ctx.handle, ctx.index);
        slot.state.take().ok_or_else(|| fail!(Error::InvalidContext))
    }

    /// Frees the context matching this triple, if there is one.
    pub fn release(
        &mut self,
        kind: Kind,
        client_id: u32,
        handle: u32,
    ) -> Option<S> {
        self.slots
            .iter_mut()
            .find(|s| s.matches(kind, client_id, handle))
            .and_then(|s| s.state.take())
    }
}

impl<S, const N: usize> Default for ContextPool<S, N> {
    fn default() -> Self {
        Self::new()
    }
}

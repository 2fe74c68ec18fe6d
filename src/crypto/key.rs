// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Key storage, partitioned by client.
//!
//! Keys are addressed by a `u32` id, but every lookup also names the client
//! making it: a key belongs to the client that created it, and to every
//! other client it simply does not exist.

use core::cell::Cell;
use core::cell::RefCell;

use arrayvec::ArrayVec;
use enumflags2::bitflags;
use enumflags2::BitFlags;

use crate::crypto::Error;

/// Key type identifiers.
pub mod types {
    /// No key.
    pub const NONE: u32 = 0;
    /// Raw, untyped bytes.
    pub const RAW_DATA: u32 = 0x1001;
    /// An HMAC key.
    pub const HMAC: u32 = 0x1100;
    /// Secret input for key derivation.
    pub const DERIVE: u32 = 0x1200;
    /// An AES key.
    pub const AES: u32 = 0x2400;
    /// A ChaCha20 key.
    pub const CHACHA20: u32 = 0x2004;
}

/// The lifetime of a key that does not outlive the key store.
pub const LIFETIME_VOLATILE: u32 = 0;
/// The lifetime of a key backed by persistent storage.
pub const LIFETIME_PERSISTENT: u32 = 1;

/// The largest key, in bytes, a [`KeyStore`] can hold.
pub const MAX_KEY_LEN: usize = 64;

/// What a key may be used for.
#[bitflags]
#[repr(u32)]
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Usage {
    /// The key material may be exported.
    Export = 0x0001,
    /// The key may be copied.
    Copy = 0x0002,
    /// The key may encrypt.
    Encrypt = 0x0100,
    /// The key may decrypt.
    Decrypt = 0x0200,
    /// The key may produce MACs.
    SignHash = 0x1000,
    /// The key may verify MACs.
    VerifyHash = 0x2000,
    /// The key may be a key derivation input.
    Derive = 0x4000,
}

/// The attributes of a key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Attributes {
    /// The key type; see [`types`].
    pub key_type: u32,
    /// The key size in bits. Zero on import means "derive from the
    /// material".
    pub bits: u32,
    /// The key lifetime.
    pub lifetime: u32,
    /// The key id; assigned by the store for volatile keys.
    pub id: u32,
    /// Permitted usages.
    pub usage: BitFlags<Usage>,
    /// The one algorithm the key may be used with; zero permits any.
    pub alg: u32,
}

impl Attributes {
    /// Checks that this key's policy permits `usage` with `alg`.
    pub fn permits(&self, usage: Usage, alg: Option<u32>) -> crate::Result<(), Error> {
        check!(self.usage.contains(usage), Error::NotPermitted);
        if let Some(alg) = alg {
            check!(self.alg == 0 || self.alg == alg, Error::NotPermitted);
        }
        Ok(())
    }
}

/// A store of client-owned keys.
///
/// Methods take `&self`: a store is shared by every provider that uses keys.
pub trait Store {
    /// Stores `material` as a new key for `client_id`, returning its id.
    fn import(
        &self,
        client_id: u32,
        attrs: &Attributes,
        material: &[u8],
    ) -> crate::Result<u32, Error>;

    /// Destroys a key.
    fn destroy(&self, client_id: u32, id: u32) -> crate::Result<(), Error>;

    /// Returns the attributes of a key.
    fn attributes(
        &self,
        client_id: u32,
        id: u32,
    ) -> crate::Result<Attributes, Error>;

    /// Copies the material of a key into `out`, after checking that the
    /// key's policy permits `usage` (and `alg`, if given).
    ///
    /// Returns the length of the material.
    fn material(
        &self,
        client_id: u32,
        id: u32,
        usage: Usage,
        alg: Option<u32>,
        out: &mut [u8],
    ) -> crate::Result<usize, Error>;
}

// Ensure Store is object-safe.
impl dyn Store {}

struct Entry {
    owner: u32,
    attrs: Attributes,
    material: ArrayVec<u8, MAX_KEY_LEN>,
}

/// A fixed-capacity, volatile [`Store`].
pub struct KeyStore<const N: usize = 16> {
    keys: RefCell<ArrayVec<Entry, N>>,
    last_id: Cell<u32>,
}

impl<const N: usize> KeyStore<N> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            keys: RefCell::new(ArrayVec::new()),
            last_id: Cell::new(0),
        }
    }

    /// Returns the number of keys held, across all clients.
    pub fn len(&self) -> usize {
        self.keys.borrow().len()
    }

    /// Returns whether no keys are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn validate(attrs: &Attributes, material: &[u8]) -> crate::Result<(), Error> {
        check!(attrs.lifetime == LIFETIME_VOLATILE, Error::NotSupported);
        check!(!material.is_empty(), Error::InvalidArgument);
        check!(material.len() <= MAX_KEY_LEN, Error::NotSupported);
        check!(
            attrs.bits == 0 || attrs.bits as usize == material.len() * 8,
            Error::InvalidArgument
        );
        match attrs.key_type {
            types::AES => check!(
                matches!(material.len(), 16 | 24 | 32),
                Error::InvalidArgument
            ),
            types::CHACHA20 => {
                check!(material.len() == 32, Error::InvalidArgument)
            }
            types::RAW_DATA | types::HMAC | types::DERIVE => {}
            _ => return Err(fail!(Error::NotSupported)),
        }
        Ok(())
    }
}

impl<const N: usize> Default for KeyStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Store for KeyStore<N> {
    fn import(
        &self,
        client_id: u32,
        attrs: &Attributes,
        material: &[u8],
    ) -> crate::Result<u32, Error> {
        Self::validate(attrs, material)?;
        let mut keys = self.keys.borrow_mut();
        check!(!keys.is_full(), Error::InsufficientStorage);

        let mut id = self.last_id.get();
        loop {
            id = id.wrapping_add(1);
            if id != 0 && keys.iter().all(|k| k.attrs.id != id) {
                break;
            }
        }
        self.last_id.set(id);

        let mut stored = ArrayVec::new();
        stored
            .try_extend_from_slice(material)
            .map_err(|_| fail!(Error::NotSupported))?;
        keys.push(Entry {
            owner: client_id,
            attrs: Attributes {
                id,
                bits: material.len() as u32 * 8,
                ..*attrs
            },
            material: stored,
        });
        trace!("client {} imported key {}", client_id, id);
        Ok(id)
    }

    fn destroy(&self, client_id: u32, id: u32) -> crate::Result<(), Error> {
        let mut keys = self.keys.borrow_mut();
        let idx = keys
            .iter()
            .position(|k| k.owner == client_id && k.attrs.id == id)
            .ok_or_else(|| fail!(Error::InvalidHandle))?;
        let mut entry = keys.swap_remove(idx);
        for b in entry.material.iter_mut() {
            *b = 0;
        }
        Ok(())
    }

    fn attributes(
        &self,
        client_id: u32,
        id: u32,
    ) -> crate::Result<Attributes, Error> {
        self.keys
            .borrow()
            .iter()
            .find(|k| k.owner == client_id && k.attrs.id == id)
            .map(|k| k.attrs)
            .ok_or_else(|| fail!(Error::InvalidHandle))
    }

    fn material(
        &self,
        client_id: u32,
        id: u32,
        usage: Usage,
        alg: Option<u32>,
        out: &mut [u8],
    ) -> crate::Result<usize, Error> {
        let keys = self.keys.borrow();
        let key = keys
            .iter()
            .find(|k| k.owner == client_id && k.attrs.id == id)
            .ok_or_else(|| fail!(Error::InvalidHandle))?;
        key.attrs.permits(usage, alg)?;

        let len = key.material.len();
        check!(out.len() >= len, Error::BufferTooSmall);
        out[..len].copy_from_slice(&key.material);
        Ok(len)
    }
}

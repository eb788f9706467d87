// Copyright (C) 2021 Andreas Doerr
// SPDX-License-Identifier: Apache-2.0

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// 	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Tile storage: a provider-agnostic, optimistic-concurrency tile store.

use log::{debug, trace};

use crate::{
    error::{Error, Result},
    tile::{Tile, TileConfig},
    Vec,
};

/// An opaque token returned with every tile read and required to replace it.
/// The provider rejects a `replace_tile` whose version has gone stale.
pub type Version = u64;

/// The storage provider wire contract a `TileStore` is written against.
///
/// A provider is expected to offer compare-and-swap semantics keyed on
/// `(id, version)`; the crate ships [`MemoryProvider`] as an in-process
/// reference implementation for tests, doctests and examples.
pub trait StorageProvider {
    fn read_tile(&self, id: u64) -> Result<(Vec<u8>, Version)>;
    fn read_head(&self) -> Result<(Vec<u8>, Version)>;
    fn create_tile(&self, id: u64, bytes: &[u8]) -> Result<()>;
    fn replace_tile(&self, id: u64, version: Version, bytes: &[u8]) -> Result<()>;
}

/// Maps tile identifiers to persisted byte images via a [`StorageProvider`],
/// enforcing create-once and optimistic-version replace semantics.
pub struct TileStore<P> {
    cfg: TileConfig,
    provider: P,
}

impl<P: StorageProvider> TileStore<P> {
    pub fn new(cfg: TileConfig, provider: P) -> Self {
        TileStore { cfg, provider }
    }

    /// The current head tile and its version, or a fresh empty tile 0 with
    /// no version if the store has never been written to.
    pub fn head(&self) -> Result<(Tile, Option<Version>)> {
        match self.provider.read_head() {
            Ok((bytes, version)) => {
                trace!("loaded head tile ({} bytes)", bytes.len());
                Ok((Tile::load(self.cfg, &bytes)?, Some(version)))
            }
            Err(Error::Empty) => {
                debug!("store is empty, starting from tile 0");
                Ok((Tile::new(self.cfg), None))
            }
            Err(e) => Err(e),
        }
    }

    /// The tile with the given id and its version.
    pub fn get(&self, id: u64) -> Result<(Tile, Version)> {
        let (bytes, version) = self.provider.read_tile(id)?;
        trace!("loaded tile {} ({} bytes)", id, bytes.len());
        Ok((Tile::load(self.cfg, &bytes)?, version))
    }

    /// A pure in-memory successor tile; no I/O.
    pub fn create(&self, parent: &Tile) -> Tile {
        Tile::create(self.cfg, parent)
    }

    /// Persist `tile`. A no-op if the tile has no nodes. `version` must be
    /// `Some` for every tile except a never-before-persisted one.
    pub fn commit(&self, tile: &Tile, version: Option<Version>) -> Result<()> {
        if tile.is_empty() {
            return Ok(());
        }

        let bytes = tile.persisted_bytes();

        match version {
            None => {
                debug!("creating tile {} ({} bytes)", tile.id(), bytes.len());
                self.provider.create_tile(tile.id(), bytes)
            }
            Some(v) => {
                debug!(
                    "replacing tile {} at version {} ({} bytes)",
                    tile.id(),
                    v,
                    bytes.len()
                );
                self.provider.replace_tile(tile.id(), v, bytes)
            }
        }
    }
}

/// An in-process [`StorageProvider`] backed by a map, guarded by a mutex so
/// multiple writers can be exercised in tests. Not a production backend: the
/// core treats the actual persistence layer as an external collaborator.
#[cfg(feature = "std")]
pub mod memory {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    use super::{Error, Result, StorageProvider, Version};
    use crate::Vec;

    #[derive(Default)]
    struct Inner {
        tiles: HashMap<u64, (Vec<u8>, Version)>,
        head_id: Option<u64>,
    }

    /// In-memory [`StorageProvider`] reference implementation. Cheaply
    /// cloneable: clones share the same underlying map, so a provider can be
    /// handed to more than one `TileStore`/`TileLog`.
    #[derive(Default, Clone)]
    pub struct MemoryProvider {
        inner: Arc<Mutex<Inner>>,
    }

    impl StorageProvider for MemoryProvider {
        fn read_tile(&self, id: u64) -> Result<(Vec<u8>, Version)> {
            let inner = self.inner.lock().unwrap();
            inner.tiles.get(&id).cloned().ok_or(Error::NotFound(id))
        }

        fn read_head(&self) -> Result<(Vec<u8>, Version)> {
            let inner = self.inner.lock().unwrap();
            match inner.head_id {
                Some(id) => inner.tiles.get(&id).cloned().ok_or(Error::NotFound(id)),
                None => Err(Error::Empty),
            }
        }

        fn create_tile(&self, id: u64, bytes: &[u8]) -> Result<()> {
            let mut inner = self.inner.lock().unwrap();
            if inner.tiles.contains_key(&id) {
                return Err(Error::Exists(id));
            }
            inner.tiles.insert(id, (bytes.to_vec(), 0));
            if inner.head_id.map_or(true, |h| id >= h) {
                inner.head_id = Some(id);
            }
            Ok(())
        }

        fn replace_tile(&self, id: u64, version: Version, bytes: &[u8]) -> Result<()> {
            let mut inner = self.inner.lock().unwrap();
            match inner.tiles.get(&id) {
                Some((_, v)) if *v == version => {
                    inner.tiles.insert(id, (bytes.to_vec(), version + 1));
                    Ok(())
                }
                Some(_) => Err(Error::Changed(id)),
                None => Err(Error::NotFound(id)),
            }
        }
    }
}

#[cfg(feature = "std")]
pub use memory::MemoryProvider;

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

//! Tile: a fixed-height, byte-addressable slice of the MMR node array.

use core::convert::TryInto;

use crate::{hash::Hash, index, BTreeMap, Error, Hasher, Result, Vec};

/// Upper bound on the number of peaks a `2^64`-bounded MMR can carry; also
/// the number of ancestor-peak slots reserved in every tile's header region.
const PEAK_SLOTS: u64 = 64;

/// Field width in bytes. Pinned to the hash output width.
pub const FIELD_WIDTH: usize = Hash::LEN;

const HEADER_LEN: usize = FIELD_WIDTH;
const PEAKS_LEN: usize = PEAK_SLOTS as usize * FIELD_WIDTH;
const NODES_START: usize = HEADER_LEN + PEAKS_LEN;

/// Configuration shared by a `Tile`, `TileStore` and `TileLog`.
///
/// `tile_height` is the only knob: leaves per tile is `1 << tile_height`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TileConfig {
    pub tile_height: u32,
}

impl TileConfig {
    pub fn new(tile_height: u32) -> Self {
        TileConfig { tile_height }
    }

    fn leaves_per_tile(&self) -> u64 {
        1u64 << self.tile_height
    }

    fn first_index(&self, id: u64) -> u64 {
        index::mmr_index(id * self.leaves_per_tile())
    }

    /// Index of the last node this tile ever writes: not just its last
    /// leaf, but the final peak the climb from that leaf cascades up to
    /// (which, past the first tile, reaches back into prior tiles' peaks
    /// and so can run higher than a single `2^tile_height`-leaf subtree).
    fn last_leaf_mmr_index(&self, id: u64) -> u64 {
        index::complete_mmr(index::mmr_index((id + 1) * self.leaves_per_tile() - 1))
    }
}

/// A two-method capability used both by the standalone leaf-append algorithm
/// and by `Tile` itself while climbing to close out interior nodes.
pub trait Adder {
    fn append(&mut self, node: Hash) -> Result<u64>;
    fn get(&self, i: u64) -> Result<Hash>;
}

/// Append `leaf` (already the leaf's node hash) to `a`, closing out any
/// interior nodes this append completes. Returns the index of the next free
/// slot. Shared by `Tile::append_leaf` and any other `Adder` (e.g. a
/// standalone in-memory buffer).
pub fn add_leaf_hash<A, H>(a: &mut A, h: &H, leaf: Hash) -> Result<u64>
where
    A: Adder,
    H: Hasher,
{
    let mut g = 0u64;
    let mut i = a.append(leaf)?;

    while index::index_height(i) > g {
        let left = a.get(i - (2 << g))?;
        let right = a.get(i - 1)?;
        let parent = h.parent_hash(i + 1, &left, &right);
        i = a.append(parent)?;
        g += 1;
    }

    Ok(i)
}

/// A fixed-height contiguous slice of the MMR node array, carrying the
/// ancestor peaks needed to self-contain proofs for any of its own nodes.
pub struct Tile {
    cfg: TileConfig,
    id: u64,
    first_index: u64,
    last_leaf_mmr_index: u64,
    next_index: u64,
    data: Vec<u8>,
    ancestor_peaks: BTreeMap<u64, Hash>,
}

impl Tile {
    /// The empty, first tile (`id = 0`) for `cfg`.
    pub fn new(cfg: TileConfig) -> Self {
        Self::empty(cfg, 0, BTreeMap::new())
    }

    /// An empty tile succeeding `parent`, seeded with `parent`'s peak stack.
    pub fn create(cfg: TileConfig, parent: &Tile) -> Self {
        let id = parent.id + 1;
        let mut tile = Self::empty(cfg, id, BTreeMap::new());

        let stack = parent.next_peak_stack();
        tile.data[HEADER_LEN..HEADER_LEN + stack.len()].copy_from_slice(&stack);
        tile.ancestor_peaks = tile.read_ancestor_peaks_map();

        tile
    }

    fn empty(cfg: TileConfig, id: u64, ancestor_peaks: BTreeMap<u64, Hash>) -> Self {
        let first_index = cfg.first_index(id);
        let last_leaf_mmr_index = cfg.last_leaf_mmr_index(id);
        let capacity_nodes = (last_leaf_mmr_index - first_index + 1) as usize;

        let mut data = crate::vec![0u8; NODES_START + capacity_nodes * FIELD_WIDTH];
        data[FIELD_WIDTH - 16..FIELD_WIDTH - 8].copy_from_slice(&(cfg.tile_height as u64).to_be_bytes());
        data[FIELD_WIDTH - 8..FIELD_WIDTH].copy_from_slice(&id.to_be_bytes());

        Tile {
            cfg,
            id,
            first_index,
            last_leaf_mmr_index,
            next_index: first_index,
            data,
            ancestor_peaks,
        }
    }

    /// Parse a persisted (cropped) byte image into a fully-allocated tile.
    pub fn load(cfg: TileConfig, persisted: &[u8]) -> Result<Tile> {
        if persisted.len() < NODES_START {
            return Err(Error::Malformed("tile image shorter than header + peak region".into()));
        }

        let got_height = u64::from_be_bytes(
            persisted[FIELD_WIDTH - 16..FIELD_WIDTH - 8]
                .try_into()
                .map_err(|_| Error::Malformed("bad header".into()))?,
        );

        if got_height != cfg.tile_height as u64 {
            return Err(Error::TileHeightMismatch {
                want: cfg.tile_height,
                got: got_height,
            });
        }

        let id = u64::from_be_bytes(
            persisted[FIELD_WIDTH - 8..FIELD_WIDTH]
                .try_into()
                .map_err(|_| Error::Malformed("bad header".into()))?,
        );

        let present_nodes = (persisted.len() - NODES_START) / FIELD_WIDTH;
        let mut tile = Self::empty(cfg, id, BTreeMap::new());

        tile.data[..HEADER_LEN + PEAKS_LEN].copy_from_slice(&persisted[..HEADER_LEN + PEAKS_LEN]);
        tile.data[NODES_START..NODES_START + present_nodes * FIELD_WIDTH]
            .copy_from_slice(&persisted[NODES_START..NODES_START + present_nodes * FIELD_WIDTH]);
        tile.next_index = tile.first_index + present_nodes as u64;
        tile.ancestor_peaks = tile.read_ancestor_peaks_map();

        Ok(tile)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn first_index(&self) -> u64 {
        self.first_index
    }

    pub fn last_leaf_mmr_index(&self) -> u64 {
        self.last_leaf_mmr_index
    }

    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    pub fn is_empty(&self) -> bool {
        self.next_index == self.first_index
    }

    /// Append a leaf hash, closing out any interior nodes it completes.
    pub fn append_leaf<H: Hasher>(&mut self, leaf: Hash, h: &H) -> Result<u64> {
        if self.next_index > self.last_leaf_mmr_index {
            return Err(Error::TileFull);
        }

        add_leaf_hash(self, h, leaf)
    }

    fn node_slot(&self, i: u64) -> usize {
        NODES_START + (i - self.first_index) as usize * FIELD_WIDTH
    }

    /// Bytes actually in use: zero for an empty tile, else header + peaks +
    /// the nodes written so far.
    pub fn used_bytes(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            NODES_START + (self.next_index - self.first_index) as usize * FIELD_WIDTH
        }
    }

    /// The persisted byte image: `data` cropped to `used_bytes()`.
    pub fn persisted_bytes(&self) -> &[u8] {
        &self.data[..self.used_bytes()]
    }

    /// Seed bytes for a successor tile's peak region, per §4.2.
    pub fn next_peak_stack(&self) -> Vec<u8> {
        let carried = self.id.count_ones() as u64;
        let discard = (self.id + 1).trailing_zeros() as u64;
        let keep = carried.saturating_sub(discard) as usize;

        let mut out = Vec::with_capacity((keep + 1) * FIELD_WIDTH);
        out.extend_from_slice(&self.data[HEADER_LEN..HEADER_LEN + keep * FIELD_WIDTH]);

        let last = &self.data[self.node_slot(self.next_index - 1)..self.node_slot(self.next_index - 1) + FIELD_WIDTH];
        out.extend_from_slice(last);

        out
    }

    /// Derive the ancestor-peak map from the header/peak slots. Empty for
    /// `id == 0`.
    fn read_ancestor_peaks_map(&self) -> BTreeMap<u64, Hash> {
        let mut map = BTreeMap::new();

        if self.id == 0 {
            return map;
        }

        let threshold = self.cfg.tile_height.saturating_sub(1) as u64;
        let qualifying = index::peaks(self.first_index - 1)
            .into_iter()
            .filter(|&p| index::index_height(p) >= threshold);

        for (rank, p) in qualifying.enumerate() {
            let start = HEADER_LEN + rank * FIELD_WIDTH;
            let bytes: [u8; FIELD_WIDTH] = self.data[start..start + FIELD_WIDTH].try_into().unwrap();
            map.insert(p, Hash::from(bytes));
        }

        map
    }
}

impl Adder for Tile {
    fn append(&mut self, node: Hash) -> Result<u64> {
        let slot = self.node_slot(self.next_index);
        self.data[slot..slot + FIELD_WIDTH].copy_from_slice(node.as_ref());
        self.next_index += 1;
        Ok(self.next_index)
    }

    fn get(&self, i: u64) -> Result<Hash> {
        if i < self.first_index {
            return self
                .ancestor_peaks
                .get(&i)
                .copied()
                .ok_or(Error::IndexOutOfRange(i));
        }

        if i >= self.next_index {
            return Err(Error::IndexOutOfRange(i));
        }

        let slot = self.node_slot(i);
        let bytes: [u8; FIELD_WIDTH] = self.data[slot..slot + FIELD_WIDTH].try_into().unwrap();
        Ok(Hash::from(bytes))
    }
}

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

//! Tile log: batch append across tile boundaries, cached node lookup, and
//! restartable node/leaf enumeration.

use log::{info, warn};

use crate::{
    error::{Error, Result},
    hash::{Hash, Hasher},
    index,
    proof::{ConsistencyProof, InclusionProof},
    store::{StorageProvider, TileStore},
    tile::{Adder, Tile, TileConfig},
    Vec,
};

/// Orchestrates appends across tile boundaries and answers node lookups,
/// biased towards the locality of proof-construction access patterns.
pub struct TileLog<P> {
    cfg: TileConfig,
    store: TileStore<P>,
    last_touched_tile: Option<Tile>,
}

impl<P: StorageProvider> TileLog<P> {
    pub fn new(cfg: TileConfig, provider: P) -> Self {
        TileLog {
            cfg,
            store: TileStore::new(cfg, provider),
            last_touched_tile: None,
        }
    }

    /// Append `leaves` to the log, spanning as many tiles as needed.
    ///
    /// All-or-nothing with respect to the currently open tile; a tile
    /// committed mid-batch is durable even if a later leaf in the same
    /// batch fails.
    pub fn append<H: Hasher>(&mut self, leaves: &[Hash], h: &H) -> Result<()> {
        let (mut tile, mut version) = self.store.head()?;

        for leaf in leaves {
            match tile.append_leaf(*leaf, h) {
                Ok(_) => {}
                Err(Error::TileFull) => {
                    self.store.commit(&tile, version)?;
                    info!("tile {} closed, opening tile {}", tile.id(), tile.id() + 1);

                    let mut next = self.store.create(&tile);
                    version = None;

                    if let Err(Error::TileFull) = next.append_leaf(*leaf, h) {
                        return Err(Error::InvariantViolated(
                            "freshly created tile reported TileFull".into(),
                        ));
                    }

                    tile = next;
                }
                Err(e) => return Err(e),
            }
        }

        match self.store.commit(&tile, version) {
            Err(Error::Changed(id)) => {
                warn!("commit of tile {} rejected, version changed", id);
                Err(Error::Changed(id))
            }
            other => other,
        }?;

        self.last_touched_tile = Some(tile);
        Ok(())
    }

    /// The node hash at `i`, using and refreshing the last-touched-tile
    /// cache.
    pub fn get(&mut self, i: u64) -> Result<Hash> {
        if let Some(tile) = &self.last_touched_tile {
            if let Ok(h) = tile.get(i) {
                return Ok(h);
            }
        }

        let tid = (index::leaf_count(i) - 1) / self.cfg_leaves_per_tile();
        let (tile, _version) = self.store.get(tid)?;
        let result = tile.get(i);
        self.last_touched_tile = Some(tile);
        result
    }

    fn cfg_leaves_per_tile(&self) -> u64 {
        1u64 << self.cfg.tile_height
    }

    /// Ascending sequence of node hashes in `[first, last]`, read purely
    /// from the store (bypasses the last-touched cache). Finite; recreate to
    /// restart.
    pub fn enumerate_nodes(&self, first: u64, last: u64) -> Result<Vec<Hash>> {
        let leaves_per_tile = self.cfg_leaves_per_tile();
        let start_id = (index::leaf_count(first) - 1) / leaves_per_tile;
        let end_id = (index::leaf_count(last) - 1) / leaves_per_tile;

        let mut out = Vec::new();
        for id in start_id..=end_id {
            let (tile, _) = self.store.get(id)?;
            let lo = first.max(tile.first_index());
            let hi = last.min(tile.next_index().saturating_sub(1));
            for i in lo..=hi {
                out.push(tile.get(i)?);
            }
        }

        Ok(out)
    }

    /// Ascending sequence of leaf hashes for leaves `[first_leaf, last_leaf]`.
    pub fn enumerate_leaves(&self, first_leaf: u64, last_leaf: u64) -> Result<Vec<Hash>> {
        let mut out = Vec::with_capacity((last_leaf - first_leaf + 1) as usize);
        for e in first_leaf..=last_leaf {
            out.push(self.enumerate_nodes(index::mmr_index(e), index::mmr_index(e))?[0]);
        }
        Ok(out)
    }

    /// Build an inclusion proof for node `i` against the complete MMR `c`.
    pub fn inclusion_proof(&mut self, i: u64, c: u64) -> Result<InclusionProof> {
        let path = index::inclusion_proof_path(i, c)
            .iter()
            .map(|&s| self.get(s))
            .collect::<Result<Vec<_>>>()?;

        Ok(InclusionProof { i, path })
    }

    /// Build a consistency proof between the complete MMRs `from` and `to`.
    pub fn consistency_proof(&mut self, from: u64, to: u64) -> Result<ConsistencyProof> {
        let paths = index::consistency_proof_paths(from, to)
            .into_iter()
            .map(|path| path.iter().map(|&s| self.get(s)).collect::<Result<Vec<_>>>())
            .collect::<Result<Vec<_>>>()?;

        Ok(ConsistencyProof { from, to, paths })
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::{hash::Sha256Hasher, store::MemoryProvider};

    fn leaves(h: &Sha256Hasher, n: u64) -> Vec<Hash> {
        (0..n).map(|i| h.leaf_hash(&i.to_be_bytes())).collect()
    }

    #[test]
    fn append_spans_tile_boundaries() {
        let h = Sha256Hasher;
        let cfg = TileConfig::new(1); // 2 leaves per tile
        let mut log = TileLog::new(cfg, MemoryProvider::default());

        log.append(&leaves(&h, 5), &h).unwrap();

        // 5 leaves across tile_height=1 (2 leaves/tile) span 3 tiles (2,2,1)
        assert!(log.get(index::mmr_index(4)).is_ok());
    }

    #[test]
    fn get_after_batch_matches_one_at_a_time() {
        let h = Sha256Hasher;
        let cfg = TileConfig::new(1);

        let mut batch = TileLog::new(cfg, MemoryProvider::default());
        batch.append(&leaves(&h, 5), &h).unwrap();

        let mut stepwise = TileLog::new(cfg, MemoryProvider::default());
        for l in leaves(&h, 5) {
            stepwise.append(&[l], &h).unwrap();
        }

        for e in 0..5 {
            let i = index::mmr_index(e);
            assert_eq!(batch.get(i).unwrap(), stepwise.get(i).unwrap());
        }
    }

    #[test]
    fn enumerate_leaves_matches_appended_order() {
        let h = Sha256Hasher;
        let cfg = TileConfig::new(1);
        let mut log = TileLog::new(cfg, MemoryProvider::default());
        let ls = leaves(&h, 5);
        log.append(&ls, &h).unwrap();

        let enumerated = log.enumerate_leaves(0, 4).unwrap();
        assert_eq!(enumerated, ls);
    }

    #[test]
    fn inclusion_proof_replays_to_one_of_the_peaks() {
        use crate::proof::included_root;

        let h = Sha256Hasher;
        let cfg = TileConfig::new(3); // 8 leaves per tile, single tile for this test
        let mut log = TileLog::new(cfg, MemoryProvider::default());
        let ls = leaves(&h, 7);
        log.append(&ls, &h).unwrap();

        let c = index::complete_mmr(index::mmr_index(6));
        let leaf_idx = index::mmr_index(3);
        let proof = log.inclusion_proof(leaf_idx, c).unwrap();

        let root = included_root(&h, leaf_idx, log.get(leaf_idx).unwrap(), &proof.path).unwrap();
        let peak_values: Vec<_> = index::peaks(c).iter().map(|&p| log.get(p).unwrap()).collect();

        assert!(peak_values.contains(&root));
    }

    #[test]
    fn consistency_proof_reproduces_the_new_peaks() {
        use crate::proof::consistent_roots;

        let h = Sha256Hasher;
        let cfg = TileConfig::new(1); // 2 leaves per tile
        let mut log = TileLog::new(cfg, MemoryProvider::default());

        let all = leaves(&h, 13);
        log.append(&all[..8], &h).unwrap();
        let from = index::complete_mmr(index::mmr_index(7));
        log.append(&all[8..], &h).unwrap();
        let to = index::complete_mmr(index::mmr_index(12));

        let acc_from: Vec<_> = index::peaks(from).iter().map(|&p| log.get(p).unwrap()).collect();
        let proof = log.consistency_proof(from, to).unwrap();

        let got = consistent_roots(&h, from, &acc_from, &proof.paths).unwrap();
        let to_peak_values: Vec<_> = index::peaks(to).iter().map(|&p| log.get(p).unwrap()).collect();

        // `got` is a descending-height prefix of MMR(to)'s peaks.
        assert_eq!(got, to_peak_values[..got.len()]);
    }

    #[test]
    fn inclusion_proof_crosses_a_tile_boundary_via_ancestor_peaks() {
        use crate::proof::included_root;

        let h = Sha256Hasher;
        let cfg = TileConfig::new(1); // 2 leaves per tile
        let mut log = TileLog::new(cfg, MemoryProvider::default());
        log.append(&leaves(&h, 4), &h).unwrap();

        // Leaf 2 lives in the second tile; its proof's sibling at node 2 is
        // the first tile's peak, resolvable only through the second tile's
        // ancestor-peak map (node 2 predates the second tile's own range).
        let leaf_idx = index::mmr_index(2);
        let c = index::complete_mmr(index::mmr_index(3));
        let proof = log.inclusion_proof(leaf_idx, c).unwrap();
        assert_eq!(
            index::inclusion_proof_path(leaf_idx, c),
            vec![index::mmr_index(3), 2],
            "leaf 2's path should climb through its local sibling then the prior tile's peak"
        );
        assert_eq!(proof.path.len(), 2);

        let value = log.get(leaf_idx).unwrap();
        let root = included_root(&h, leaf_idx, value, &proof.path).unwrap();
        let peak_values: Vec<_> = index::peaks(c).iter().map(|&p| log.get(p).unwrap()).collect();

        assert!(peak_values.contains(&root));
    }
}

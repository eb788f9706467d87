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

//! Structural index-algebra fixtures for a 39-node, 21-leaf MMR.

use tessera::{
    index::{complete_mmr, index_height, mmr_index, peaks},
    Hash, Hasher, MemoryProvider, Sha256Hasher, TileConfig, TileLog,
};

const HEIGHTS: [u64; 39] = [
    0, 0, 1, 0, 0, 1, 2, 0, 0, 1, 0, 0, 1, 2, 3, 0, 0, 1, 0, 0, 1, 2, 0, 0, 1, 0, 0, 1, 2, 3, 4, 0,
    0, 1, 0, 0, 1, 2, 0,
];

#[test]
fn heights_of_first_39_nodes() {
    for (i, &want) in HEIGHTS.iter().enumerate() {
        assert_eq!(index_height(i as u64), want, "index_height({})", i);
    }
}

#[test]
fn peaks_at_three_checkpoints() {
    assert_eq!(peaks(10), vec![6, 9, 10]);
    assert_eq!(peaks(25), vec![14, 21, 24, 25]);
    assert_eq!(peaks(38), vec![30, 37, 38]);
}

#[test]
fn leaf_to_node_mapping_and_completeness() {
    assert_eq!(mmr_index(20), 38);
    assert_eq!(complete_mmr(1), 2);
    assert_eq!(complete_mmr(11), 14);
}

/// Regression fixture for the 21-leaf, 39-node tree: under this crate's own
/// `leaf_hash(be64(e))` / `add_leaf_hash` / `parent_hash(i + 1, left, right)`
/// conventions, node 2 (the parent of leaves 0 and 1) has one fixed value.
/// Pinning it catches any accidental change to the climbing or hashing
/// convention that the index algebra above is silent on.
#[test]
fn node_two_of_the_21_leaf_tree_matches_the_known_hash() {
    let h = Sha256Hasher;
    let cfg = TileConfig::new(5); // 32 leaves per tile, one tile covers all 21
    let mut log = TileLog::new(cfg, MemoryProvider::default());

    let leaves: Vec<_> = (0..21u64).map(|e| h.leaf_hash(&e.to_be_bytes())).collect();
    log.append(&leaves, &h).unwrap();

    assert_eq!(mmr_index(20), 38, "21 leaves occupy nodes 0..=38");

    let node2 = log.get(2).unwrap();
    let want = Hash::from_hex("ad104051c516812ea5874ca3ff06d0258303623d04307c41ec80a7a18b332ef8")
        .unwrap();
    assert_eq!(node2, want);
}

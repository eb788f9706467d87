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

//! Inclusion and consistency proof machinery: build proof paths, replay
//! them to roots, and derive consistency between two accumulators.

use codec::{Decode, Encode};

use crate::{error::Error, hash::Hash, index, Hasher, Result, Vec};

/// An inclusion proof for node `i`: the sibling hashes, in climbing order,
/// needed to replay `i`'s value up to the peak covering it.
#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct InclusionProof {
    pub i: u64,
    pub path: Vec<Hash>,
}

/// A consistency proof between `MMR(from)` and `MMR(to)`: one inclusion
/// path per peak of `MMR(from)`.
#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct ConsistencyProof {
    pub from: u64,
    pub to: u64,
    pub paths: Vec<Vec<Hash>>,
}

/// Replay `proof` against `value` (the hash already known to sit at node
/// `i`) to reconstruct the peak of `MMR(c)` covering `i`, for whichever `c`
/// the proof was built against. Works for interior nodes, not just leaves:
/// this is what makes inclusion proofs composable into consistency proofs.
pub fn included_root<H: Hasher>(h: &H, i: u64, value: Hash, proof: &[Hash]) -> Result<Hash> {
    let mut root = value;
    let mut idx = i;
    let mut g = index::index_height(i);

    for sibling in proof {
        let offset = 1u64 << (g + 1);

        if index::index_height(idx + 1) > g {
            // idx is a right child: sibling (left) precedes it, root (right) follows.
            root = h.parent_hash(idx + 2, sibling, &root);
            idx += 1;
        } else {
            // idx is a left child: root (left) precedes, sibling (right) follows.
            root = h.parent_hash(idx + offset + 1, &root, sibling);
            idx += offset;
        }

        g += 1;
    }

    Ok(root)
}

/// One `included_root` per peak of `MMR(from)`, deduplicating adjacent
/// equal outputs (several old peaks may hash together under one new peak).
/// The result is a descending-height prefix of `peaks_values(to)`.
pub fn consistent_roots<H: Hasher>(
    h: &H,
    from: u64,
    acc_from: &[Hash],
    proofs: &[Vec<Hash>],
) -> Result<Vec<Hash>> {
    let peak_idxs = index::peaks(from);

    if peak_idxs.len() != acc_from.len() || peak_idxs.len() != proofs.len() {
        return Err(Error::InvalidProof(
            "peak count does not match proof or accumulator count".into(),
        ));
    }

    let mut roots: Vec<Hash> = Vec::new();

    for ((&p, &value), path) in peak_idxs.iter().zip(acc_from.iter()).zip(proofs.iter()) {
        let root = included_root(h, p, value, path)?;
        if roots.last() != Some(&root) {
            roots.push(root);
        }
    }

    Ok(roots)
}

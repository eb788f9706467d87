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

//! Pure index algebra over the MMR's 0-based node index space.
//!
//! None of these functions touch a store or a hash; they are total
//! functions of `u64` inputs and are the load-bearing arithmetic that tile
//! geometry, proof paths and the log's tile lookup are all built on.

use crate::{vec, Vec};

/// Bit length of `x`, i.e. `floor(log2(x)) + 1` for `x > 0`, `0` for `x == 0`.
fn bit_length(x: u64) -> u32 {
    64 - x.leading_zeros()
}

/// Height of node `i` (0-based) in the postorder MMR traversal.
///
/// Leaves have height 0; the root of a perfect subtree of `2^k` leaves has
/// height `k`.
pub fn index_height(i: u64) -> u64 {
    let mut pos = i + 1;

    while pos.count_ones() != bit_length(pos) {
        let msb = 1u64 << (bit_length(pos) - 1);
        pos -= msb - 1;
    }

    (bit_length(pos) - 1) as u64
}

/// Descending-height-ordered node indices of the peaks of `MMR(i)`.
pub fn peaks(i: u64) -> Vec<u64> {
    let mut s = i + 1;
    let mut cumulative = 0u64;
    let mut out = Vec::new();

    while s > 0 {
        let bits = bit_length(s + 1) - 1;
        let prefix = (1u64 << bits) - 1;
        cumulative += prefix;
        out.push(cumulative - 1);
        s -= prefix;
    }

    out
}

/// Number of leaves in `MMR(i)`.
pub fn leaf_count(i: u64) -> u64 {
    let mut s = i + 1;
    let mut n = 0u64;

    while s > 0 {
        let bits = bit_length(s + 1) - 1;
        let prefix = (1u64 << bits) - 1;
        n += 1u64 << (bits - 1);
        s -= prefix;
    }

    n
}

/// Node index of leaf `e` (0-based leaf index to 0-based node index).
pub fn mmr_index(e: u64) -> u64 {
    let mut sum = 0u64;
    let mut rem = e;

    while rem > 0 {
        let p = 63 - rem.leading_zeros();
        let h = p + 1;
        sum += (1u64 << h) - 1;
        rem -= 1u64 << p;
    }

    sum
}

/// Smallest `c >= i` such that `index_height(c + 1) <= index_height(c)`.
pub fn complete_mmr(i: u64) -> u64 {
    let mut c = i;

    while index_height(c + 1) > index_height(c) {
        c += 1;
    }

    c
}

/// Sibling node indices, in climbing order, needed to replay node `i` up to
/// the peak of `MMR(c)` that covers it.
pub fn inclusion_proof_path(i: u64, c: u64) -> Vec<u64> {
    let mut path = Vec::new();
    let mut g = index_height(i);
    let mut idx = i;

    loop {
        let offset = 1u64 << (g + 1);
        let sibling;

        if index_height(idx + 1) > g {
            // idx is a right child; its sibling (the left subtree) precedes it.
            sibling = idx - offset + 1;
            idx += 1;
        } else {
            // idx is a left child; its sibling (the right subtree) follows it.
            sibling = idx + offset - 1;
            idx += offset;
        }

        if sibling > c {
            break;
        }

        path.push(sibling);
        g += 1;
    }

    path
}

/// One inclusion path per peak of `MMR(from)`, each reaching into `MMR(to)`.
pub fn consistency_proof_paths(from: u64, to: u64) -> Vec<Vec<u64>> {
    peaks(from).into_iter().map(|p| inclusion_proof_path(p, to)).collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn index_height_edge_cases() {
        assert_eq!(index_height(0), 0);
    }

    #[test]
    fn index_height_kat39() {
        let want: [u64; 39] = [
            0, 0, 1, 0, 0, 1, 2, 0, 0, 1, 0, 0, 1, 2, 3, 0, 0, 1, 0, 0, 1, 2, 0, 0, 1, 0, 0, 1, 2,
            3, 4, 0, 0, 1, 0, 0, 1, 2, 0,
        ];

        for (i, &h) in want.iter().enumerate() {
            assert_eq!(index_height(i as u64), h, "index_height({})", i);
        }
    }

    #[test]
    fn peaks_edge_case() {
        assert_eq!(peaks(0), vec![0]);
    }

    #[test]
    fn peaks_kat39() {
        assert_eq!(peaks(10), vec![6, 9, 10]);
        assert_eq!(peaks(25), vec![14, 21, 24, 25]);
        assert_eq!(peaks(38), vec![30, 37, 38]);
    }

    #[test]
    fn mmr_index_edge_case() {
        assert_eq!(mmr_index(0), 0);
    }

    #[test]
    fn mmr_index_kat39() {
        assert_eq!(mmr_index(20), 38);
    }

    #[test]
    fn complete_mmr_kat39() {
        assert_eq!(complete_mmr(1), 2);
        assert_eq!(complete_mmr(11), 14);
    }

    proptest! {
        #[test]
        fn peaks_strictly_monotone_and_descending_height(i in 0u64..200) {
            let p = peaks(i);
            for w in p.windows(2) {
                prop_assert!(w[0] < w[1]);
                prop_assert!(index_height(w[0]) > index_height(w[1]));
            }
        }

        #[test]
        fn leaf_count_inverts_mmr_index(e in 0u64..500) {
            prop_assert_eq!(leaf_count(mmr_index(e)), e + 1);
        }

        #[test]
        fn complete_mmr_is_idempotent(i in 0u64..200) {
            let c = complete_mmr(i);
            prop_assert_eq!(complete_mmr(c), c);
        }
    }

    #[test]
    fn inclusion_proof_path_self_contained_within_peak() {
        for c in [10u64, 25, 38] {
            for &p in &peaks(c) {
                let path = inclusion_proof_path(p, c);
                assert!(path.is_empty(), "a peak has no siblings below {}", c);
            }
        }
    }
}

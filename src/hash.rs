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

//! Hash type and the pluggable hash capability the core is written against.

use core::{
    cmp::min,
    convert::AsRef,
    fmt::{self, Write},
};

#[cfg(not(feature = "std"))]
use alloc::string::ToString;

use codec::{Decode, Encode};

use crate::{Error, String, Vec};

macro_rules! to_hex {
    ($bytes:expr) => {{
        let mut s = String::with_capacity(64);

        for b in $bytes {
            write!(&mut s, "{:02x}", b)?
        }

        Ok(s)
    }};
}

/// A fixed-width node hash. Width is pinned to 32 bytes (§6 of the field
/// layout): it doubles as the storage `Field` width.
#[derive(Copy, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Hash([u8; 32]);

/// A hash consisting of all zeros.
pub const ZERO_HASH: Hash = Hash([0; 32]);

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const DISP_SIZE: usize = 12;

        let hex = to_hex!(&self.0)?;
        write!(f, "{}", &hex[..DISP_SIZE])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }
}

impl Hash {
    /// 32 byte hash, i.e. the field width `W`.
    pub const LEN: usize = 32;

    /// Return a hash initialized from `v`.
    ///
    /// At most, up to [`Hash::LEN`] bytes will be copied from `v`. If `v` has less
    /// than [`Hash::LEN`] bytes, the hash will be padded with 0's from left to right.
    pub fn from_vec(v: &[u8]) -> Hash {
        let mut h = [0; Hash::LEN];
        let sz = min(v.len(), Hash::LEN);
        h[..sz].copy_from_slice(&v[..sz]);
        Hash(h)
    }

    /// Return a hash initialized from string `hex`.
    ///
    /// An error is returned, if `hex` is not a well-formed hex string like `"0xcafe"`.
    pub fn from_hex(hex: &str) -> Result<Hash, Error> {
        match parse_hex(hex) {
            Ok(v) => Ok(Hash::from_vec(&v)),
            Err(s) => Err(Error::Malformed(s)),
        }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

fn parse_hex(hex: &str) -> Result<Vec<u8>, String> {
    let hex = hex.trim().trim_start_matches("0x");

    if hex.len() % 2 != 0 {
        Err(hex.to_string())
    } else {
        (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| hex.to_string()))
            .collect()
    }
}

/// The byte-in/byte-out hash capability the core is written against.
///
/// The core never chooses a concrete hash; every call site takes a `&H:
/// Hasher` and lets the caller decide. `parent_hash` implements the
/// node-positioning prefix convention shared by every parent hash in the
/// MMR (§4.1): `H(be64(parent_position) ‖ left ‖ right)`.
pub trait Hasher {
    /// Hash of the concatenation of `parts`, in order.
    fn hash(&self, parts: &[&[u8]]) -> Hash;

    /// Hash a leaf's pre-image into its leaf node hash.
    fn leaf_hash(&self, preimage: &[u8]) -> Hash {
        self.hash(&[preimage])
    }

    /// Hash a parent node from its two children, binding `parent_position`
    /// (the parent's 1-based node position, i.e. `parent_index + 1`) into
    /// the hash so that otherwise-identical sub-structures never collide.
    fn parent_hash(&self, parent_position: u64, left: &Hash, right: &Hash) -> Hash {
        self.hash(&[
            &parent_position.to_be_bytes(),
            left.as_ref(),
            right.as_ref(),
        ])
    }
}

#[cfg(feature = "sha2-hasher")]
pub use sha256::Sha256Hasher;

#[cfg(feature = "sha2-hasher")]
mod sha256 {
    use sha2::{Digest, Sha256};

    use super::{Hash, Hasher};

    /// Reference [`Hasher`] used by every KAT fixture and by the crate's own
    /// tests. Not mandated by the core; callers are free to supply their own.
    #[derive(Copy, Clone, Debug, Default)]
    pub struct Sha256Hasher;

    impl Hasher for Sha256Hasher {
        fn hash(&self, parts: &[&[u8]]) -> Hash {
            let mut h = Sha256::new();
            for p in parts {
                h.update(p);
            }
            Hash::from(<[u8; 32]>::from(h.finalize()))
        }
    }
}

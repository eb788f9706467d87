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

//! A tile-addressed Merkle Mountain Range log.
//!
//! The log is an append-only sequence of leaf hashes, accumulated into a
//! Merkle Mountain Range and physically laid out as a sequence of
//! fixed-height "tiles": contiguous, byte-addressable slices of the MMR's
//! node array, each self-contained enough to extend and to prove against
//! without touching any other tile.
//!
//! The crate is organized bottom-up:
//!
//! - [`index`] — pure index algebra over the 0-based MMR node space.
//! - [`hash`] — the [`Hasher`] capability the core is written against.
//! - [`tile`] — the [`Tile`] physical layout and append algorithm.
//! - [`store`] — [`StorageProvider`] and the optimistic-concurrency
//!   [`TileStore`] built on it.
//! - [`log`] — [`TileLog`], which orchestrates batch append and lookup
//!   across tile boundaries.
//! - [`proof`] — inclusion and consistency proof construction and replay.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
include!("std.rs");

#[cfg(not(feature = "std"))]
include!("no_std.rs");

mod error;
mod hash;
pub mod index;
mod log;
mod proof;
mod store;
mod tile;

pub use error::{Error, Result};
pub use hash::Hasher;
#[cfg(feature = "sha2-hasher")]
pub use hash::Sha256Hasher;
pub use hash::{Hash, ZERO_HASH};
pub use log::TileLog;
pub use proof::{consistent_roots, included_root, ConsistencyProof, InclusionProof};
pub use store::{StorageProvider, TileStore, Version};
#[cfg(feature = "std")]
pub use store::MemoryProvider;
pub use tile::{add_leaf_hash, Adder, Tile, TileConfig, FIELD_WIDTH};

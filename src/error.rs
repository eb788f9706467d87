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

//! Tile log errors

use core::write;

use crate::String;

/// Errors produced while appending to, reading from or proving a tile log.
///
/// `TileFull` is always caught by [`crate::log::TileLog::append`] and never
/// reaches a caller; `Empty` is always caught by
/// [`crate::store::TileStore::head`]. Every other variant propagates.
#[derive(Debug, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum Error {
    IndexOutOfRange(u64),
    TileFull,
    TileHeightMismatch { want: u32, got: u64 },
    NotFound(u64),
    Empty,
    Exists(u64),
    Changed(u64),
    InvalidProof(String),
    InvariantViolated(String),
    Malformed(String),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Error::IndexOutOfRange(i) => write!(f, "index out of range: `{}`", i)?,
            Error::TileFull => write!(f, "tile is full")?,
            Error::TileHeightMismatch { want, got } => write!(
                f,
                "tile height mismatch: configured `{}`, loaded `{}`",
                want, got
            )?,
            Error::NotFound(id) => write!(f, "tile not found: `{}`", id)?,
            Error::Empty => write!(f, "store is empty")?,
            Error::Exists(id) => write!(f, "tile already exists: `{}`", id)?,
            Error::Changed(id) => write!(f, "tile version changed: `{}`", id)?,
            Error::InvalidProof(msg) => write!(f, "invalid proof: `{}`", msg)?,
            Error::InvariantViolated(msg) => write!(f, "invariant violated: `{}`", msg)?,
            Error::Malformed(msg) => write!(f, "malformed tile image: `{}`", msg)?,
        }

        Ok(())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

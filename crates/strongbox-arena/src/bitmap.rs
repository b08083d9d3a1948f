// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Flat bitmap over the implicit block tree.
//!
//! Node `1` is the whole arena; the children of node `n` are `2n` and
//! `2n + 1`. Index `0` is never used. Storage lives on the ordinary heap:
//! the bitmap describes block layout, never block contents.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::error::ArenaError;

pub(crate) struct Bitmap {
    bytes: Box<[u8]>,
}

impl Bitmap {
    /// Creates a cleared bitmap holding `bits` bits (a multiple of 8).
    ///
    /// Large arenas need megabytes of bitmap; running out of heap is an
    /// error, not an abort.
    pub fn new(bits: usize) -> Result<Self, ArenaError> {
        let len = bits >> 3;
        let mut bytes = Vec::new();

        bytes
            .try_reserve_exact(len)
            .map_err(|_| ArenaError::Bookkeeping { bytes: len })?;
        bytes.resize(len, 0u8);

        Ok(Self {
            bytes: bytes.into_boxed_slice(),
        })
    }

    /// Number of addressable bits.
    pub fn len(&self) -> usize {
        self.bytes.len() << 3
    }

    #[inline(always)]
    pub fn test(&self, bit: usize) -> bool {
        self.bytes[bit >> 3] & (1 << (bit & 7)) != 0
    }

    #[inline(always)]
    pub fn set(&mut self, bit: usize) {
        self.bytes[bit >> 3] |= 1 << (bit & 7);
    }

    #[inline(always)]
    pub fn clear(&mut self, bit: usize) {
        self.bytes[bit >> 3] &= !(1 << (bit & 7));
    }

    /// Number of set bits.
    #[cfg(test)]
    pub fn count_ones(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }
}

impl core::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Bitmap")
            .field("bits", &self.len())
            .finish_non_exhaustive()
    }
}

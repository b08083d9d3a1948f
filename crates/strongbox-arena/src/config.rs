// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Arena configuration and derived geometry.

use crate::error::ArenaError;
use crate::freelist::LINK_SIZE;

/// Caller-chosen arena dimensions.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ArenaConfig {
    /// Total arena size in bytes. Must be a power of two.
    pub size: usize,
    /// Smallest block handed out. Must be a power of two; rounded up to
    /// [`LINK_SIZE`].
    pub min_size: usize,
}

impl ArenaConfig {
    /// Arena size used by [`Default`].
    pub const DEFAULT_SIZE: usize = 64 * 1024;
    /// Minimum block size used by [`Default`].
    pub const DEFAULT_MIN_SIZE: usize = 32;

    /// Creates a configuration. Validation is deferred to arena creation.
    pub const fn new(size: usize, min_size: usize) -> Self {
        Self { size, min_size }
    }

    pub(crate) fn geometry(&self) -> Result<Geometry, ArenaError> {
        if !self.size.is_power_of_two() {
            return Err(ArenaError::InvalidSize(self.size));
        }

        if !self.min_size.is_power_of_two() {
            return Err(ArenaError::InvalidMinSize(self.min_size));
        }

        let min_size = self.min_size.max(LINK_SIZE);
        let bit_count = (self.size / min_size) * 2;

        // Bitmaps are byte-granular.
        if bit_count < 8 {
            return Err(ArenaError::TooSmall {
                size: self.size,
                min_size,
            });
        }

        Ok(Geometry {
            size: self.size,
            min_size,
            bit_count,
            list_count: bit_count.trailing_zeros() as usize,
        })
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIZE, Self::DEFAULT_MIN_SIZE)
    }
}

/// Validated dimensions of an arena.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct Geometry {
    pub size: usize,
    pub min_size: usize,
    /// Nodes in the implicit block tree, including the unused index 0.
    pub bit_count: usize,
    /// Size classes, from the whole arena (0) to `min_size`.
    pub list_count: usize,
}

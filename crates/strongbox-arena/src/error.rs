// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Error types for strongbox-arena.

use thiserror::Error;

/// Errors from the page syscalls backing the arena.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
#[repr(u8)]
pub enum RegionError {
    /// The region could not be mapped.
    #[error("mmap failed")]
    Map = 0,

    /// A guard page could not be made inaccessible.
    #[error("mprotect(PROT_NONE) failed")]
    Protect = 1,

    /// The arena could not be pinned in RAM.
    #[error("mlock failed")]
    Lock = 2,

    /// The arena could not be excluded from core dumps.
    #[error("madvise(MADV_DONTDUMP) failed")]
    Madvise = 3,

    /// Page residency could not be queried.
    #[error("mincore failed")]
    Mincore = 4,
}

/// Errors that prevent an arena from being created.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum ArenaError {
    /// The arena size is zero or not a power of two.
    #[error("arena size must be a non-zero power of two, got {0}")]
    InvalidSize(usize),

    /// The minimum block size is zero or not a power of two.
    #[error("minimum block size must be a non-zero power of two, got {0}")]
    InvalidMinSize(usize),

    /// Fewer than four minimum-size blocks fit the arena.
    #[error("arena of {size} bytes is too small for blocks of {min_size} bytes")]
    TooSmall {
        /// Requested arena size.
        size: usize,
        /// Minimum block size after rounding.
        min_size: usize,
    },

    /// The heap could not hold the bitmaps or the free-list heads.
    #[error("failed to allocate {bytes} bytes of arena bookkeeping")]
    Bookkeeping {
        /// Size of the allocation that failed.
        bytes: usize,
    },

    /// The backing region could not be mapped.
    #[error("RegionError: {0}")]
    Region(#[from] RegionError),
}

/// Allocation refusals. Neither is retried.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum AllocError {
    /// The request is larger than the whole arena.
    #[error("request of {requested} bytes exceeds arena capacity of {capacity} bytes")]
    TooLarge {
        /// Requested bytes.
        requested: usize,
        /// Arena size.
        capacity: usize,
    },

    /// No free block is large enough.
    #[error("secure arena exhausted: no free block for {requested} bytes")]
    Exhausted {
        /// Requested bytes.
        requested: usize,
    },
}

/// Bookkeeping inconsistencies. Never returned: detection aborts the process.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
#[repr(u8)]
pub enum Corruption {
    /// A block was created where one already exists.
    #[error("block bit already set")]
    BlockExists = 1,

    /// A block expected to exist is missing.
    #[error("block bit missing")]
    BlockMissing = 2,

    /// Freeing a block that is not allocated, e.g. a double free.
    #[error("block is not allocated")]
    NotAllocated = 3,

    /// A free list holds an allocated block.
    #[error("allocated block found in a free list")]
    AllocatedInFreeList = 4,

    /// Pointer not aligned to the minimum block size or to its class.
    #[error("pointer is not aligned to its size class")]
    Misaligned = 5,

    /// Pointer inside a block rather than at its start.
    #[error("pointer is not the head of a block")]
    NotBlockHead = 6,

    /// Pointer or tree index outside the arena.
    #[error("address outside the arena")]
    OutOfBounds = 7,

    /// A free-list link points outside the arena or the list heads.
    #[error("free list link is broken")]
    FreeListLink = 8,

    /// More bytes freed than were counted as allocated.
    #[error("usage accounting underflow")]
    AccountingUnderflow = 9,
}

impl Corruption {
    /// Process exit code used when a corruption is reported under test.
    pub fn exit_code(self) -> i32 {
        self as i32 + 100
    }
}

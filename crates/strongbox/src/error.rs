// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Error types for strongbox.

use thiserror::Error;

use strongbox_arena::{AllocError, ArenaError};

/// Errors returned by the secure allocator.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum Error {
    /// The arena could not be created.
    #[error(transparent)]
    Arena(#[from] ArenaError),

    /// The arena refused an allocation.
    #[error(transparent)]
    Alloc(#[from] AllocError),

    /// The ordinary allocator returned null.
    #[error("fallback allocator could not provide {requested} bytes")]
    FallbackExhausted {
        /// Requested bytes.
        requested: usize,
    },

    /// Teardown refused while secure allocations are live.
    #[error("{used} bytes are still allocated from the secure arena")]
    Outstanding {
        /// Bytes still allocated, counted by class size.
        used: usize,
    },
}

// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Secure arena: a buddy allocator over one guard-bracketed, memory-locked
//! mapping.
//!
//! This crate is the leaf engine behind `strongbox`. It carves a fixed-size,
//! power-of-two arena out of a single `mmap`, brackets it with two
//! `PROT_NONE` guard pages, pins it with `mlock` and excludes it from core
//! dumps. Blocks are served by a binary buddy allocator whose bookkeeping
//! (two bitmaps and the free-list heads) lives on the ordinary heap, so the
//! mapping holds nothing but payload and the intrusive free-list links.
//!
//! The arena does no locking, accounting or cleansing. Bookkeeping
//! inconsistencies (double free, foreign pointers inside the arena, broken
//! links) abort the process.
//!
//! # Example
//!
//! ```rust
//! use strongbox_arena::{Arena, ArenaConfig};
//!
//! let mut arena = Arena::new(ArenaConfig::new(1 << 16, 16)).expect("Failed to new(..)");
//!
//! let ptr = arena.malloc(100).expect("Failed to malloc(..)");
//! assert!(arena.contains(ptr.as_ptr()));
//! assert_eq!(arena.actual_size(ptr.as_ptr()), 128);
//!
//! unsafe { arena.free(ptr) };
//! arena.done();
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

extern crate alloc;

#[cfg(test)]
mod tests;

#[cfg(any(test, feature = "test-utils"))]
pub mod support;

mod abort;
mod arena;
mod bitmap;
mod config;
mod error;
mod freelist;
mod protection;
mod region;

pub use abort::fatal;
pub use arena::Arena;
pub use config::ArenaConfig;
pub use error::{AllocError, ArenaError, Corruption, RegionError};
pub use freelist::LINK_SIZE;
pub use protection::{Hardening, Protection};
pub use region::{PageOps, SystemPages};

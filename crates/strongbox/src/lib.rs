// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Secure heap for cryptographic key material.
//!
//! Secrets allocated through this crate live in one dedicated arena that is
//! bracketed by inaccessible guard pages, pinned in RAM (no swap), excluded
//! from core dumps, and zeroized block by block on free. The arena is a buddy
//! allocator from `strongbox-arena`; this crate adds the policy around it:
//!
//! - one lock serializing every arena call,
//! - accounting of live bytes by actual block size,
//! - cleanse-on-free before a block re-enters the free pool,
//! - transparent fallback to an ordinary allocator before initialization and
//!   for pointers that are not arena-resident.
//!
//! # Handle or singleton
//!
//! [`SecureAllocator`] is a plain value and can be created per test or per
//! subsystem. [`global`] wraps a single process-wide instance.
//!
//! # Example
//!
//! ```rust
//! use strongbox::{ArenaConfig, SecureAllocator};
//!
//! let allocator = SecureAllocator::default();
//! allocator.init(ArenaConfig::new(1 << 20, 16)).expect("Failed to init(..)");
//!
//! let key = allocator.zalloc(100).expect("Failed to zalloc(..)");
//! assert!(allocator.allocated(key.as_ptr()));
//! assert_eq!(allocator.actual_size(key.as_ptr()), 128);
//! assert_eq!(allocator.used(), 128);
//!
//! unsafe { allocator.clear_free(key.as_ptr(), 100) };
//! assert_eq!(allocator.used(), 0);
//!
//! allocator.done().expect("Failed to done()");
//! ```
//!
//! # Example: SecureBuffer
//!
//! ```rust
//! use strongbox::{ArenaConfig, SecureAllocator, SecureBuffer};
//!
//! let allocator = SecureAllocator::default();
//! allocator.init(ArenaConfig::default()).expect("Failed to init(..)");
//!
//! {
//!     let mut key = SecureBuffer::new(&allocator, 32).expect("Failed to new(..)");
//!     key.open_mut(|bytes| bytes.fill(0x42));
//!     key.open(|bytes| assert!(bytes.iter().all(|b| *b == 0x42)));
//!     assert!(key.is_secure());
//! } // cleansed and returned to the arena
//!
//! assert_eq!(allocator.used(), 0);
//! ```

#![deny(missing_docs)]

#[cfg(test)]
mod tests;

mod allocator;
mod buffer;
mod error;
mod fallback;

pub mod global;

pub use allocator::SecureAllocator;
pub use buffer::SecureBuffer;
pub use error::Error;
pub use fallback::{Fallback, LibcFallback};

pub use strongbox_arena::{
    AllocError, ArenaConfig, ArenaError, Hardening, LINK_SIZE, PageOps, Protection, RegionError,
    SystemPages,
};

// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! SecureBuffer - owned secret bytes served by a [`SecureAllocator`].
//!
//! Zero-initialized on creation, released with `clear_free` on drop, so the
//! bytes are cleansed whether or not they ended up inside the arena.

use core::ptr::NonNull;

use crate::allocator::SecureAllocator;
use crate::error::Error;
use crate::fallback::{Fallback, LibcFallback};
use crate::global;

/// Fixed-length byte buffer for key material.
pub struct SecureBuffer<'a, F: Fallback = LibcFallback> {
    allocator: &'a SecureAllocator<F>,
    ptr: NonNull<u8>,
    len: usize,
}

impl<'a, F: Fallback> SecureBuffer<'a, F> {
    /// Allocates `len` zeroed bytes from `allocator`.
    pub fn new(allocator: &'a SecureAllocator<F>, len: usize) -> Result<Self, Error> {
        let ptr = allocator.zalloc(len)?;

        Ok(Self {
            allocator,
            ptr,
            len,
        })
    }

    /// Runs `f` over the buffer contents.
    pub fn open<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.len) })
    }

    /// Runs `f` over the mutable buffer contents.
    pub fn open_mut<R>(&mut self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        f(unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) })
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the buffer has zero length.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the bytes live in the secure arena rather than the fallback.
    pub fn is_secure(&self) -> bool {
        self.allocator.allocated(self.ptr.as_ptr())
    }
}

impl SecureBuffer<'static, LibcFallback> {
    /// Allocates `len` zeroed bytes from the process-wide allocator.
    pub fn global(len: usize) -> Result<Self, Error> {
        Self::new(global::allocator(), len)
    }
}

impl<F: Fallback> Drop for SecureBuffer<'_, F> {
    fn drop(&mut self) {
        unsafe { self.allocator.clear_free(self.ptr.as_ptr(), self.len) };
    }
}

// Safety: SecureBuffer uniquely owns its bytes; the allocator is Sync.
unsafe impl<F: Fallback> Send for SecureBuffer<'_, F> {}
unsafe impl<F: Fallback> Sync for SecureBuffer<'_, F> {}

impl<F: Fallback> core::fmt::Debug for SecureBuffer<'_, F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SecureBuffer")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

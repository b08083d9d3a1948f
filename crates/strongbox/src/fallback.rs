// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! The ordinary allocator used when the secure arena is not in play.

use core::ptr::NonNull;

/// Allocator that serves requests the secure arena does not.
///
/// Used before initialization and for pointers that do not belong to the
/// arena. Frees take no size, matching C-style heaps.
pub trait Fallback: Send + Sync {
    /// Allocates `len` bytes, or returns `None`.
    fn alloc(&self, len: usize) -> Option<NonNull<u8>>;

    /// Frees a pointer returned by [`Fallback::alloc`].
    ///
    /// # Safety
    /// `ptr` must come from `alloc` on this fallback and not be used again.
    unsafe fn free(&self, ptr: NonNull<u8>);
}

/// [`Fallback`] over `libc::malloc` / `libc::free`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibcFallback;

impl Fallback for LibcFallback {
    fn alloc(&self, len: usize) -> Option<NonNull<u8>> {
        // malloc(0) may legally return null.
        NonNull::new(unsafe { libc::malloc(len.max(1)) } as *mut u8)
    }

    unsafe fn free(&self, ptr: NonNull<u8>) {
        unsafe { libc::free(ptr.as_ptr() as *mut libc::c_void) };
    }
}

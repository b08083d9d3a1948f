// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Process-wide secure allocator.
//!
//! Thin free functions over one `static` [`SecureAllocator`] backed by
//! [`LibcFallback`], for call sites that cannot thread a handle through.
//! Before [`init`] and after [`done`] every call is served by the fallback.

use core::ptr::NonNull;

use strongbox_arena::{ArenaConfig, Protection};

use crate::allocator::SecureAllocator;
use crate::error::Error;
use crate::fallback::LibcFallback;

static SECURE_HEAP: SecureAllocator<LibcFallback> = SecureAllocator::new(LibcFallback);

/// The process-wide allocator.
pub fn allocator() -> &'static SecureAllocator<LibcFallback> {
    &SECURE_HEAP
}

/// See [`SecureAllocator::init`].
pub fn init(config: ArenaConfig) -> Result<Protection, Error> {
    SECURE_HEAP.init(config)
}

/// See [`SecureAllocator::initialized`].
pub fn initialized() -> bool {
    SECURE_HEAP.initialized()
}

/// See [`SecureAllocator::alloc`].
pub fn alloc(len: usize) -> Result<NonNull<u8>, Error> {
    SECURE_HEAP.alloc(len)
}

/// See [`SecureAllocator::zalloc`].
pub fn zalloc(len: usize) -> Result<NonNull<u8>, Error> {
    SECURE_HEAP.zalloc(len)
}

/// See [`SecureAllocator::free`].
///
/// # Safety
/// As for [`SecureAllocator::free`].
pub unsafe fn free(ptr: *mut u8) {
    unsafe { SECURE_HEAP.free(ptr) }
}

/// See [`SecureAllocator::clear_free`].
///
/// # Safety
/// As for [`SecureAllocator::clear_free`].
pub unsafe fn clear_free(ptr: *mut u8, len: usize) {
    unsafe { SECURE_HEAP.clear_free(ptr, len) }
}

/// See [`SecureAllocator::allocated`].
pub fn allocated(ptr: *const u8) -> bool {
    SECURE_HEAP.allocated(ptr)
}

/// See [`SecureAllocator::used`].
pub fn used() -> usize {
    SECURE_HEAP.used()
}

/// See [`SecureAllocator::actual_size`].
pub fn actual_size(ptr: *const u8) -> usize {
    SECURE_HEAP.actual_size(ptr)
}

/// See [`SecureAllocator::done`].
pub fn done() -> Result<(), Error> {
    SECURE_HEAP.done()
}

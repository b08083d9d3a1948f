// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Fallbacks that record what the allocator hands them.

use core::ptr::NonNull;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::fallback::{Fallback, LibcFallback};

/// Counts calls and remembers, per freed pointer, whether it arrived zeroed.
#[derive(Debug, Default)]
pub(crate) struct RecordingFallback {
    allocs: AtomicUsize,
    frees: AtomicUsize,
    live: Mutex<HashMap<usize, usize>>,
    freed_zeroed: Mutex<Vec<bool>>,
}

impl RecordingFallback {
    pub(crate) fn allocs(&self) -> usize {
        self.allocs.load(Ordering::SeqCst)
    }

    pub(crate) fn frees(&self) -> usize {
        self.frees.load(Ordering::SeqCst)
    }

    pub(crate) fn freed_zeroed(&self) -> Vec<bool> {
        self.freed_zeroed.lock().expect("Failed to lock()").clone()
    }
}

impl Fallback for RecordingFallback {
    fn alloc(&self, len: usize) -> Option<NonNull<u8>> {
        let ptr = LibcFallback.alloc(len)?;

        self.allocs.fetch_add(1, Ordering::SeqCst);
        self.live
            .lock()
            .expect("Failed to lock()")
            .insert(ptr.as_ptr() as usize, len);

        Some(ptr)
    }

    unsafe fn free(&self, ptr: NonNull<u8>) {
        let len = self
            .live
            .lock()
            .expect("Failed to lock()")
            .remove(&(ptr.as_ptr() as usize))
            .expect("Freed a pointer this fallback never returned");
        let zeroed = unsafe { strongbox_test_utils::is_zeroized(ptr.as_ptr(), len) };

        self.frees.fetch_add(1, Ordering::SeqCst);
        self.freed_zeroed
            .lock()
            .expect("Failed to lock()")
            .push(zeroed);

        unsafe { LibcFallback.free(ptr) };
    }
}

/// Never has memory to give.
#[derive(Debug, Default)]
pub(crate) struct EmptyFallback;

impl Fallback for EmptyFallback {
    fn alloc(&self, _len: usize) -> Option<NonNull<u8>> {
        None
    }

    unsafe fn free(&self, _ptr: NonNull<u8>) {
        panic!("EmptyFallback never allocates");
    }
}

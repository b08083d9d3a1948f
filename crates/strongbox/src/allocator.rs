// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! SecureAllocator - locking, accounting and cleansing over a secure arena.
//!
//! One mutex serializes every arena operation together with the `used`
//! counter. Pointers that do not belong to the arena, and every request made
//! while no arena exists, go to the [`Fallback`] allocator instead, so callers
//! never branch on whether the secure path is active.

use core::ptr::NonNull;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};
use zeroize::Zeroize;

use strongbox_arena::{Arena, ArenaConfig, Corruption, PageOps, Protection, SystemPages, fatal};

use crate::error::Error;
use crate::fallback::{Fallback, LibcFallback};

#[derive(Debug)]
struct State {
    arena: Option<Arena>,
    /// Sum of the actual block sizes of live allocations.
    used: usize,
}

/// Secure allocator handle.
///
/// States: uninitialized (everything goes to the fallback) and ready (after a
/// successful [`init`](Self::init), until [`done`](Self::done)).
#[derive(Debug)]
pub struct SecureAllocator<F: Fallback = LibcFallback> {
    state: Mutex<State>,
    fallback: F,
}

impl<F: Fallback> SecureAllocator<F> {
    /// Creates an uninitialized allocator.
    pub const fn new(fallback: F) -> Self {
        Self {
            state: Mutex::new(State {
                arena: None,
                used: 0,
            }),
            fallback,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Nothing panics while holding the lock; bookkeeping is re-validated
        // on every arena call regardless.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates the arena. A no-op returning the current protection level if
    /// the allocator is already initialized.
    pub fn init(&self, config: ArenaConfig) -> Result<Protection, Error> {
        self.init_with(config, &SystemPages)
    }

    /// Like [`init`](Self::init) with explicit OS page primitives.
    pub fn init_with(
        &self,
        config: ArenaConfig,
        pages: &'static dyn PageOps,
    ) -> Result<Protection, Error> {
        let mut state = self.lock();

        if let Some(arena) = state.arena.as_ref() {
            return Ok(arena.protection());
        }

        let arena = Arena::with_pages(config, pages).inspect_err(|e| {
            warn!(error = %e, size = config.size, "secure allocator init failed");
        })?;
        let protection = arena.protection();

        state.arena = Some(arena);
        state.used = 0;

        match protection {
            Protection::Full => info!(size = config.size, "secure allocator ready"),
            Protection::Degraded(hardening) => info!(
                size = config.size,
                ?hardening,
                "secure allocator ready with degraded protection"
            ),
        }

        Ok(protection)
    }

    /// Whether an arena currently exists.
    pub fn initialized(&self) -> bool {
        self.lock().arena.is_some()
    }

    /// Allocates `len` bytes, from the arena when initialized.
    ///
    /// Arena exhaustion is returned, not papered over by the fallback.
    pub fn alloc(&self, len: usize) -> Result<NonNull<u8>, Error> {
        let mut guard = self.lock();
        let state = &mut *guard;

        if let Some(arena) = state.arena.as_mut() {
            let ptr = arena.malloc(len).inspect_err(|e| {
                debug!(error = %e, used = state.used, "secure allocation refused");
            })?;

            state.used += arena.actual_size(ptr.as_ptr());

            return Ok(ptr);
        }

        drop(guard);

        self.fallback
            .alloc(len)
            .ok_or(Error::FallbackExhausted { requested: len })
    }

    /// Allocates `len` bytes and zero-fills them.
    pub fn zalloc(&self, len: usize) -> Result<NonNull<u8>, Error> {
        let ptr = self.alloc(len)?;

        unsafe { core::ptr::write_bytes(ptr.as_ptr(), 0, len) };

        Ok(ptr)
    }

    /// Cleanses and frees `ptr`. Null is ignored.
    ///
    /// Arena blocks are zeroized over their full class size before they
    /// re-enter the free pool. Other pointers go to the fallback untouched.
    ///
    /// # Safety
    /// `ptr` must be null or come from [`alloc`](Self::alloc) /
    /// [`zalloc`](Self::zalloc) on this allocator, and must not be used again.
    pub unsafe fn free(&self, ptr: *mut u8) {
        unsafe { self.release(ptr, 0) };
    }

    /// Like [`free`](Self::free), but a pointer outside the arena has its
    /// first `len` bytes zeroized before it is handed to the fallback.
    ///
    /// # Safety
    /// As for [`free`](Self::free); additionally `len` bytes at `ptr` must be
    /// writable.
    pub unsafe fn clear_free(&self, ptr: *mut u8, len: usize) {
        unsafe { self.release(ptr, len) };
    }

    unsafe fn release(&self, ptr: *mut u8, clear_len: usize) {
        let Some(ptr) = NonNull::new(ptr) else {
            return;
        };

        let mut guard = self.lock();
        let state = &mut *guard;

        if let Some(arena) = state
            .arena
            .as_mut()
            .filter(|arena| arena.contains(ptr.as_ptr()))
        {
            let actual = arena.actual_size(ptr.as_ptr());

            unsafe { core::slice::from_raw_parts_mut(ptr.as_ptr(), actual) }.zeroize();

            state.used = state
                .used
                .checked_sub(actual)
                .unwrap_or_else(|| fatal(Corruption::AccountingUnderflow));

            unsafe { arena.free(ptr) };

            return;
        }

        drop(guard);

        if clear_len > 0 {
            unsafe { core::slice::from_raw_parts_mut(ptr.as_ptr(), clear_len) }.zeroize();
        }

        unsafe { self.fallback.free(ptr) };
    }

    /// Whether `ptr` lies inside the arena. Always false when uninitialized.
    pub fn allocated(&self, ptr: *const u8) -> bool {
        self.lock()
            .arena
            .as_ref()
            .is_some_and(|arena| arena.contains(ptr))
    }

    /// Bytes currently allocated from the arena, counted by class size.
    pub fn used(&self) -> usize {
        self.lock().used
    }

    /// Class size backing `ptr`, or `0` if `ptr` is not arena-resident.
    pub fn actual_size(&self, ptr: *const u8) -> usize {
        self.lock()
            .arena
            .as_ref()
            .map_or(0, |arena| arena.actual_size(ptr))
    }

    /// The fallback allocator.
    pub fn fallback(&self) -> &F {
        &self.fallback
    }

    /// Protection level of the current arena, if any.
    pub fn protection(&self) -> Option<Protection> {
        self.lock().arena.as_ref().map(Arena::protection)
    }

    /// Tears the arena down. Refused, with no side effects, while any secure
    /// allocation is live.
    pub fn done(&self) -> Result<(), Error> {
        let mut state = self.lock();

        if state.used != 0 {
            warn!(used = state.used, "secure allocator teardown refused");
            return Err(Error::Outstanding { used: state.used });
        }

        if let Some(arena) = state.arena.take() {
            arena.done();
        }

        Ok(())
    }
}

impl Default for SecureAllocator<LibcFallback> {
    fn default() -> Self {
        Self::new(LibcFallback)
    }
}

// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Region - the guard-bracketed mapping that holds the arena.
//!
//! Layout: `[guard page][arena, rounded up to pages][guard page]`.
//! Syscalls go through [`PageOps`] so each hardening step can fail on its own
//! in tests.

use core::ptr::{self, NonNull};

use tracing::warn;
use zeroize::Zeroize;

use crate::error::RegionError;
use crate::protection::Hardening;

/// OS memory primitives used by the arena.
pub trait PageOps: Send + Sync {
    /// System page size.
    fn page_size(&self) -> usize;

    /// Maps `len` bytes of zeroed, private, read/write memory.
    fn map(&self, len: usize) -> Result<NonNull<u8>, RegionError>;

    /// Unmaps a mapping created by [`PageOps::map`].
    ///
    /// # Safety
    /// `ptr`/`len` must describe a live mapping that nothing references.
    unsafe fn unmap(&self, ptr: NonNull<u8>, len: usize);

    /// Makes `len` bytes at `ptr` inaccessible.
    ///
    /// # Safety
    /// The range must be page-aligned, mapped, and unused.
    unsafe fn protect_none(&self, ptr: NonNull<u8>, len: usize) -> Result<(), RegionError>;

    /// Pins `len` bytes at `ptr` in RAM.
    ///
    /// # Safety
    /// The range must be mapped.
    unsafe fn lock(&self, ptr: NonNull<u8>, len: usize) -> Result<(), RegionError>;

    /// Releases a pin taken by [`PageOps::lock`]. Best effort.
    ///
    /// # Safety
    /// The range must be mapped.
    unsafe fn unlock(&self, ptr: NonNull<u8>, len: usize);

    /// Excludes `len` bytes at `ptr` from core dumps.
    ///
    /// # Safety
    /// The range must be mapped.
    unsafe fn exclude_from_dump(&self, ptr: NonNull<u8>, len: usize) -> Result<(), RegionError>;

    /// Fills `residency` with one byte per page of `len` bytes at `ptr`; bit
    /// 0 is set for pages currently in RAM.
    ///
    /// # Safety
    /// The range must be mapped and `ptr` page-aligned; `residency` must hold
    /// at least one byte per page.
    unsafe fn residency(
        &self,
        ptr: NonNull<u8>,
        len: usize,
        residency: &mut [u8],
    ) -> Result<(), RegionError>;
}

/// [`PageOps`] backed by libc.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPages;

/// Fallback when `sysconf` cannot report a page size.
const DEFAULT_PAGE_SIZE: usize = 4096;

impl SystemPages {
    fn map_dev_zero(len: usize) -> *mut libc::c_void {
        let fd = unsafe { libc::open(c"/dev/zero".as_ptr(), libc::O_RDWR) };

        if fd < 0 {
            return libc::MAP_FAILED;
        }

        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE,
                fd,
                0,
            )
        };

        unsafe { libc::close(fd) };

        ptr
    }
}

impl PageOps for SystemPages {
    fn page_size(&self) -> usize {
        match unsafe { libc::sysconf(libc::_SC_PAGESIZE) } {
            n if n >= 1 => n as usize,
            _ => DEFAULT_PAGE_SIZE,
        }
    }

    fn map(&self, len: usize) -> Result<NonNull<u8>, RegionError> {
        let mut ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };

        if ptr == libc::MAP_FAILED {
            ptr = Self::map_dev_zero(len);
        }

        if ptr == libc::MAP_FAILED {
            return Err(RegionError::Map);
        }

        NonNull::new(ptr as *mut u8).ok_or(RegionError::Map)
    }

    unsafe fn unmap(&self, ptr: NonNull<u8>, len: usize) {
        unsafe { libc::munmap(ptr.as_ptr() as *mut libc::c_void, len) };
    }

    unsafe fn protect_none(&self, ptr: NonNull<u8>, len: usize) -> Result<(), RegionError> {
        let failed =
            unsafe { libc::mprotect(ptr.as_ptr() as *mut libc::c_void, len, libc::PROT_NONE) }
                != 0;

        if failed {
            return Err(RegionError::Protect);
        }

        Ok(())
    }

    #[cfg(target_os = "linux")]
    unsafe fn lock(&self, ptr: NonNull<u8>, len: usize) -> Result<(), RegionError> {
        // Lock pages as they are faulted in rather than populating the whole
        // arena up front. Kernels older than 4.4 lack mlock2.
        let rc = unsafe {
            libc::syscall(
                libc::SYS_mlock2,
                ptr.as_ptr() as *const libc::c_void,
                len,
                libc::MLOCK_ONFAULT,
            )
        };

        if rc == 0 {
            return Ok(());
        }

        let errno = unsafe { *libc::__errno_location() };

        if errno == libc::ENOSYS
            && unsafe { libc::mlock(ptr.as_ptr() as *const libc::c_void, len) } == 0
        {
            return Ok(());
        }

        Err(RegionError::Lock)
    }

    #[cfg(not(target_os = "linux"))]
    unsafe fn lock(&self, ptr: NonNull<u8>, len: usize) -> Result<(), RegionError> {
        let failed = unsafe { libc::mlock(ptr.as_ptr() as *const libc::c_void, len) } != 0;

        if failed {
            return Err(RegionError::Lock);
        }

        Ok(())
    }

    unsafe fn unlock(&self, ptr: NonNull<u8>, len: usize) {
        unsafe { libc::munlock(ptr.as_ptr() as *const libc::c_void, len) };
    }

    #[cfg(target_os = "linux")]
    unsafe fn exclude_from_dump(&self, ptr: NonNull<u8>, len: usize) -> Result<(), RegionError> {
        let failed = unsafe {
            libc::madvise(ptr.as_ptr() as *mut libc::c_void, len, libc::MADV_DONTDUMP)
        } != 0;

        if failed {
            return Err(RegionError::Madvise);
        }

        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    unsafe fn exclude_from_dump(&self, _ptr: NonNull<u8>, _len: usize) -> Result<(), RegionError> {
        // No dump-exclusion advisory on this platform.
        Ok(())
    }

    unsafe fn residency(
        &self,
        ptr: NonNull<u8>,
        len: usize,
        residency: &mut [u8],
    ) -> Result<(), RegionError> {
        let failed = unsafe {
            libc::mincore(
                ptr.as_ptr() as *mut libc::c_void,
                len,
                residency.as_mut_ptr() as *mut _,
            )
        } != 0;

        if failed {
            return Err(RegionError::Mincore);
        }

        Ok(())
    }
}

/// Pages queried per `mincore` call during teardown.
const RESIDENCY_WINDOW: usize = 64;

pub(crate) struct Region {
    map: NonNull<u8>,
    map_len: usize,
    page_size: usize,
    arena_len: usize,
    pinned: bool,
    pages: &'static dyn PageOps,
}

// Safety: the region exclusively owns its mapping.
unsafe impl Send for Region {}

impl Region {
    /// Maps a region with room for `arena_len` bytes between two guard pages.
    /// Does NOT apply any hardening.
    pub fn map(arena_len: usize, pages: &'static dyn PageOps) -> Result<Self, RegionError> {
        let page_size = pages.page_size();
        let map_len = page_size + round_up(arena_len, page_size) + page_size;
        let map = pages.map(map_len)?;

        Ok(Self {
            map,
            map_len,
            page_size,
            arena_len,
            pinned: false,
            pages,
        })
    }

    /// First arena byte, right after the leading guard page.
    pub fn arena(&self) -> NonNull<u8> {
        unsafe { self.map.add(self.page_size) }
    }

    /// Applies guard pages, pinning and dump exclusion. Failures are logged
    /// and reported, never fatal.
    pub fn harden(&mut self) -> Hardening {
        let trailing = self.page_size + round_up(self.arena_len, self.page_size);

        let leading_guard = unsafe { self.pages.protect_none(self.map, self.page_size) };
        let trailing_guard =
            unsafe { self.pages.protect_none(self.map.add(trailing), self.page_size) };
        let locked = unsafe { self.pages.lock(self.arena(), self.arena_len) };
        let dump_excluded = unsafe { self.pages.exclude_from_dump(self.arena(), self.arena_len) };

        for result in [&leading_guard, &trailing_guard, &locked, &dump_excluded] {
            if let Err(e) = result {
                warn!(error = %e, "secure arena hardening step failed");
            }
        }

        self.pinned = locked.is_ok();

        Hardening {
            guard_pages: leading_guard.is_ok() && trailing_guard.is_ok(),
            locked: locked.is_ok(),
            dump_excluded: dump_excluded.is_ok(),
        }
    }

    /// Zeroizes the arena and returns the number of bytes written.
    ///
    /// With `pinned`, pages that are not resident have never been faulted
    /// in and are skipped, so teardown does not commit an arena that was
    /// only partly used. Without it, or if residency cannot be queried,
    /// every byte is written.
    pub fn wipe(&mut self, pinned: bool) -> usize {
        let arena = self.arena();

        if !pinned {
            unsafe { core::slice::from_raw_parts_mut(arena.as_ptr(), self.arena_len) }.zeroize();
            return self.arena_len;
        }

        let mut residency = [0u8; RESIDENCY_WINDOW];
        let mut wiped = 0;
        let mut offset = 0;

        while offset < self.arena_len {
            let len = (self.arena_len - offset).min(RESIDENCY_WINDOW * self.page_size);
            let window = unsafe { arena.add(offset) };
            let page_count = len.div_ceil(self.page_size);
            let queried = unsafe {
                self.pages
                    .residency(window, len, &mut residency[..page_count])
            }
            .is_ok();

            for (page, state) in residency[..page_count].iter().enumerate() {
                if queried && state & 1 == 0 {
                    continue;
                }

                let start = page * self.page_size;
                let bytes = self.page_size.min(len - start);

                unsafe { core::slice::from_raw_parts_mut(window.as_ptr().add(start), bytes) }
                    .zeroize();
                wiped += bytes;
            }

            offset += len;
        }

        wiped
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        let arena = self.arena();

        self.wipe(self.pinned);

        unsafe {
            self.pages.unlock(arena, self.arena_len);
            self.pages.unmap(self.map, self.map_len);
        }
    }
}

impl core::fmt::Debug for Region {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Region")
            .field("map_len", &self.map_len)
            .field("page_size", &self.page_size)
            .field("arena_len", &self.arena_len)
            .field("pinned", &self.pinned)
            .finish_non_exhaustive()
    }
}

#[inline(always)]
pub(crate) fn round_up(len: usize, page_size: usize) -> usize {
    (len + page_size - 1) & !(page_size - 1)
}

// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Failure-injecting page primitives.

use core::ptr::NonNull;

use crate::error::RegionError;
use crate::region::{PageOps, SystemPages};

/// [`PageOps`] that delegates to [`SystemPages`] but fails selected steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultyPages {
    /// Fail the initial mapping.
    pub fail_map: bool,
    /// Fail guard page protection.
    pub fail_protect: bool,
    /// Fail pinning.
    pub fail_lock: bool,
    /// Fail dump exclusion.
    pub fail_madvise: bool,
    /// Fail page residency queries.
    pub fail_residency: bool,
}

impl FaultyPages {
    /// Fails nothing.
    pub const NONE: Self = Self {
        fail_map: false,
        fail_protect: false,
        fail_lock: false,
        fail_madvise: false,
        fail_residency: false,
    };

    /// Fails the mapping.
    pub const MAP: Self = Self {
        fail_map: true,
        ..Self::NONE
    };

    /// Fails guard page protection.
    pub const PROTECT: Self = Self {
        fail_protect: true,
        ..Self::NONE
    };

    /// Fails pinning.
    pub const LOCK: Self = Self {
        fail_lock: true,
        ..Self::NONE
    };

    /// Fails dump exclusion.
    pub const MADVISE: Self = Self {
        fail_madvise: true,
        ..Self::NONE
    };

    /// Fails every best-effort step but not the mapping.
    pub const ALL_HARDENING: Self = Self {
        fail_map: false,
        fail_protect: true,
        fail_lock: true,
        fail_madvise: true,
        fail_residency: false,
    };

    /// Fails page residency queries.
    pub const RESIDENCY: Self = Self {
        fail_residency: true,
        ..Self::NONE
    };
}

impl PageOps for FaultyPages {
    fn page_size(&self) -> usize {
        SystemPages.page_size()
    }

    fn map(&self, len: usize) -> Result<NonNull<u8>, RegionError> {
        if self.fail_map {
            return Err(RegionError::Map);
        }

        SystemPages.map(len)
    }

    unsafe fn unmap(&self, ptr: NonNull<u8>, len: usize) {
        unsafe { SystemPages.unmap(ptr, len) }
    }

    unsafe fn protect_none(&self, ptr: NonNull<u8>, len: usize) -> Result<(), RegionError> {
        if self.fail_protect {
            return Err(RegionError::Protect);
        }

        unsafe { SystemPages.protect_none(ptr, len) }
    }

    unsafe fn lock(&self, ptr: NonNull<u8>, len: usize) -> Result<(), RegionError> {
        if self.fail_lock {
            return Err(RegionError::Lock);
        }

        unsafe { SystemPages.lock(ptr, len) }
    }

    unsafe fn unlock(&self, ptr: NonNull<u8>, len: usize) {
        unsafe { SystemPages.unlock(ptr, len) }
    }

    unsafe fn exclude_from_dump(&self, ptr: NonNull<u8>, len: usize) -> Result<(), RegionError> {
        if self.fail_madvise {
            return Err(RegionError::Madvise);
        }

        unsafe { SystemPages.exclude_from_dump(ptr, len) }
    }

    unsafe fn residency(
        &self,
        ptr: NonNull<u8>,
        len: usize,
        residency: &mut [u8],
    ) -> Result<(), RegionError> {
        if self.fail_residency {
            return Err(RegionError::Mincore);
        }

        unsafe { SystemPages.residency(ptr, len, residency) }
    }
}

// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Intrusive doubly-threaded free lists.
//!
//! Each free block stores a [`FreeNode`] in its first bytes: the next block
//! in its size class and the address of the slot that points at it (either a
//! list head or the `next` field of the previous node). That back pointer
//! makes unlinking from the middle of a list O(1).
//!
//! List heads live on the ordinary heap and are only ever reached through
//! raw pointers, because nodes inside the arena hold pointers into them.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::ptr::{self, NonNull};

use crate::error::ArenaError;

#[repr(C)]
pub(crate) struct FreeNode {
    next: *mut FreeNode,
    p_next: *mut *mut FreeNode,
}

/// Bytes a free block reserves for its list link.
pub const LINK_SIZE: usize = core::mem::size_of::<FreeNode>();

pub(crate) struct FreeLists {
    heads: NonNull<*mut FreeNode>,
    len: usize,
}

impl FreeLists {
    /// Creates `len` empty lists.
    pub fn new(len: usize) -> Result<Self, ArenaError> {
        let mut heads: Vec<*mut FreeNode> = Vec::new();

        heads
            .try_reserve_exact(len)
            .map_err(|_| ArenaError::Bookkeeping {
                bytes: len.saturating_mul(core::mem::size_of::<*mut FreeNode>()),
            })?;
        heads.resize(len, ptr::null_mut());

        let heads = Box::into_raw(heads.into_boxed_slice()) as *mut *mut FreeNode;

        Ok(Self {
            // Box never hands out null, even for empty slices.
            heads: unsafe { NonNull::new_unchecked(heads) },
            len,
        })
    }

    /// Number of size classes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Address of the head slot of `list`.
    #[inline(always)]
    pub fn slot(&self, list: usize) -> *mut *mut FreeNode {
        assert!(list < self.len);
        unsafe { self.heads.as_ptr().add(list) }
    }

    /// Whether `p` points at one of the head slots.
    pub fn is_slot(&self, p: *mut *mut FreeNode) -> bool {
        let start = self.heads.as_ptr() as usize;
        let end = start + self.len * core::mem::size_of::<*mut FreeNode>();

        (start..end).contains(&(p as usize))
    }

    /// First node of `list`, or null.
    #[inline(always)]
    pub fn head(&self, list: usize) -> *mut FreeNode {
        unsafe { *self.slot(list) }
    }

    /// Pushes `node` at the head of `list`.
    ///
    /// # Safety
    /// `node` must point to at least [`LINK_SIZE`] writable, suitably aligned
    /// bytes that are not currently linked into any list.
    pub unsafe fn push(&mut self, list: usize, node: *mut FreeNode) {
        let slot = self.slot(list);

        unsafe {
            let next = *slot;

            (*node).next = next;
            (*node).p_next = slot;

            if !next.is_null() {
                (*next).p_next = ptr::addr_of_mut!((*node).next);
            }

            *slot = node;
        }
    }

    /// Removes `node` from whichever list holds it and clears its link words.
    ///
    /// # Safety
    /// `node` must currently be linked into one of these lists.
    pub unsafe fn unlink(node: *mut FreeNode) {
        unsafe {
            let next = (*node).next;

            if !next.is_null() {
                (*next).p_next = (*node).p_next;
            }

            *(*node).p_next = next;

            (*node).next = ptr::null_mut();
            (*node).p_next = ptr::null_mut();
        }
    }

    /// Link words of `node`, for consistency checks.
    ///
    /// # Safety
    /// `node` must point to a linked [`FreeNode`].
    pub unsafe fn links(node: *mut FreeNode) -> (*mut FreeNode, *mut *mut FreeNode) {
        unsafe { ((*node).next, (*node).p_next) }
    }
}

impl Drop for FreeLists {
    fn drop(&mut self) {
        let heads = ptr::slice_from_raw_parts_mut(self.heads.as_ptr(), self.len);

        drop(unsafe { Box::from_raw(heads) });
    }
}

impl core::fmt::Debug for FreeLists {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FreeLists")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}
